//! Session identifiers.
//!
//! Generated ids carry 256 bits from the thread-local CSPRNG, hex-encoded.
//! Client-supplied ids are accepted as long as they look like something a
//! session handler could have minted: `[A-Za-z0-9,-]`, bounded length.  The
//! same charset keeps ids safe to use as file names.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use sb_domain::config::GENERATED_ID_LEN;
use sb_domain::error::{Error, Result};

/// Random bytes per generated id (hex doubles the length).
pub const GENERATED_ID_BYTES: usize = GENERATED_ID_LEN / 2;

/// Opaque, validated session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh random id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; GENERATED_ID_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Validate a client-supplied id.
    pub fn parse(raw: &str, max_len: usize) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidCookie("empty session id".into()));
        }
        if raw.len() > max_len {
            return Err(Error::InvalidCookie(format!(
                "session id is {} bytes (max {max_len})",
                raw.len()
            )));
        }
        if let Some(c) = raw.chars().find(|c| !is_id_char(*c)) {
            return Err(Error::InvalidCookie(format!(
                "session id contains {c:?}"
            )));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ',' || c == '-'
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What a raw cookie value turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieId {
    /// No cookie, or an empty value.
    Absent,
    Valid(SessionId),
    /// Malformed or oversized; handled exactly like [`CookieId::Absent`].
    Invalid(String),
}

impl CookieId {
    pub fn from_cookie(raw: Option<&str>, max_len: usize) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Absent,
            Some(value) => match SessionId::parse(value, max_len) {
                Ok(id) => Self::Valid(id),
                Err(Error::InvalidCookie(reason)) => Self::Invalid(reason),
                Err(e) => Self::Invalid(e.to_string()),
            },
        }
    }
}
