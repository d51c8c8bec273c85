use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Length of a server-generated session id (hex-encoded 32 bytes).
pub const GENERATED_ID_LEN: usize = 64;

/// Session policy shared by every service adapter.
///
/// All services that share a store must agree on these values; otherwise
/// one service would expire or initialize sessions differently from another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Name of the cookie carrying the session id.
    #[serde(default = "d_cookie_name")]
    pub cookie_name: String,

    /// Idle lifetime in seconds.  A session not accessed for this long is
    /// destroyed on its next access (and by the sweeper).
    #[serde(default = "d_1440")]
    pub ttl_secs: u64,

    /// Longest client-supplied id accepted before it is treated as invalid.
    #[serde(default = "d_128")]
    pub max_id_len: usize,

    /// Compare-and-swap attempts per mutation before giving up with a
    /// conflict error.
    #[serde(default = "d_8")]
    pub max_cas_retries: u32,

    /// How often the background sweeper purges expired sessions.
    /// `0` disables the sweeper (expiry still happens lazily on access).
    #[serde(default = "d_60")]
    pub sweep_interval_secs: u64,

    /// Attributes written into every freshly created session.
    #[serde(default = "d_default_attributes")]
    pub default_attributes: Map<String, Value>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            cookie_name: d_cookie_name(),
            ttl_secs: 1440,
            max_id_len: 128,
            max_cas_retries: 8,
            sweep_interval_secs: 60,
            default_attributes: d_default_attributes(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_cookie_name() -> String {
    "SESSIONID".into()
}
fn d_1440() -> u64 {
    1440
}
fn d_128() -> usize {
    128
}
fn d_8() -> u32 {
    8
}
fn d_60() -> u64 {
    60
}
fn d_default_attributes() -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("id".into(), Value::from(1));
    attrs.insert("name".into(), Value::from("Legacy User"));
    attrs
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
