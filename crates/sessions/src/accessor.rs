//! The only way services touch sessions.
//!
//! [`SessionAccessor::resolve`] turns a raw cookie value into a live
//! [`SessionRecord`], creating one with the default attributes when the id
//! is absent, unknown, malformed or expired.  Every write is a
//! compare-and-swap on the record version, so two services mutating the
//! same session concurrently never lose an update.
//!
//! A well-formed id that the store has never seen is adopted as-is: the
//! session is created under exactly that id.  This mirrors how legacy
//! session handlers behave and is what lets an independently deployed
//! service pick up a cookie minted elsewhere.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use sb_domain::config::SessionsConfig;
use sb_domain::error::{Error, Result};
use sb_domain::trace::TraceEvent;

use crate::id::{CookieId, SessionId};
use crate::lifecycle::Lifecycle;
use crate::record::SessionRecord;
use crate::store::{CasOutcome, SessionStore};

/// Session behaviour every service sharing a store must agree on.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub lifecycle: Lifecycle,
    pub default_attributes: Map<String, Value>,
    pub max_id_len: usize,
    pub max_cas_retries: u32,
}

impl From<&SessionsConfig> for SessionPolicy {
    fn from(cfg: &SessionsConfig) -> Self {
        Self {
            lifecycle: Lifecycle::from_secs(cfg.ttl_secs),
            default_attributes: cfg.default_attributes.clone(),
            max_id_len: cfg.max_id_len,
            max_cas_retries: cfg.max_cas_retries,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from(&SessionsConfig::default())
    }
}

/// A session ready for use by a handler.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub record: SessionRecord,
    /// `true` when this call created (or re-created after expiry) the record.
    pub is_new: bool,
}

impl Resolved {
    pub fn id(&self) -> &SessionId {
        &self.record.id
    }
}

/// What the store held for an id at the start of an attempt.
enum Loaded {
    Live(SessionRecord),
    Expired(SessionRecord),
    Missing,
}

pub struct SessionAccessor {
    store: Arc<dyn SessionStore>,
    policy: SessionPolicy,
}

impl SessionAccessor {
    /// Ids longer than the backend can hold are treated as invalid cookies,
    /// so `policy.max_id_len` is clamped to the store's limit.
    pub fn new(store: Arc<dyn SessionStore>, mut policy: SessionPolicy) -> Self {
        if let Some(limit) = store.max_id_len() {
            if policy.max_id_len > limit {
                tracing::warn!(
                    configured = policy.max_id_len,
                    limit,
                    backend = store.backend(),
                    "max_id_len exceeds what the store can hold, clamping"
                );
                policy.max_id_len = limit;
            }
        }
        Self { store, policy }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Resolve the session named by a raw cookie value.
    ///
    /// Absent, empty and malformed values all get a freshly generated id.
    /// Store failures propagate; no in-memory-only session is ever returned.
    pub fn resolve(&self, cookie: Option<&str>) -> Result<Resolved> {
        let (id, client_supplied) = match CookieId::from_cookie(cookie, self.policy.max_id_len) {
            CookieId::Valid(id) => (id, true),
            CookieId::Absent => (SessionId::generate(), false),
            CookieId::Invalid(reason) => {
                TraceEvent::InvalidCookie { reason }.emit();
                (SessionId::generate(), false)
            }
        };
        self.resolve_id(&id, client_supplied)
    }

    /// Load or initialize the session `id` and refresh its access time.
    pub fn resolve_id(&self, id: &SessionId, client_supplied: bool) -> Result<Resolved> {
        for _ in 0..self.policy.max_cas_retries {
            let now = Utc::now();
            let (mut record, expected, is_new) = match self.load(id, now)? {
                Loaded::Live(mut record) => {
                    let expected = record.version;
                    record.touch(now);
                    (record, Some(expected), false)
                }
                Loaded::Expired(old) => (self.fresh(id, now), Some(old.version), true),
                Loaded::Missing => (self.fresh(id, now), None, true),
            };

            if let CasOutcome::Stored(version) = self.store.compare_and_swap(&record, expected)? {
                record.version = version;
                if is_new {
                    TraceEvent::SessionCreated {
                        session_id: id.to_string(),
                        client_supplied,
                    }
                    .emit();
                }
                TraceEvent::SessionResolved {
                    session_id: id.to_string(),
                    is_new,
                }
                .emit();
                return Ok(Resolved { record, is_new });
            }
        }

        Err(Error::Conflict(format!(
            "resolving {id} lost {} races",
            self.policy.max_cas_retries
        )))
    }

    /// Merge `partial` into the session's attributes and persist.
    ///
    /// A missing or expired session is default-initialized first, so the
    /// merge always lands on a live record.
    pub fn set_attributes(
        &self,
        id: &SessionId,
        partial: &Map<String, Value>,
    ) -> Result<SessionRecord> {
        for attempt in 0..self.policy.max_cas_retries {
            let now = Utc::now();
            let (mut record, expected) = match self.load(id, now)? {
                Loaded::Live(record) => {
                    let expected = record.version;
                    (record, Some(expected))
                }
                Loaded::Expired(old) => (self.fresh(id, now), Some(old.version)),
                Loaded::Missing => (self.fresh(id, now), None),
            };
            record.merge(partial);
            record.touch(now);

            if let CasOutcome::Stored(version) = self.store.compare_and_swap(&record, expected)? {
                record.version = version;
                TraceEvent::SessionUpdated {
                    session_id: id.to_string(),
                    keys: partial.keys().cloned().collect(),
                    version,
                    retries: attempt,
                }
                .emit();
                return Ok(record);
            }
        }

        Err(Error::Conflict(format!(
            "updating {id} lost {} races",
            self.policy.max_cas_retries
        )))
    }

    /// Read a session without touching it.  Expired sessions read as absent.
    pub fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        match self.load(id, Utc::now())? {
            Loaded::Live(record) => Ok(Some(record)),
            Loaded::Expired(_) | Loaded::Missing => Ok(None),
        }
    }

    /// Explicitly destroy a session.
    pub fn destroy(&self, id: &SessionId) -> Result<()> {
        self.store.delete(id)?;
        TraceEvent::SessionDeleted {
            session_id: id.to_string(),
        }
        .emit();
        Ok(())
    }

    /// Delete every expired session.  Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let cutoff = self.policy.lifecycle.cutoff(Utc::now());
        let removed = self.store.purge_expired(cutoff)?;
        if removed > 0 {
            TraceEvent::SessionsPurged { removed }.emit();
        }
        Ok(removed)
    }

    fn load(&self, id: &SessionId, now: DateTime<Utc>) -> Result<Loaded> {
        match self.store.get(id) {
            Ok(record) if self.policy.lifecycle.is_expired(&record, now) => {
                TraceEvent::SessionExpired {
                    session_id: id.to_string(),
                    idle_secs: self.policy.lifecycle.idle_secs(&record, now),
                }
                .emit();
                Ok(Loaded::Expired(record))
            }
            Ok(record) => Ok(Loaded::Live(record)),
            Err(Error::NotFound(_)) => Ok(Loaded::Missing),
            Err(e) => Err(e),
        }
    }

    fn fresh(&self, id: &SessionId, now: DateTime<Utc>) -> SessionRecord {
        SessionRecord::new(id.clone(), self.policy.default_attributes.clone(), now)
    }
}
