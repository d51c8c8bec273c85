//! Session expiry by idle time-to-live.
//!
//! Expiry is evaluated on every access.  A session whose last access is at
//! least `ttl` ago is treated as gone: the accessor replaces it with a
//! freshly initialized record under the same id.  The background sweeper
//! uses [`Lifecycle::cutoff`] to delete the ones nobody comes back for.

use chrono::{DateTime, Duration, Utc};

use crate::record::SessionRecord;

#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    ttl: Duration,
}

impl Lifecycle {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn from_secs(ttl_secs: u64) -> Self {
        let secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self::new(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Seconds since the record was last accessed.
    pub fn idle_secs(&self, record: &SessionRecord, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(record.last_accessed_at).num_seconds()
    }

    pub fn is_expired(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.last_accessed_at) >= self.ttl
    }

    /// Records last accessed before this instant are expired.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
