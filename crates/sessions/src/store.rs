//! Session store contract and the in-process backend.
//!
//! Every backend must give read-after-write consistency: once `put` or a
//! successful `compare_and_swap` returns, every later `get` (from any
//! service sharing the backend) observes the write.  Backend failures are
//! reported as [`Error::StoreUnavailable`] and never papered over.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use sb_domain::error::{Error, Result};

use crate::id::SessionId;
use crate::record::SessionRecord;

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// Written; carries the version now stored.
    Stored(u64),
    /// The stored version did not match the expected one.  Nothing written.
    Conflict,
}

/// Key-value persistence for session records.
///
/// The store owns `version`: whatever the caller puts in
/// [`SessionRecord::version`] is ignored and replaced with
/// `previous version + 1` (or `1` for a new record).
pub trait SessionStore: Send + Sync {
    /// Short backend name for diagnostics (`"memory"`, `"file"`).
    fn backend(&self) -> &'static str;

    /// Fetch a record.  Fails with [`Error::NotFound`] when absent.
    fn get(&self, id: &SessionId) -> Result<SessionRecord>;

    /// Unconditionally write a record (last write wins).
    fn put(&self, record: &SessionRecord) -> Result<()>;

    /// Remove a record.  Fails with [`Error::NotFound`] when absent.
    fn delete(&self, id: &SessionId) -> Result<()>;

    /// Write `record` only if the stored version equals `expected`
    /// (`None` = the id must not exist yet).  This is the per-id
    /// serialization point for read-modify-write sequences.
    fn compare_and_swap(
        &self,
        record: &SessionRecord,
        expected: Option<u64>,
    ) -> Result<CasOutcome>;

    /// Remove every record last accessed before `cutoff`.  Returns how many
    /// were removed.
    fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Number of stored records.
    fn len(&self) -> Result<usize>;

    /// Longest id the backend can hold, when it has a limit.
    fn max_id_len(&self) -> Option<usize> {
        None
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-local store.  Shared by every adapter mounted in the same
/// process; gone when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn get(&self, id: &SessionId) -> Result<SessionRecord> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn put(&self, record: &SessionRecord) -> Result<()> {
        let mut sessions = self.sessions.write();
        let next = sessions.get(&record.id).map_or(0, |r| r.version) + 1;
        let mut stored = record.clone();
        stored.version = next;
        sessions.insert(stored.id.clone(), stored);
        Ok(())
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        self.sessions
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn compare_and_swap(
        &self,
        record: &SessionRecord,
        expected: Option<u64>,
    ) -> Result<CasOutcome> {
        let mut sessions = self.sessions.write();
        let current = sessions.get(&record.id).map(|r| r.version);
        if current != expected {
            return Ok(CasOutcome::Conflict);
        }
        let next = expected.unwrap_or(0) + 1;
        let mut stored = record.clone();
        stored.version = next;
        sessions.insert(stored.id.clone(), stored);
        Ok(CasOutcome::Stored(next))
    }

    fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, r| r.last_accessed_at >= cutoff);
        Ok(before - sessions.len())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.sessions.read().len())
    }
}
