use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::SessionId;

/// A single session shared by every service that uses the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    /// Free-form session data (`id`, `name`, ...).  Any service may
    /// overwrite any key; the last write wins.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    /// Bumped by the store on every successful write.  `0` means the record
    /// has never been stored.
    #[serde(default)]
    pub version: u64,
}

impl SessionRecord {
    /// Build an unsaved record with the given initial attributes.
    pub fn new(id: SessionId, attributes: Map<String, Value>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            attributes,
            created_at: now,
            last_accessed_at: now,
            version: 0,
        }
    }

    /// Shallow-merge `partial` into the attributes (top-level keys replace).
    pub fn merge(&mut self, partial: &Map<String, Value>) {
        for (key, value) in partial {
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
    }
}
