use serde::Serialize;

/// Structured trace events emitted across all SessionBridge crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionCreated {
        session_id: String,
        /// `true` when the id came from the client rather than the generator.
        client_supplied: bool,
    },
    SessionResolved {
        session_id: String,
        is_new: bool,
    },
    SessionUpdated {
        session_id: String,
        keys: Vec<String>,
        version: u64,
        retries: u32,
    },
    SessionExpired {
        session_id: String,
        idle_secs: i64,
    },
    SessionDeleted {
        session_id: String,
    },
    SessionsPurged {
        removed: usize,
    },
    InvalidCookie {
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sb_event");
    }
}
