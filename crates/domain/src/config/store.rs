use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where session records live.
///
/// Every service that should share sessions must point at the same
/// backend.  The `file` backend is the shared one: any number of processes
/// may use the same `path` concurrently.  The `memory` backend only lives
/// as long as the process and is meant for tests and single-process setups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory holding one JSON file per session (file backend only).
    #[serde(default = "d_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: d_store_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
}

/// Longest session id the file backend accepts.  Ids become file names
/// (`<id>.json`, `.<id>.<16 hex>.tmp`), which must fit the common 255-byte
/// name limit.
pub const MAX_FILE_ID_LEN: usize = 200;

fn d_store_path() -> PathBuf {
    PathBuf::from("./data/sessions")
}
