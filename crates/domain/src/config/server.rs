use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_3210")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    /// Service adapters mounted by this process (`"legacy"`, `"framework"`).
    /// Run two processes with one adapter each against the same file store
    /// to reproduce a split legacy/framework deployment.
    #[serde(default = "d_adapters")]
    pub adapters: Vec<String>,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Maximum number of in-flight requests before the server applies
    /// backpressure.
    #[serde(default = "d_256")]
    pub max_concurrent_requests: usize,
    /// Optional path for a PID file.  When set, the server writes its PID on
    /// startup and removes the file on shutdown.  An `fs2` exclusive lock
    /// prevents multiple instances from running with the same PID file.
    #[serde(default)]
    pub pid_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3210,
            host: "127.0.0.1".into(),
            adapters: d_adapters(),
            cors: CorsConfig::default(),
            max_concurrent_requests: 256,
            pid_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed for CORS. Use `["*"]` for permissive (NOT recommended).
    /// Defaults to localhost-only.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

/// Adapter names understood by the gateway.
pub const KNOWN_ADAPTERS: &[&str] = &["legacy", "framework"];

// ── serde default helpers ───────────────────────────────────────────

fn d_3210() -> u16 {
    3210
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_adapters() -> Vec<String> {
    KNOWN_ADAPTERS.iter().map(|s| (*s).to_owned()).collect()
}
fn d_256() -> usize {
    256
}
fn d_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:*".into(),
        "http://127.0.0.1:*".into(),
    ]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
