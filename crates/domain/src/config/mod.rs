mod observability;
mod server;
mod sessions;
mod store;

pub use observability::*;
pub use server::*;
pub use sessions::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// RFC 6265 cookie-name token: visible ASCII minus separators.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }

        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }

        if self.server.adapters.is_empty() {
            errors.push(ConfigError::error(
                "server.adapters",
                "at least one service adapter must be mounted",
            ));
        }
        for (i, name) in self.server.adapters.iter().enumerate() {
            if !KNOWN_ADAPTERS.contains(&name.as_str()) {
                errors.push(ConfigError::error(
                    format!("server.adapters[{i}]"),
                    format!(
                        "unknown adapter {name:?} (expected one of {})",
                        KNOWN_ADAPTERS.join(", ")
                    ),
                ));
            } else if self.server.adapters[..i].contains(name) {
                errors.push(ConfigError::error(
                    format!("server.adapters[{i}]"),
                    format!("adapter {name:?} is listed more than once"),
                ));
            }
        }

        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }

        if !is_cookie_token(&self.sessions.cookie_name) {
            errors.push(ConfigError::error(
                "sessions.cookie_name",
                "cookie name must be a non-empty RFC 6265 token",
            ));
        }

        if self.sessions.ttl_secs == 0 {
            errors.push(ConfigError::error(
                "sessions.ttl_secs",
                "ttl must be greater than 0",
            ));
        }

        if self.sessions.max_id_len < GENERATED_ID_LEN {
            errors.push(ConfigError::error(
                "sessions.max_id_len",
                format!("must be at least {GENERATED_ID_LEN} so generated ids are accepted back"),
            ));
        }

        if self.sessions.max_cas_retries == 0 {
            errors.push(ConfigError::error(
                "sessions.max_cas_retries",
                "must be greater than 0",
            ));
        }

        if self.sessions.default_attributes.is_empty() {
            errors.push(ConfigError::warning(
                "sessions.default_attributes",
                "new sessions will start with no attributes",
            ));
        }

        match self.store.backend {
            StoreBackend::File if self.store.path.as_os_str().is_empty() => {
                errors.push(ConfigError::error(
                    "store.path",
                    "file backend requires a directory path",
                ));
            }
            StoreBackend::Memory => {
                errors.push(ConfigError::warning(
                    "store.backend",
                    "memory backend cannot be shared with other processes",
                ));
            }
            StoreBackend::File if self.sessions.max_id_len > MAX_FILE_ID_LEN => {
                errors.push(ConfigError::error(
                    "sessions.max_id_len",
                    format!(
                        "file backend stores ids as file names; must be at most {MAX_FILE_ID_LEN}"
                    ),
                ));
            }
            StoreBackend::File => {}
        }

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }
}
