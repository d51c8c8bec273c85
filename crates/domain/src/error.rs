/// Shared error type used across all SessionBridge crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The session backend could not be reached or failed an I/O operation.
    /// Callers must surface this as a service error and never fabricate a
    /// session in its place.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("session not found: {0}")]
    NotFound(String),

    /// Malformed or oversized session id supplied by a client.
    #[error("invalid session cookie: {0}")]
    InvalidCookie(String),

    /// A read-modify-write lost the race too many times.
    #[error("session write conflict: {0}")]
    Conflict(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means the backend itself is unhealthy.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
