use std::sync::Arc;

use sb_domain::config::Config;
use sb_sessions::SessionAccessor;

/// Shared application state passed to all API handlers.
///
/// Handlers never reach the store directly; every read and write goes
/// through the accessor so default initialization, expiry and version
/// checks apply uniformly across adapters.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accessor: Arc<SessionAccessor>,
}
