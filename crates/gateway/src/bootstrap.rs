//! AppState construction and background-task spawning, shared by the
//! `serve` and `purge` commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use sb_domain::config::{Config, ConfigSeverity, StoreBackend, StoreConfig};
use sb_sessions::{FileStore, MemoryStore, SessionAccessor, SessionPolicy, SessionStore};

use crate::state::AppState;

/// Open the configured session backend.
pub fn open_store(cfg: &StoreConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(
            FileStore::open(&cfg.path)
                .with_context(|| format!("opening session store at {}", cfg.path.display()))?,
        ),
    };
    tracing::info!(backend = store.backend(), "session store ready");
    Ok(store)
}

/// Validate config, open the store and return a fully-wired [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Session store + accessor ─────────────────────────────────────
    let store = open_store(&config.store)?;
    let policy = SessionPolicy::from(&config.sessions);
    tracing::info!(
        cookie = %config.sessions.cookie_name,
        ttl_secs = config.sessions.ttl_secs,
        default_keys = policy.default_attributes.len(),
        "session accessor ready"
    );
    let accessor = Arc::new(SessionAccessor::new(store, policy));

    Ok(AppState { config, accessor })
}

/// Spawn the periodic expired-session sweeper (unless disabled).
pub fn spawn_background_tasks(state: &AppState) {
    let every = state.config.sessions.sweep_interval_secs;
    if every == 0 {
        tracing::info!("session sweeper disabled (sweep_interval_secs = 0)");
        return;
    }

    let accessor = state.accessor.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(every));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let acc = accessor.clone();
            match tokio::task::spawn_blocking(move || acc.purge_expired()).await {
                Ok(Ok(removed)) if removed > 0 => {
                    tracing::debug!(removed, "expired sessions purged");
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "session sweep failed"),
                Err(e) => tracing::warn!(error = %e, "session sweep task panicked"),
            }
        }
    });
    tracing::info!(interval_secs = every, "session sweeper started");
}
