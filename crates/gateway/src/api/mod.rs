pub mod adapters;
pub mod cookies;
pub mod error;
pub mod health;
pub mod sessions;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the full router: the service adapters enabled in
/// `server.adapters`, plus health and session diagnostics.
pub fn router(state: &AppState) -> Router<AppState> {
    let mut router = Router::new()
        .route("/v1/health", get(health::health))
        .route(
            "/v1/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        );

    for name in &state.config.server.adapters {
        router = match name.as_str() {
            "legacy" => router.route("/legacy", get(adapters::legacy::index)),
            "framework" => router
                .route("/me", get(adapters::framework::me))
                .route(
                    "/update-session",
                    get(adapters::framework::change_user)
                        .post(adapters::framework::update_session),
                ),
            other => {
                tracing::warn!(adapter = %other, "unknown adapter, not mounted");
                router
            }
        };
        tracing::info!(adapter = %name, "service adapter mounted");
    }

    router
}
