use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/health
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Health probe.  Reports 503 when the session store cannot be read, since
/// no adapter can serve a request in that state.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let accessor = state.accessor.clone();
    let backend = accessor.store().backend();
    let counted = tokio::task::spawn_blocking(move || accessor.store().len()).await;

    match counted {
        Ok(Ok(sessions)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "store": backend,
                "sessions": sessions,
            })),
        ),
        Ok(Err(e)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "unavailable",
                "version": env!("CARGO_PKG_VERSION"),
                "store": backend,
                "error": e.to_string(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "status": "error",
                "error": e.to_string(),
            })),
        ),
    }
}
