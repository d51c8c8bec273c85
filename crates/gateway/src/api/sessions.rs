//! Session diagnostics endpoints.
//!
//! Read-only inspection and explicit deletion, going through the accessor
//! like every adapter does.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use sb_domain::error::Error;
use sb_sessions::SessionId;

use super::error::{api_error, blocking, ApiError};
use crate::state::AppState;

fn parse_id(state: &AppState, raw: &str) -> Option<SessionId> {
    SessionId::parse(raw, state.accessor.policy().max_id_len).ok()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Return the stored record without refreshing its access time.
pub async fn get_session(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&state, &raw) else {
        return Ok(api_error(StatusCode::NOT_FOUND, "session not found"));
    };

    let accessor = state.accessor.clone();
    let record = blocking(move || accessor.get(&id)).await?;

    Ok(match record {
        Some(record) => Json(record).into_response(),
        None => api_error(StatusCode::NOT_FOUND, "session not found"),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DELETE /v1/sessions/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn delete_session(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&state, &raw) else {
        return Ok(api_error(StatusCode::NOT_FOUND, "session not found"));
    };

    let accessor = state.accessor.clone();
    match blocking(move || accessor.destroy(&id)).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(ApiError(Error::NotFound(_))) => {
            Ok(api_error(StatusCode::NOT_FOUND, "session not found"))
        }
        Err(e) => Err(e),
    }
}
