//! Adapter for the legacy front controller.
//!
//! `GET /legacy` answers `{status, session_id, user}`, starting a session
//! with the default user when the visitor has none.

use axum::extract::State;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use super::{respond, user, AdapterContext, ServiceAdapter};
use crate::api::error::ApiError;
use crate::state::AppState;

pub struct LegacyAdapter;

impl ServiceAdapter for LegacyAdapter {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn render(&self, ctx: &AdapterContext<'_>) -> Value {
        json!({
            "status": "✅ User logged in (Legacy)",
            "session_id": ctx.record.id,
            "user": user(ctx.record),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /legacy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    respond(&LegacyAdapter, &state, jar, None).await
}
