//! Adapter for the framework-based service.
//!
//! - `GET  /me`              : current session, plus the received cookies
//! - `GET  /update-session`  : overwrite the user with the fixed demo user
//! - `POST /update-session`  : merge a JSON object into the session

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Map, Value};

use super::{respond, user, AdapterContext, ServiceAdapter};
use crate::api::error::{api_error, ApiError};
use crate::state::AppState;

pub struct FrameworkAdapter;

impl ServiceAdapter for FrameworkAdapter {
    fn name(&self) -> &'static str {
        "framework"
    }

    fn render(&self, ctx: &AdapterContext<'_>) -> Value {
        json!({
            "cookies": ctx.cookies,
            "session_id": ctx.record.id,
            "user": user(ctx.record),
        })
    }
}

/// The user written by `GET /update-session`.
fn changed_user() -> Map<String, Value> {
    let mut user = Map::new();
    user.insert("id".into(), Value::from(666));
    user.insert("name".into(), Value::from("CHANGED BY SF"));
    user
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /me
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn me(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    respond(&FrameworkAdapter, &state, jar, None).await
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET|POST /update-session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn change_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    respond(&FrameworkAdapter, &state, jar, Some(changed_user())).await
}

/// Body must be a JSON object; anything else is refused before the session
/// is touched.
pub async fn update_session(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(partial) = match body {
        Ok(body) => body,
        Err(rejection) => return Ok(api_error(rejection.status(), rejection.body_text())),
    };
    Ok(respond(&FrameworkAdapter, &state, jar, Some(partial))
        .await?
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sb_sessions::{SessionId, SessionRecord};

    #[test]
    fn renders_cookie_echo_and_user() {
        let id = SessionId::parse("s1", 128).unwrap();
        let record = SessionRecord::new(id, changed_user(), Utc::now());
        let mut cookies = Map::new();
        cookies.insert("SESSIONID".into(), Value::from("s1"));

        let body = FrameworkAdapter.render(&AdapterContext {
            record: &record,
            cookies: &cookies,
        });
        assert_eq!(
            body,
            json!({
                "cookies": {"SESSIONID": "s1"},
                "session_id": "s1",
                "user": {"id": 666, "name": "CHANGED BY SF"},
            })
        );
    }
}
