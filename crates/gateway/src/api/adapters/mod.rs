//! Service adapters.
//!
//! An adapter is the thin per-service layer between HTTP and the session
//! accessor: it picks the session cookie out of the request, lets the
//! accessor resolve (and optionally mutate) the session, and renders the
//! result in that service's response shape.  Adapters hold no session
//! logic of their own, so any two of them pointed at the same store are
//! interchangeable.

pub mod framework;
pub mod legacy;

use axum::response::Json;
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Map, Value};

use sb_sessions::SessionRecord;

use super::cookies;
use super::error::{blocking, ApiError};
use crate::state::AppState;

/// Everything an adapter may put in its response body.
pub struct AdapterContext<'a> {
    pub record: &'a SessionRecord,
    /// Cookies as received on the request.
    pub cookies: &'a Map<String, Value>,
}

pub trait ServiceAdapter: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Response body for a resolved session.
    fn render(&self, ctx: &AdapterContext<'_>) -> Value;
}

/// Shared request flow for every adapter: resolve the cookie's session,
/// apply `mutation` if any, render, and refresh the session cookie.
pub async fn respond<A: ServiceAdapter>(
    adapter: &A,
    state: &AppState,
    jar: CookieJar,
    mutation: Option<Map<String, Value>>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let cookie_name = state.config.sessions.cookie_name.clone();
    let raw = cookies::session_cookie_value(&jar, &cookie_name);
    let received = cookies::cookie_map(&jar);

    let accessor = state.accessor.clone();
    let (record, is_new) = blocking(move || {
        let resolved = accessor.resolve(raw.as_deref())?;
        match mutation {
            Some(partial) => {
                let record = accessor.set_attributes(resolved.id(), &partial)?;
                Ok((record, resolved.is_new))
            }
            None => Ok((resolved.record, resolved.is_new)),
        }
    })
    .await?;

    tracing::debug!(
        adapter = adapter.name(),
        session_id = %record.id,
        is_new,
        "session served"
    );

    let body = adapter.render(&AdapterContext {
        record: &record,
        cookies: &received,
    });
    let ttl = state.accessor.policy().lifecycle.ttl();
    let jar = jar.add(cookies::session_cookie(&cookie_name, &record.id, ttl));

    Ok((jar, Json(body)))
}

/// The session's attributes as the `user` object both services expose.
pub(crate) fn user(record: &SessionRecord) -> Value {
    Value::Object(record.attributes.clone())
}
