//! Session cookie handling.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use serde_json::{Map, Value};

use sb_sessions::SessionId;

/// The raw session id cookie value, if the client sent one.
pub fn session_cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|c| c.value().to_owned())
}

/// Every received cookie as a JSON object (diagnostic echo).
pub fn cookie_map(jar: &CookieJar) -> Map<String, Value> {
    jar.iter()
        .map(|c| (c.name().to_owned(), Value::from(c.value())))
        .collect()
}

/// `Set-Cookie` for the resolved session.  `Max-Age` tracks the idle TTL
/// so the browser forgets the id about when the store does.
pub fn session_cookie(name: &str, id: &SessionId, ttl: Duration) -> Cookie<'static> {
    Cookie::build((name.to_owned(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    #[test]
    fn set_cookie_carries_attributes() {
        let id = SessionId::parse("abc123", 128).unwrap();
        let rendered = session_cookie("SESSIONID", &id, Duration::seconds(1440)).to_string();
        assert!(rendered.starts_with("SESSIONID=abc123"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=1440"));
    }

    #[test]
    fn reads_named_cookie_and_echoes_all() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("SESSIONID=s1; theme=dark"),
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_cookie_value(&jar, "SESSIONID").as_deref(), Some("s1"));
        assert_eq!(session_cookie_value(&jar, "PHPSESSID"), None);

        let echoed = cookie_map(&jar);
        assert_eq!(echoed["SESSIONID"], "s1");
        assert_eq!(echoed["theme"], "dark");
    }
}
