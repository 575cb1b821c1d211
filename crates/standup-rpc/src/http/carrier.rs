//! Session carrier: where the handle travels and how cookies are written.

use axum::http::HeaderMap;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Cookie, HeaderMapExt};
use chrono::{DateTime, Utc};

/// Where the session handle of a request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCarrier {
    /// `Authorization: Bearer <handle>`.
    Bearer(String),
    /// The session cookie.
    Cookie(String),
}

impl SessionCarrier {
    /// Extract the handle, preferring the bearer header over the cookie.
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<Self> {
        if let Some(auth) = headers.typed_get::<Authorization<Bearer>>() {
            return Some(Self::Bearer(auth.token().to_string()));
        }
        headers
            .typed_get::<Cookie>()
            .and_then(|cookie| cookie.get(cookie_name).map(str::to_string))
            .filter(|handle| !handle.is_empty())
            .map(Self::Cookie)
    }

    /// The raw handle.
    pub fn handle(&self) -> &str {
        match self {
            Self::Bearer(handle) | Self::Cookie(handle) => handle,
        }
    }

    /// Whether the handle came from the cookie.
    pub fn is_cookie(&self) -> bool {
        matches!(self, Self::Cookie(_))
    }
}

/// `Set-Cookie` value storing `handle` until `expires_at`.
pub fn session_cookie(
    name: &str,
    handle: &str,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
    secure: bool,
) -> String {
    let max_age = (expires_at - now).num_seconds().max(0);
    cookie(name, handle, max_age, secure)
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_cookie(name: &str, secure: bool) -> String {
    cookie(name, "", 0, secure)
}

fn cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::{AUTHORIZATION, COOKIE};
    use chrono::Duration;

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("standup_session=xyz"));
        assert_eq!(
            SessionCarrier::from_headers(&headers, "standup_session"),
            Some(SessionCarrier::Bearer("abc".into()))
        );
    }

    #[test]
    fn test_cookie_by_name() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; standup_session=xyz"));
        let carrier = SessionCarrier::from_headers(&headers, "standup_session").unwrap();
        assert!(carrier.is_cookie());
        assert_eq!(carrier.handle(), "xyz");
        assert!(SessionCarrier::from_headers(&headers, "other").is_none());
    }

    #[test]
    fn test_non_bearer_authorization_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(SessionCarrier::from_headers(&headers, "standup_session").is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let now = Utc::now();
        let set = session_cookie("standup_session", "abc", now + Duration::seconds(90), now, true);
        assert_eq!(
            set,
            "standup_session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=90; Secure"
        );
        assert_eq!(
            clear_cookie("standup_session", false),
            "standup_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
        );
    }
}
