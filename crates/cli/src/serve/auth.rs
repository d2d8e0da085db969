//! Admin login and session tokens.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;

use super::json_error;
use super::state::AppState;

/// Cookie carrying the session token.
pub(crate) const SESSION_COOKIE: &str = "admin_session";

/// The single admin credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Read `ADMIN_EMAIL` and `ADMIN_PASSWORD`. None if either is unset or
    /// empty.
    pub(crate) fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let email = lookup("ADMIN_EMAIL").filter(|v| !v.is_empty())?;
        let password = lookup("ADMIN_PASSWORD").filter(|v| !v.is_empty())?;
        Some(Self { email, password })
    }

    pub(crate) fn matches(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }
}

/// 32 random bytes, URL-safe base64 without padding.
pub(crate) fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Session token from `Authorization: Bearer <token>` or the session cookie.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if let Some(token) = bearer {
        return Some(token.trim());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// POST /login
pub(crate) async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(parsed): Json<serde_json::Value>,
) -> Response {
    let email = parsed.get("email").and_then(|v| v.as_str()).unwrap_or("");
    let password = parsed.get("password").and_then(|v| v.as_str()).unwrap_or("");

    let accepted = state
        .credentials
        .as_ref()
        .is_some_and(|c| c.matches(email, password));
    if !accepted {
        tracing::warn!("rejected login attempt");
        return json_error(StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
    }

    let token = new_session_token();
    state.sessions.insert(token.clone()).await;
    tracing::info!("admin logged in");

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        super::SESSION_TTL.as_secs()
    );
    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true, "token": token })),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_require_both_variables() {
        let both = |key: &str| match key {
            "ADMIN_EMAIL" => Some("admin@example.com".to_string()),
            "ADMIN_PASSWORD" => Some("hunter2".to_string()),
            _ => None,
        };
        let creds = Credentials::from_lookup(both).unwrap();
        assert!(creds.matches("admin@example.com", "hunter2"));
        assert!(!creds.matches("admin@example.com", "hunter3"));

        let email_only = |key: &str| (key == "ADMIN_EMAIL").then(|| "a@b.c".to_string());
        assert!(Credentials::from_lookup(email_only).is_none());

        let empty_password = |key: &str| match key {
            "ADMIN_EMAIL" => Some("a@b.c".to_string()),
            _ => Some(String::new()),
        };
        assert!(Credentials::from_lookup(empty_password).is_none());
    }

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_read_from_bearer_or_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        assert_eq!(session_token(&headers), Some("tok-1"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=tok-2"),
        );
        assert_eq!(session_token(&headers), Some("tok-2"));

        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
