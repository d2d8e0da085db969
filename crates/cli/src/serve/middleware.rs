//! HTTP middleware: rate limiting and session authentication.

use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::auth::session_token;
use super::state::AppState;

/// Paths reachable without a session.
const PUBLIC_PATHS: [&str; 2] = ["/health", "/login"];

/// Rate limiting middleware. Checks per-IP request rate before routing.
pub(crate) async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ip = addr.ip();
    match state.rate_limiter.check(ip).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(%ip, retry_after, "rate limit exceeded");
            let body = serde_json::json!({
                "error": "rate limit exceeded",
                "retry_after": retry_after,
            });
            (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
        }
    }
}

/// Session authentication middleware.
///
/// Every route except [`PUBLIC_PATHS`] needs a token issued by `/login`,
/// sent as `Authorization: Bearer <token>` or the `admin_session` cookie.
pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    // Owned: the request body is not Sync, so no borrow of it may cross an await.
    let Some(token) = session_token(request.headers()).map(str::to_string) else {
        return super::json_error(StatusCode::UNAUTHORIZED, "authentication required")
            .into_response();
    };
    if state.sessions.contains(&token).await {
        next.run(request).await
    } else {
        super::json_error(StatusCode::UNAUTHORIZED, "invalid or expired session").into_response()
    }
}
