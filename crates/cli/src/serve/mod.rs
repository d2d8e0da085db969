//! `leadbook serve` -- JSON HTTP API over the lead engine.
//!
//! Security features:
//! - CORS headers on all responses (permissive for local dev)
//! - Per-IP rate limiting (default: 60 req/min, configurable)
//! - Session-token authentication: `POST /login` checks `ADMIN_EMAIL` and
//!   `ADMIN_PASSWORD` and issues a token accepted as a Bearer header or the
//!   `admin_session` cookie; sessions expire after 12 hours
//!
//! Endpoints:
//! - GET    /health                - Server status (no auth)
//! - POST   /login                 - Admin login (no auth)
//! - GET    /stages                - The pipeline stages in order
//! - GET    /leads                 - Search and paginate leads
//! - POST   /leads                 - Create a lead
//! - GET    /leads/{id}            - One lead
//! - PATCH  /leads/{id}            - Edit owner, value, probability, status
//! - DELETE /leads/{id}            - Hard delete
//! - POST   /leads/{id}/status     - Status transition
//! - POST   /leads/{id}/move       - Pipeline card move
//! - POST   /leads/{id}/archive    - Archive
//! - POST   /leads/{id}/restore    - Restore
//! - GET    /leads/{id}/activity   - Activity trail
//! - GET    /leads/{id}/notes      - Notes
//! - POST   /leads/{id}/notes      - Add a note
//! - GET    /pipeline              - Per-stage counts and weighted totals
//! - GET    /forecast              - Forecast summary
//! - GET    /dashboard             - Dashboard counters
//! - GET    /users                 - Users for owner assignment
//!
//! All responses use Content-Type: application/json.

mod auth;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use leadbook_engine::LeadService;
use leadbook_storage::MemoryStorage;
use tower_http::cors::{Any, CorsLayer};

use self::auth::{handle_login, Credentials};
use self::handlers::{
    handle_activity, handle_add_note, handle_archive, handle_create_lead, handle_dashboard,
    handle_delete_lead, handle_forecast, handle_get_lead, handle_health, handle_list_leads,
    handle_list_notes, handle_move_card, handle_not_found, handle_pipeline, handle_restore,
    handle_set_status, handle_stages, handle_update_lead, handle_users,
};
use self::middleware::{auth_middleware, rate_limit_middleware};
use self::state::{AppState, RateLimiter, SessionStore};
use crate::config::Config;
use crate::error::CliError;

/// Maximum request body size: 1 MB.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Rate limit window.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// How long a login session stays valid.
const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/login", post(handle_login))
        .route("/stages", get(handle_stages))
        .route("/leads", get(handle_list_leads).post(handle_create_lead))
        .route(
            "/leads/{id}",
            get(handle_get_lead)
                .patch(handle_update_lead)
                .delete(handle_delete_lead),
        )
        .route("/leads/{id}/status", post(handle_set_status))
        .route("/leads/{id}/move", post(handle_move_card))
        .route("/leads/{id}/archive", post(handle_archive))
        .route("/leads/{id}/restore", post(handle_restore))
        .route("/leads/{id}/activity", get(handle_activity))
        .route(
            "/leads/{id}/notes",
            get(handle_list_notes).post(handle_add_note),
        )
        .route("/pipeline", get(handle_pipeline))
        .route("/forecast", get(handle_forecast))
        .route("/dashboard", get(handle_dashboard))
        .route("/users", get(handle_users))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Serve the API on `config.port` until Ctrl+C.
pub(crate) async fn start_server(
    service: LeadService<MemoryStorage>,
    config: Config,
) -> Result<(), CliError> {
    let credentials = Credentials::from_env();
    if credentials.is_none() {
        tracing::warn!("ADMIN_EMAIL or ADMIN_PASSWORD unset; every login will be rejected");
    }
    tracing::info!(
        rate_limit = config.rate_limit,
        data_file = %config.data_file.display(),
        "starting server"
    );

    let state = Arc::new(AppState {
        service,
        rate_limiter: RateLimiter::new(config.rate_limit),
        sessions: SessionStore::default(),
        credentials,
        page_size: config.page_size,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Leadbook listening on http://{}", addr);
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received shutdown signal"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for Ctrl+C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
