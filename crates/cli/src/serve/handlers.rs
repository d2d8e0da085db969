//! Route handlers: leads, notes, activity and the aggregate views.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use leadbook_engine::{query, EngineError, LeadUpdate, NewLead, Stage};
use leadbook_storage::LeadFilter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::json_error;
use super::state::AppState;

/// Map an engine error to its HTTP status and `{"error": ...}` body.
fn engine_error(e: EngineError) -> Response {
    let status = match &e {
        EngineError::InvalidStatus { .. }
        | EngineError::InvalidField { .. }
        | EngineError::EmptyNote => StatusCode::BAD_REQUEST,
        EngineError::LeadNotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::Persistence(_) => {
            tracing::error!(error = %e, "persistence failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_error(status, &e.to_string()).into_response()
}

fn respond<T: Serialize>(result: Result<T, EngineError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => engine_error(e),
    }
}

/// Decode a JSON body into one of the closed input types.
fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, Response> {
    serde_json::from_value(body).map_err(|e| {
        json_error(StatusCode::BAD_REQUEST, &format!("invalid request body: {}", e))
            .into_response()
    })
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// GET /stages
pub(crate) async fn handle_stages() -> impl IntoResponse {
    let stages: Vec<serde_json::Value> = Stage::ALL
        .iter()
        .map(|s| {
            serde_json::json!({
                "name": s.as_str(),
                "terminal": s.is_terminal(),
            })
        })
        .collect();
    (StatusCode::OK, Json(serde_json::json!({ "stages": stages })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ListParams {
    #[serde(default)]
    archived: bool,
    status: Option<String>,
    q: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

/// GET /leads
pub(crate) async fn handle_list_leads(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(p)) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &e.body_text()).into_response(),
    };

    let mut filter = if params.archived {
        LeadFilter::archived()
    } else {
        LeadFilter::active()
    };
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        match status.parse::<Stage>() {
            Ok(stage) => filter = filter.with_status(stage.as_str()),
            Err(e) => return engine_error(e),
        }
    }

    let leads = match state.service.fetch_leads(&filter).await {
        Ok(leads) => leads,
        Err(e) => return engine_error(e),
    };
    let matched = query::search(&leads, params.q.as_deref().unwrap_or(""));
    let page = query::paginate(
        matched,
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(state.page_size),
    );
    (StatusCode::OK, Json(page)).into_response()
}

/// POST /leads
pub(crate) async fn handle_create_lead(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let input: NewLead = match parse_body(body) {
        Ok(input) => input,
        Err(response) => return response,
    };
    match state
        .service
        .create_lead(&input, OffsetDateTime::now_utc())
        .await
    {
        Ok(lead) => (StatusCode::CREATED, Json(lead)).into_response(),
        Err(e) => engine_error(e),
    }
}

/// GET /leads/{id}
pub(crate) async fn handle_get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(state.service.get_lead(&id).await)
}

/// PATCH /leads/{id}
pub(crate) async fn handle_update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let update: LeadUpdate = match parse_body(body) {
        Ok(update) => update,
        Err(response) => return response,
    };
    respond(
        state
            .service
            .update_lead_fields(&id, &update, OffsetDateTime::now_utc())
            .await,
    )
}

/// DELETE /leads/{id}
pub(crate) async fn handle_delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(
        state
            .service
            .delete_lead(&id)
            .await
            .map(|()| serde_json::json!({ "deleted": id })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StatusBody {
    status: String,
}

/// POST /leads/{id}/status
pub(crate) async fn handle_set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let body: StatusBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    respond(
        state
            .service
            .transition_status(&id, &body.status, OffsetDateTime::now_utc())
            .await,
    )
}

/// POST /leads/{id}/move
pub(crate) async fn handle_move_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let body: StatusBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    respond(
        state
            .service
            .move_card(&id, &body.status, OffsetDateTime::now_utc())
            .await,
    )
}

/// POST /leads/{id}/archive
pub(crate) async fn handle_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(
        state
            .service
            .archive_lead(&id, OffsetDateTime::now_utc())
            .await,
    )
}

/// POST /leads/{id}/restore
pub(crate) async fn handle_restore(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(state.service.restore_lead(&id).await)
}

/// GET /leads/{id}/activity
pub(crate) async fn handle_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(state.service.activity(&id).await)
}

/// GET /leads/{id}/notes
pub(crate) async fn handle_list_notes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    respond(state.service.notes(&id).await)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoteBody {
    note: String,
}

/// POST /leads/{id}/notes
pub(crate) async fn handle_add_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let body: NoteBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    match state
        .service
        .add_note(&id, &body.note, OffsetDateTime::now_utc())
        .await
    {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(e) => engine_error(e),
    }
}

/// GET /pipeline
pub(crate) async fn handle_pipeline(State(state): State<Arc<AppState>>) -> Response {
    respond(state.service.pipeline_board().await)
}

/// GET /forecast
pub(crate) async fn handle_forecast(State(state): State<Arc<AppState>>) -> Response {
    respond(state.service.forecast_summary().await)
}

/// GET /dashboard
pub(crate) async fn handle_dashboard(State(state): State<Arc<AppState>>) -> Response {
    respond(
        state
            .service
            .dashboard_stats(OffsetDateTime::now_utc())
            .await,
    )
}

/// GET /users
pub(crate) async fn handle_users(State(state): State<Arc<AppState>>) -> Response {
    respond(state.service.users().await)
}
