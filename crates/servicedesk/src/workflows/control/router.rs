use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::ConfirmationItem;
use super::remote::{ControlCodeConverter, DateValidator};
use super::screen::ControlScreenError;
use super::service::{ControlServiceError, ControlWorkflowService, SubmitOutcome};
use super::session::SessionStore;

/// Router builder exposing HTTP endpoints for the verification screen.
pub fn control_router<S, V, C>(service: Arc<ControlWorkflowService<S, V, C>>) -> Router
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    Router::new()
        .route("/api/v1/control/screen", post(enter_handler::<S, V, C>))
        .route("/api/v1/control/screen/:code", get(view_handler::<S, V, C>))
        .route(
            "/api/v1/control/screen/:code/confirmations",
            put(confirm_handler::<S, V, C>),
        )
        .route(
            "/api/v1/control/screen/:code/date-of-birth",
            put(correct_date_handler::<S, V, C>),
        )
        .route(
            "/api/v1/control/screen/:code/document-id",
            put(document_id_handler::<S, V, C>),
        )
        .route(
            "/api/v1/control/screen/:code/submit",
            post(submit_handler::<S, V, C>),
        )
        .route(
            "/api/v1/control/screen/:code/restart",
            post(restart_handler::<S, V, C>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmationRequest {
    pub(crate) item: ConfirmationItem,
    pub(crate) confirmed: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DateCorrectionRequest {
    pub(crate) date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentIdRequest {
    pub(crate) document_id: String,
}

pub(crate) async fn enter_handler<S, V, C>(
    State(service): State<Arc<ControlWorkflowService<S, V, C>>>,
) -> Response
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    match service.enter().await {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn view_handler<S, V, C>(
    State(service): State<Arc<ControlWorkflowService<S, V, C>>>,
    Path(code): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    match service.screen_view(&code) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn confirm_handler<S, V, C>(
    State(service): State<Arc<ControlWorkflowService<S, V, C>>>,
    Path(code): Path<String>,
    axum::Json(request): axum::Json<ConfirmationRequest>,
) -> Response
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    match service.confirm(&code, request.item, request.confirmed) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn correct_date_handler<S, V, C>(
    State(service): State<Arc<ControlWorkflowService<S, V, C>>>,
    Path(code): Path<String>,
    axum::Json(request): axum::Json<DateCorrectionRequest>,
) -> Response
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    match service.correct_date(&code, request.date) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn document_id_handler<S, V, C>(
    State(service): State<Arc<ControlWorkflowService<S, V, C>>>,
    Path(code): Path<String>,
    axum::Json(request): axum::Json<DocumentIdRequest>,
) -> Response
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    match service.capture_document_id(&code, &request.document_id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S, V, C>(
    State(service): State<Arc<ControlWorkflowService<S, V, C>>>,
    Path(code): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    match service.submit(&code).await {
        Ok(SubmitOutcome::Proceed) => {
            let payload = json!({ "outcome": "proceed" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(SubmitOutcome::Rejected(record)) => {
            let payload = json!({
                "outcome": "rejected",
                "error": record,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Ok(SubmitOutcome::Superseded) => {
            let payload = json!({ "outcome": "superseded" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn restart_handler<S, V, C>(
    State(service): State<Arc<ControlWorkflowService<S, V, C>>>,
    Path(code): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    V: DateValidator + 'static,
    C: ControlCodeConverter + 'static,
{
    match service.restart(&code) {
        Ok(()) => {
            let payload = json!({ "outcome": "restart" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ControlServiceError) -> Response {
    match error {
        ControlServiceError::NoActiveSession | ControlServiceError::ScreenNotFound(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        ControlServiceError::Screen(ControlScreenError::SubmissionBlocked(blockers)) => {
            let payload = json!({
                "error": "submission unavailable while preconditions are unmet",
                "blockers": blockers,
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        ControlServiceError::Screen(screen_error) => {
            let payload = json!({ "error": screen_error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ControlServiceError::Session(session_error) => {
            let payload = json!({ "error": session_error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
