// src/server/api.rs

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_util::stream::{Stream, StreamExt};
use serde::Serialize;
use tracing::debug;

use crate::errors::RunvisorError;
use crate::service::{PipelineSummary, RunIdRequest, RunParams, RunService, RunSummary};

/// SSE event name carrying one `RunStatusResponse` as JSON.
pub const STATUS_EVENT: &str = "status";

pub fn router(service: RunService) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/pipelines", get(list_pipelines))
        .route("/api/run", post(start_run))
        .route("/api/run/{run_id}/status", get(run_status))
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_pipelines(State(svc): State<RunService>) -> Json<PipelineSummary> {
    Json(svc.list_pipelines())
}

async fn start_run(
    State(svc): State<RunService>,
    Json(params): Json<RunParams>,
) -> Result<Json<RunSummary>, ApiErr> {
    let summary = svc.run(params)?;
    Ok(Json(summary))
}

async fn run_status(
    State(svc): State<RunService>,
    Path(run_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    debug!(run_id = %run_id, "status stream opened");

    let stream = svc
        .status(RunIdRequest { run_id })
        .map(|resp| Event::default().event(STATUS_EVENT).json_data(&resp));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<RunvisorError> for ApiErr {
    fn from(e: RunvisorError) -> Self {
        let (status, code) = match &e {
            RunvisorError::UnknownPipeline(_) => (StatusCode::NOT_FOUND, "unknown_pipeline"),
            RunvisorError::DuplicateRun(_) | RunvisorError::AlreadyStarted(_) => {
                (StatusCode::CONFLICT, "conflict")
            }
            RunvisorError::Unsupported(_) => (StatusCode::NOT_IMPLEMENTED, "unsupported"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        Self {
            status,
            code,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> axum::response::Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            code: &'static str,
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                code: self.code,
            }),
        )
            .into_response()
    }
}
