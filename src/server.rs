//! HTTP surface: one answer endpoint plus a health check.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::{QaPipeline, NO_ANSWER};
use crate::trace::FileTraceHandler;

/// Shared application context: constructed once at startup, read-only for the
/// process lifetime.
pub struct AppContext {
    pub pipeline: QaPipeline,
    pub trace_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub alias: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub answer_text: String,
    pub run_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Build the service router.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/expert_bot/", post(answer_query))
        .route("/health", get(health))
        .with_state(ctx)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Answer one user query.
///
/// 404 covers the "no answer"-class outcomes (voting rejected, empty answer);
/// a backend failure is an opaque 500.
async fn answer_query(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<AnswerResponse>, (StatusCode, Json<ErrorResponse>)> {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, alias = %req.alias, "processing query");

    let trace = FileTraceHandler::new(&ctx.trace_dir, &req.query);

    let answer = ctx
        .pipeline
        .run(&req.query, &req.alias, &trace)
        .await
        .map_err(|e| {
            tracing::error!(%run_id, error = %e, "pipeline run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: "Internal error".to_string(),
                }),
            )
        })?;

    if answer.is_empty() || answer == NO_ANSWER {
        tracing::info!(%run_id, "no answer found");
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                detail: "No answer found".to_string(),
            }),
        ));
    }

    Ok(Json(AnswerResponse {
        answer: answer.clone(),
        answer_text: answer,
        run_id: Some(run_id.to_string()),
    }))
}
