//! # Pipeline Handlers

use axum::{extract::State, response::Json};
use serde_json::json;

use crate::auth::OperatorAuth;
use crate::error::{ApiError, validation_error};
use crate::handlers::types::{BatchPipelineRequest, PipelineRequest};
use crate::pipeline::{BatchOutcome, MAX_BATCH_URLS, PipelineOutcome};
use crate::server::AppState;

/// Run the pipeline for one URL
///
/// Pipeline failures are reported in the outcome's `error` field.
#[utoipa::path(
    post,
    path = "/api/pipeline",
    security(("bearer_auth" = [])),
    request_body = PipelineRequest,
    responses(
        (status = 200, description = "Pipeline outcome", body = PipelineOutcome),
        (status = 400, description = "Missing URL", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "pipeline"
)]
pub async fn run_pipeline(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Json(request): Json<PipelineRequest>,
) -> Result<Json<PipelineOutcome>, ApiError> {
    if request.url.trim().is_empty() {
        return Err(validation_error(
            "URL is required",
            json!({ "url": "must not be empty" }),
        ));
    }

    Ok(Json(state.pipeline.run_single(&request.url).await))
}

/// Run the pipeline for many URLs
///
/// URLs are processed in small concurrent groups. One result per input URL,
/// in input order.
#[utoipa::path(
    post,
    path = "/api/pipeline/batch",
    security(("bearer_auth" = [])),
    request_body = BatchPipelineRequest,
    responses(
        (status = 200, description = "Batch outcome", body = BatchOutcome),
        (status = 400, description = "Empty or oversized batch", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "pipeline"
)]
pub async fn run_batch(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Json(request): Json<BatchPipelineRequest>,
) -> Result<Json<BatchOutcome>, ApiError> {
    if request.urls.is_empty() {
        return Err(validation_error(
            "At least one URL is required",
            json!({ "urls": "must not be empty" }),
        ));
    }
    if request.urls.len() > MAX_BATCH_URLS {
        return Err(validation_error(
            "Too many URLs",
            json!({ "urls": format!("at most {} URLs per batch", MAX_BATCH_URLS) }),
        ));
    }

    tracing::info!(count = request.urls.len(), "Starting batch pipeline");
    Ok(Json(state.pipeline.run_batch(&request.urls).await))
}
