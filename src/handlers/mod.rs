//! # API Handlers
//!
//! HTTP endpoint handlers for the AnythingVoice API.

use crate::models::ServiceInfo;
use axum::response::Json;

pub mod businesses;
pub mod customer;
pub mod pipeline;
pub mod public;
pub mod types;
pub mod webhooks;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}
