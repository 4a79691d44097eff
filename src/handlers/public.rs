//! # Public Handlers
//!
//! Health, the voice catalogue and demo page data. No authentication.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::db;
use crate::error::{ApiError, not_found};
use crate::handlers::types::{DemoCard, HealthResponse};
use crate::models::voice_option;
use crate::repositories::{BusinessRepository, VoiceOptionRepository};
use crate::server::AppState;

/// Liveness plus a database ping
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".into(),
                database: "ok".into(),
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".into(),
                    database: "unreachable".into(),
                }),
            )
        }
    }
}

/// Selectable assistant voices
#[utoipa::path(
    get,
    path = "/api/voices",
    responses(
        (status = 200, description = "Voice catalogue", body = [voice_option::Model]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "public"
)]
pub async fn list_voices(
    State(state): State<AppState>,
) -> Result<Json<Vec<voice_option::Model>>, ApiError> {
    let voices = VoiceOptionRepository::new(&state.db).list().await?;
    Ok(Json(voices))
}

/// Demo card for the public demo page
#[utoipa::path(
    get,
    path = "/api/demo/{slug}",
    params(("slug" = String, Path, description = "Business demo slug")),
    responses(
        (status = 200, description = "Demo card", body = DemoCard),
        (status = 404, description = "No demo for this slug", body = ApiError)
    ),
    tag = "public"
)]
pub async fn demo_card(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<DemoCard>, ApiError> {
    let business = BusinessRepository::new(&state.db)
        .find_by_slug(&slug.to_lowercase())
        .await?
        .filter(|b| b.is_demo_ready())
        .ok_or_else(|| not_found("Demo not found"))?;

    let services = business.service_names();
    let name = business.display_name().to_string();
    let (Some(slug), Some(assistant_id)) = (business.slug, business.vapi_assistant_id) else {
        return Err(not_found("Demo not found"));
    };

    Ok(Json(DemoCard {
        name,
        slug,
        industry: business.industry,
        website_url: business.website_url,
        assistant_id,
        services,
    }))
}
