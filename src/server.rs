//! # Server Configuration
//!
//! Router assembly, shared state and the HTTP listener for the AnythingVoice API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{customer_auth_middleware, operator_auth_middleware};
use crate::config::AppConfig;
use crate::handlers;
use crate::integrations::Clients;
use crate::notifications::NotificationChannels;
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::telemetry::trace_middleware;
use crate::webhook_verification::webhook_verification_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub clients: Clients,
    pub pipeline: Pipeline,
    pub notifications: NotificationChannels,
}

impl AppState {
    /// Builds the state with real provider clients.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let clients = Clients::from_config(&config);
        Self::with_clients(Arc::new(config), db, clients)
    }

    /// Wires the pipeline and notification channels to the given clients.
    pub fn with_clients(config: Arc<AppConfig>, db: DatabaseConnection, clients: Clients) -> Self {
        let pipeline = Pipeline::new(
            db.clone(),
            clients.firecrawl.clone(),
            clients.openrouter.clone(),
            clients.vapi.clone(),
            PipelineSettings::from_config(&config),
        );
        let notifications = NotificationChannels {
            whatsapp: clients.whatsapp.clone(),
            telegram: clients.telegram.clone(),
        };

        Self {
            config,
            db,
            clients,
            pipeline,
            notifications,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::public::health))
        .route("/api/voices", get(handlers::public::list_voices))
        .route("/api/demo/{slug}", get(handlers::public::demo_card));

    let admin = Router::new()
        .route("/api/pipeline", post(handlers::pipeline::run_pipeline))
        .route("/api/pipeline/batch", post(handlers::pipeline::run_batch))
        .route("/api/businesses", get(handlers::businesses::list_businesses))
        .route(
            "/api/businesses/{id}",
            get(handlers::businesses::get_business)
                .patch(handlers::businesses::update_business)
                .delete(handlers::businesses::delete_business),
        )
        .route(
            "/api/businesses/{id}/events",
            get(handlers::businesses::list_events),
        )
        .route(
            "/api/businesses/{id}/send-email",
            post(handlers::businesses::send_demo_email),
        )
        .route(
            "/api/businesses/{id}/activate",
            post(handlers::businesses::activate_business),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&config),
            operator_auth_middleware,
        ));

    let customer = Router::new()
        .route(
            "/api/customer/settings",
            get(handlers::customer::get_settings).put(handlers::customer::update_settings),
        )
        .route("/api/customer/calls", get(handlers::customer::list_calls))
        .route("/api/customer/calls/{id}", get(handlers::customer::get_call))
        .route("/api/customer/usage", get(handlers::customer::usage))
        .route(
            "/api/customer/phone-numbers",
            get(handlers::customer::phone_numbers),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&config),
            customer_auth_middleware,
        ));

    let webhooks = Router::new()
        .route("/api/webhooks/vapi", post(handlers::webhooks::vapi_webhook))
        .route(
            "/api/webhooks/elks/voice",
            post(handlers::webhooks::elks_voice),
        )
        .route(
            "/api/webhooks/elks/hangup",
            post(handlers::webhooks::elks_hangup),
        )
        .layer(middleware::from_fn_with_state(
            config,
            webhook_verification_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(admin)
        .merge(customer)
        .merge(webhooks)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(trace_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::public::health,
        crate::handlers::public::list_voices,
        crate::handlers::public::demo_card,
        crate::handlers::pipeline::run_pipeline,
        crate::handlers::pipeline::run_batch,
        crate::handlers::businesses::list_businesses,
        crate::handlers::businesses::get_business,
        crate::handlers::businesses::update_business,
        crate::handlers::businesses::delete_business,
        crate::handlers::businesses::list_events,
        crate::handlers::businesses::send_demo_email,
        crate::handlers::businesses::activate_business,
        crate::handlers::customer::get_settings,
        crate::handlers::customer::update_settings,
        crate::handlers::customer::list_calls,
        crate::handlers::customer::get_call,
        crate::handlers::customer::usage,
        crate::handlers::customer::phone_numbers,
        crate::handlers::webhooks::vapi_webhook,
        crate::handlers::webhooks::elks_voice,
        crate::handlers::webhooks::elks_hangup,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::models::business::BusinessStatus,
            crate::models::business::BusinessResponse,
            crate::models::customer::CustomerSettings,
            crate::models::customer_call::CustomerCallResponse,
            crate::models::customer_call::TranscriptTurn,
            crate::models::lead_event::LeadEventResponse,
            crate::models::phone_number::PhoneNumberResponse,
            crate::models::usage_record::UsageResponse,
            crate::models::voice_option::Model,
            crate::pipeline::PipelineOutcome,
            crate::pipeline::BatchOutcome,
            crate::handlers::types::HealthResponse,
            crate::handlers::types::DemoCard,
            crate::handlers::types::PipelineRequest,
            crate::handlers::types::BatchPipelineRequest,
            crate::handlers::types::BusinessListResponse,
            crate::handlers::types::UpdateBusinessRequest,
            crate::handlers::types::SendEmailRequest,
            crate::handlers::types::ActivateRequest,
            crate::handlers::types::ActivationResponse,
            crate::handlers::types::UpdateSettingsRequest,
            crate::handlers::types::CallListResponse,
            crate::handlers::types::Acknowledgement,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "public", description = "Unauthenticated endpoints used by the demo page"),
        (name = "pipeline", description = "Lead-to-demo pipeline"),
        (name = "businesses", description = "Lead and business administration"),
        (name = "customer", description = "Signed-in customer endpoints"),
        (name = "webhooks", description = "Provider callbacks"),
    ),
    info(
        title = "AnythingVoice API",
        description = "AI voice receptionists for small businesses",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
