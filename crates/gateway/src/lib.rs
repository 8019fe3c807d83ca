//! HTTP API gateway for taskpilot.
//!
//! A thin shell over the agent runtime: list and invoke tools, run the
//! default agent on a prompt, or run a planning flow. Every run gets a
//! fresh agent, so concurrent requests never share memory.
//!
//! Built on Axum.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use taskpilot_config::AppConfig;
use taskpilot_core::{EventBus, Llm, PlanStore, ToolRegistry};
use taskpilot_tools::{ToolOptions, default_registry};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub llm: Llm,
    /// Registry served by the tool endpoints
    pub tools: Arc<ToolRegistry>,
    /// Plans created through `POST /api/tool`
    pub plans: Arc<RwLock<PlanStore>>,
    pub event_bus: Arc<EventBus>,
}

impl GatewayState {
    pub fn new(config: AppConfig, llm: Llm) -> Self {
        let plans = Arc::new(RwLock::new(PlanStore::new()));
        let options = ToolOptions::from(&config.tools);
        let tools = default_registry(&options, plans.clone(), Some(llm.clone()));
        Self {
            config,
            llm,
            tools: Arc::new(tools),
            plans,
            event_bus: Arc::new(EventBus::default()),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server on `gateway.host:gateway.port`.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let llm = taskpilot_providers::build_llm(&config, "default")?;
    let state = Arc::new(GatewayState::new(config, llm));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
