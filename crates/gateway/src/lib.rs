//! HTTP API gateway for Aanya.
//!
//! Exposes the REST surface consumed by the chat UI: the chat turn itself,
//! session management, personalization settings, user stats, and the toy
//! auth endpoints.
//!
//! Built on Axum. Requests are handled end-to-end per turn; the store
//! serializes concurrent writes to the same rows, so no gateway-level
//! locking is needed around chat state.

pub mod api_v1;
pub mod auth;
pub mod validation;

use axum::extract::DefaultBodyLimit;
use axum::{Router, extract::State, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

use aanya_config::AppConfig;
use aanya_persona::PromptAssembler;
use aanya_providers::ProviderRouter;
use aanya_store::ProfileStore;
use auth::SimpleAuth;

/// Shared application state for the gateway.
///
/// Built once at startup; request handlers hold it behind an `Arc` and keep
/// only transient per-request copies of profile and transcript data.
pub struct GatewayState {
    pub config: AppConfig,
    pub store: ProfileStore,
    pub providers: ProviderRouter,
    pub assembler: PromptAssembler,
    pub auth: RwLock<SimpleAuth>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router: `/health` plus the `/v1` API.
///
/// Layers applied:
/// - CORS (the chat UI is served from a separate origin)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let v1 = api_v1::v1_router(state.clone()).merge(auth::auth_router(state.clone()));

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    name: &'static str,
    version: &'static str,
    status: &'static str,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = chrono::Utc::now() - state.start_time;
    Json(HealthResponse {
        name: "aanya",
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
        uptime_secs: uptime.num_seconds(),
    })
}

/// Start the gateway HTTP server.
///
/// Opens the store, builds the provider router from config, and serves
/// until the process exits. The store stays open for the process lifetime;
/// SQLite flushes on drop, so no explicit teardown is required.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store = ProfileStore::new(&config.database.path).await?;
    let providers = aanya_providers::build_from_config(&config);
    let assembler = PromptAssembler::new(&config.chat.assistant_name);

    let state = Arc::new(GatewayState {
        config,
        store,
        providers,
        assembler,
        auth: RwLock::new(SimpleAuth::new()),
        start_time: chrono::Utc::now(),
    });

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Aanya gateway listening on {addr}");
    axum::serve(listener, router).await?;
    Ok(())
}
