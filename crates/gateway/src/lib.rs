//! HTTP gateway for TreatOrHell.
//!
//! Exposes the Angel chat endpoint, the student questionnaire, the API docs
//! page, and service metadata. Built on Axum.

pub mod chat;
pub mod error;
pub mod questions;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use treatorhell_agent::AngelPersona;
use treatorhell_config::{ApiInfoConfig, AppConfig};
use treatorhell_providers::CompletionClient;
use treatorhell_storage::ContextStore;

use crate::error::ApiError;

const DOCS_HTML: &str = include_str!("../assets/docs.html");

/// Request bodies above this size are rejected.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Shared application state, built once at startup.
pub struct AppState {
    pub persona: Arc<AngelPersona>,
    pub store: ContextStore,
    pub info: ApiInfoConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the production persona and store from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let client = Arc::new(CompletionClient::from_config(config)?);
        info!(
            provider = client.provider_name(),
            model = client.model(),
            "completion_client_ready"
        );
        let store = ContextStore::from_config(&config.storage);
        let persona = Arc::new(AngelPersona::new(client, store.clone()));

        Ok(Self {
            persona,
            store,
            info: config.api.clone(),
        })
    }
}

/// Build the full router with all routes and layers.
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    let routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/docs", get(docs_handler))
        .route("/chat/angel", post(chat::chat_angel))
        .route("/questions/", get(questions::questions_form))
        .route("/questions/submit", post(questions::submit_questions))
        .with_state(state);

    apply_layers(routes, cors_origins)
}

fn apply_layers(router: Router, cors_origins: &[String]) -> Router {
    router
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(cors_origins))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins. A `*` inside a pattern matches one
/// subdomain label run, so `https://*.vercel.app` admits preview deployments.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins = origins.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|o| origins.iter().any(|pattern| origin_matches(pattern, o)))
            },
        ))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Whether `origin` is admitted by `pattern`.
pub fn origin_matches(pattern: &str, origin: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == origin,
        Some((prefix, suffix)) => {
            origin.len() > prefix.len() + suffix.len()
                && origin.starts_with(prefix)
                && origin.ends_with(suffix)
                && !origin[prefix.len()..origin.len() - suffix.len()].contains(['/', ':'])
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(error = message, "unhandled_exception");
    ApiError::Internal.into_response()
}

/// Start the gateway HTTP server and serve until Ctrl-C / SIGTERM.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr();
    let state = Arc::new(AppState::from_config(&config)?);
    let storage_backend = state.store.backend_name().to_string();
    let app = build_router(state, &config.gateway.cors_origins);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        addr = %addr,
        version = %config.api.version,
        debug = config.debug,
        model = %config.openai.model,
        storage_backend = %storage_backend,
        "application_started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("application_shutdown");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    docs: &'static str,
    endpoints: [&'static str; 1],
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "TreatOrHell API",
        docs: "/docs",
        endpoints: ["/chat/angel"],
    })
}

async fn docs_handler() -> Html<&'static str> {
    Html(DOCS_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: String,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: state.info.version.clone(),
    })
}
