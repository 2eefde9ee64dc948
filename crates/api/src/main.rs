#![allow(deprecated)] // TimeoutLayer::new is deprecated but replacement API not stable
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use nexus_core::{AppConfig, OperatingMode};
use nexus_storage::{MockStorage, S3Storage, StorageBackend, StorageUploader};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod error;
mod health;
mod staging;
mod submit;

pub struct AppState {
    pub config: AppConfig,
    pub uploader: StorageUploader,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    // Staging directory for incoming archives
    if let Err(e) = tokio::fs::create_dir_all(&config.upload_dir).await {
        tracing::warn!("Could not create upload directory {:?}: {}", config.upload_dir, e);
    }

    // Initialize Storage
    let backend: Arc<dyn StorageBackend> = if config.mock_mode {
        tracing::warn!("MOCK MODE enabled - submissions are not transferred");
        Arc::new(MockStorage::new())
    } else {
        Arc::new(S3Storage::new(&config.storage))
    };

    log_destinations(&config);
    health::mark_server_start();

    let port = config.port;
    let state = Arc::new(AppState {
        uploader: StorageUploader::new(backend),
        config,
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("🚀 Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn log_destinations(config: &AppConfig) {
    tracing::info!("Operating mode: {}", config.mode().as_str());
    for entry in config.destinations.iter() {
        if !entry.is_enabled() {
            tracing::info!("{}: not configured", entry.organization);
            continue;
        }
        match config.mode() {
            OperatingMode::FileRequest => tracing::info!(
                "{}: file request {}",
                entry.organization,
                entry.file_request_url.as_deref().unwrap_or("-")
            ),
            _ => tracing::info!(
                "{}: storage account {}",
                entry.organization,
                entry.credentials.masked_email()
            ),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;
    let request_timeout_secs = state.config.request_timeout_secs;
    let cors = configure_cors(state.config.frontend_url.clone());

    // Upload route streams to disk, so only the outer byte cap applies
    let upload_routes = Router::new()
        .route(
            "/api/upload",
            post(submit::upload_submission).layer(DefaultBodyLimit::disable()),
        )
        .layer(RequestBodyLimitLayer::new(max_upload_bytes));

    Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::health))
        .route("/api/config", get(health::config))
        .route("/api/get-upload-url", post(submit::get_upload_url))
        .merge(upload_routes)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        // Large archives over slow links need a long window
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_secs)))
        .layer(middleware::map_response(json_error_body))
        .layer(cors)
        .with_state(state)
}

/// Error responses produced by layers carry plain text; give them the
/// `{success, message}` body every handler error uses.
async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if is_json {
        return response;
    }

    let message = match status {
        StatusCode::PAYLOAD_TOO_LARGE => "File too large",
        StatusCode::REQUEST_TIMEOUT => "Request timed out",
        other => other.canonical_reason().unwrap_or("Request failed"),
    };
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unexpected failure".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": format!("Server error: {}", detail),
        })),
    )
        .into_response()
}

/// Browser origins allowed to call the API: Vercel deployments, local development
/// hosts and the configured frontend. Requests without an Origin header never reach
/// this check.
fn is_allowed_origin(origin: &str, frontend_url: Option<&str>) -> bool {
    let origin = origin.trim_end_matches('/');
    if origin.ends_with(".vercel.app") {
        return true;
    }
    if origin.contains("localhost") || origin.contains("127.0.0.1") {
        return true;
    }
    frontend_url
        .map(|url| url.trim_end_matches('/') == origin)
        .unwrap_or(false)
}

fn configure_cors(frontend_url: Option<String>) -> CorsLayer {
    let allowed_methods = AllowMethods::list([Method::GET, Method::POST, Method::OPTIONS]);
    let allowed_headers = AllowHeaders::list([header::CONTENT_TYPE]);

    if let Some(ref url) = frontend_url {
        tracing::info!("CORS: frontend origin {}", url);
    }

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let allowed = origin
            .to_str()
            .map(|o| is_allowed_origin(o, frontend_url.as_deref()))
            .unwrap_or(false);
        if !allowed {
            tracing::warn!("CORS blocked origin: {:?}", origin);
        }
        allowed
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(allowed_methods)
        .allow_headers(allowed_headers)
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}
