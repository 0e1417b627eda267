//! Application startup and lifecycle management.

use crate::config::SolverConfig;
use crate::error::panic_response;
use crate::handlers;
use crate::services::extractor;
use crate::services::providers::gemini::GeminiTextProvider;
use crate::services::{EmailProvider, ScratchDir, SmtpProvider, TextExtractor, TextProvider};
use axum::{
    extract::DefaultBodyLimit,
    http::{Method, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state. Everything a handler touches is injected here,
/// so tests can swap collaborators and point the scratch directory anywhere.
#[derive(Clone)]
pub struct AppState {
    pub scratch: ScratchDir,
    pub extractor: Arc<dyn TextExtractor>,
    pub text_provider: Arc<dyn TextProvider>,
    pub email_provider: Arc<dyn EmailProvider>,
}

impl AppState {
    /// Build the production collaborators from configuration.
    pub async fn from_config(config: &SolverConfig) -> Result<Self, AppError> {
        let scratch = ScratchDir::create(&config.upload.scratch_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create scratch directory at {}: {}",
                    config.upload.scratch_dir.display(),
                    e
                );
                AppError::from(e)
            })?;

        let extractor = extractor::from_config(&config.extractor);
        tracing::info!(backend = ?config.extractor.backend, "Initialized PDF extractor");

        if config.gemini.api_key.expose_secret() == crate::config::PLACEHOLDER_API_KEY {
            tracing::warn!("GEMINI_API_KEY is not set; answer generation will fail upstream");
        }

        let gemini = GeminiTextProvider::new(&config.gemini)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
        tracing::info!(model = %gemini.model(), "Initialized Gemini text provider");

        let email = SmtpProvider::new(&config.smtp)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        Ok(Self {
            scratch,
            extractor,
            text_provider: Arc::new(gemini),
            email_provider: Arc::new(email),
        })
    }
}

/// Assemble the HTTP surface.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/upload",
            post(handlers::upload_pdf).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/send-email",
            post(handlers::send_email).fallback(handlers::method_not_allowed),
        )
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        // The frontend is served from a different origin.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with production collaborators.
    pub async fn build(config: SolverConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config).await?;
        Self::build_with_state(&config, state).await
    }

    /// Build the application around an already-assembled state.
    pub async fn build_with_state(config: &SolverConfig, state: AppState) -> Result<Self, AppError> {
        let router = build_router(state, config.upload.max_upload_bytes);

        // Port 0 picks a random port (used by tests).
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

    tracing::info!("Shutdown signal received");
}
