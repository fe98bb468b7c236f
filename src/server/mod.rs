//! HTTP surface.
//!
//! `POST /redact` takes a multipart upload and streams back the redacted
//! PDF. The pipeline itself is blocking and runs on tokio's blocking pool,
//! one worker per request.

mod response;
mod upload;

pub use response::{ApiError, ArtifactStream};
pub use upload::Upload;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::engine::PdfEngine;
use crate::redaction::RedactionService;

/// Shared, read-only state handed to every handler.
pub struct AppState<E: PdfEngine> {
    pub service: Arc<RedactionService<E>>,
    pub config: Arc<ServiceConfig>,
}

impl<E: PdfEngine> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            config: Arc::clone(&self.config),
        }
    }
}

impl<E: PdfEngine> AppState<E> {
    pub fn new(service: RedactionService<E>, config: ServiceConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

pub fn router<E: PdfEngine + 'static>(state: AppState<E>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/compliance", get(compliance))
        .route("/redact", post(redact::<E>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Binds `config.bind` and serves until ctrl-c.
pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let service = RedactionService::from_config(&config)?;
    let bind = config.bind;
    let app = router(AppState::new(service, config));

    let listener = TcpListener::bind(bind).await?;
    tracing::info!(address = %listener.local_addr()?, "redaction server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "zero-trust-redactor",
        "message": "Redaction server is running",
        "privacy": "All processing is local - no data leaves your device",
    }))
}

async fn compliance() -> Json<Value> {
    Json(json!({
        "application": "Zero-Trust Redactor",
        "version": env!("CARGO_PKG_VERSION"),
        "data_handling": {
            "collection": "none",
            "storage": "temporary only (deleted after processing)",
            "transmission": "localhost only",
            "retention": "0 seconds",
        },
        "security": {
            "isolation": "local processing only",
            "audit": "local audit log with content hashes only",
        },
    }))
}

async fn redact<E: PdfEngine + 'static>(
    State(state): State<AppState<E>>,
    multipart: Multipart,
) -> Response {
    let upload = match Upload::from_multipart(multipart, state.config.default_profile).await {
        Ok(upload) => upload,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let download_name = upload.download_name();
    let service = Arc::clone(&state.service);
    let outcome = tokio::task::spawn_blocking(move || service.redact(upload.into_request())).await;

    match outcome {
        Ok(Ok(document)) => response::stream_document(document, &download_name)
            .await
            .unwrap_or_else(|err| err.into_response()),
        Ok(Err(err)) => ApiError::from(err).into_response(),
        Err(join_err) => {
            tracing::error!(error = %join_err, "redaction worker panicked");
            ApiError::internal("Redaction worker failed").into_response()
        }
    }
}
