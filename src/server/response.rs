//! Error responses and streamed document bodies.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::Stream;
use serde_json::json;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::error::{ErrorCategory, RedactorError};
use crate::lifecycle::TempArtifact;
use crate::redaction::RedactedDocument;

/// Header carrying the number of committed redactions.
pub const REDACTION_COUNT_HEADER: &str = "x-redaction-count";

/// JSON error body: `{"error": "...", "category": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    category: ErrorCategory,
    message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            category: ErrorCategory::Engine,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Caller-facing text for a server-side failure. Error details carry
/// artifact paths and engine internals, so they only go to the log.
fn server_message(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Persistence => {
            "Error processing PDF: the redacted document could not be written"
        }
        ErrorCategory::Engine | ErrorCategory::Validation | ErrorCategory::Audit => {
            "Error processing PDF: the document could not be read or redacted"
        }
    }
}

impl From<RedactorError> for ApiError {
    fn from(err: RedactorError) -> Self {
        let category = err.category();
        let (status, message) = match category {
            ErrorCategory::Validation => (StatusCode::BAD_REQUEST, err.to_string()),
            _ => {
                tracing::error!(category = category.as_str(), error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    server_message(category).to_string(),
                )
            }
        };
        Self {
            status,
            category,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(
            status = self.status.as_u16(),
            category = self.category.as_str(),
            error = %self.message,
            "error response"
        );
        let body = json!({
            "error": self.message,
            "category": self.category,
        });
        (self.status, Json(body)).into_response()
    }
}

/// File-backed body stream that owns its temp artifact.
///
/// The artifact is deleted when the stream is dropped, which hyper does
/// once the body has been fully written or the connection goes away.
pub struct ArtifactStream {
    inner: ReaderStream<File>,
    _artifact: TempArtifact,
}

impl ArtifactStream {
    pub async fn open(artifact: TempArtifact) -> Result<Self, RedactorError> {
        let file = File::open(artifact.path())
            .await
            .map_err(|e| RedactorError::Io {
                path: artifact.path().to_path_buf(),
                source: e,
            })?;
        Ok(Self {
            inner: ReaderStream::new(file),
            _artifact: artifact,
        })
    }
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Builds the attachment response for a finished request.
pub(crate) async fn stream_document(
    document: RedactedDocument,
    download_name: &str,
) -> Result<Response, ApiError> {
    let RedactedDocument { artifact, summary } = document;
    let length = tokio::fs::metadata(artifact.path())
        .await
        .map(|m| m.len())
        .ok();
    let stream = ArtifactStream::open(artifact).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{download_name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"redacted_secure.pdf\""));

    let mut response = Response::new(Body::from_stream(stream));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(REDACTION_COUNT_HEADER, HeaderValue::from(summary.redactions));
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    Ok(response)
}
