//! Error types for the redaction service.
//!
//! Every failure the pipeline can produce maps onto one of four categories
//! (see [`ErrorCategory`]). The HTTP layer only ever looks at the category
//! and the display message; the structured fields exist for logging.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of a [`RedactorError`], used at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Caller supplied something unusable (missing file, no terms, bad payload).
    Validation,
    /// The PDF engine could not parse, search or redact the document.
    Engine,
    /// An artifact could not be written to disk.
    Persistence,
    /// The audit log could not be appended to. Never surfaced to callers.
    Audit,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Engine => "engine",
            Self::Persistence => "persistence",
            Self::Audit => "audit",
        }
    }
}

/// Error type for all redaction operations.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// Invalid request parameters (missing upload, empty term list, malformed entities).
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Error occurred while processing a document or one of its pages.
    #[error(
        "PDF processing error{}: {message}",
        .page.map(|p| format!(" on page {p}")).unwrap_or_default()
    )]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Backend-specific failure (MuPDF, pdf-extract).
    #[error("{backend} backend error: {message}")]
    BackendError {
        backend: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Text extraction failed.
    #[error("Text extraction failed for '{}': {reason}", .path.display())]
    TextExtraction { path: PathBuf, reason: String },

    /// Reading or writing a temp artifact failed.
    #[error("IO error for path '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The redacted output could not be persisted.
    #[error("Failed to persist '{}': {message}", .path.display())]
    Persistence {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The audit log could not be appended to.
    #[error("Audit log write failed for '{}': {source}", .path.display())]
    Audit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RedactorError {
    /// Shorthand for [`RedactorError::InvalidInput`].
    pub fn invalid_input(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Wraps a MuPDF failure that is not tied to a specific page.
    pub fn mupdf(message: impl Into<String>, source: mupdf::Error) -> Self {
        Self::BackendError {
            backend: "MuPDF".to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wraps a failure tied to a page (1-based in the message).
    pub fn page(page_index: usize, message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self::PdfProcessing {
            message: message.into(),
            page: Some(page_index + 1),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::Validation,
            Self::PdfProcessing { .. } | Self::BackendError { .. } | Self::TextExtraction { .. } => {
                ErrorCategory::Engine
            }
            Self::Io { .. } | Self::Persistence { .. } => ErrorCategory::Persistence,
            Self::Audit { .. } => ErrorCategory::Audit,
        }
    }

    /// True for errors that are the caller's fault rather than ours.
    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}
