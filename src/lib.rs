//! Zero-trust PDF redaction service.
//!
//! A local HTTP endpoint accepts a PDF plus a list of sensitive terms,
//! permanently removes every rendered occurrence of those terms, and returns
//! a new file. Neither the upload nor any intermediate file outlives the
//! request, and the audit trail records *that* a redaction happened without
//! recording *what* was redacted.
//!
//! # Architecture
//!
//! - [`domain`]: term normalization and caller payload shapes
//! - [`engine`]: the PDF engine capability and its MuPDF implementation
//! - [`redaction`]: match resolution, page-by-page application, finalization
//!   and the [`RedactionService`] pipeline
//! - [`lifecycle`]: temp artifacts that delete themselves
//! - [`audit`]: content-free audit log
//! - [`server`]: axum routes
//! - [`config`], [`error`]
//!
//! # Quick Start
//!
//! ```no_run
//! use ztredact::{FinalizationProfile, RedactionRequest, RedactionService, ServiceConfig, TermPayload};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedactionService::from_config(&ServiceConfig::default())?;
//!
//! let redacted = service.redact(RedactionRequest {
//!     document: std::fs::read("statement.pdf")?,
//!     payloads: vec![TermPayload::Delimited("John Smith, 555-1234".into())],
//!     profile: FinalizationProfile::Compact,
//! })?;
//!
//! // The output file is deleted when `redacted` is dropped.
//! std::fs::copy(redacted.path(), "statement.redacted.pdf")?;
//! println!("{} redaction(s)", redacted.summary.redactions);
//! # Ok(())
//! # }
//! ```
//!
//! ## Term normalization
//!
//! ```
//! use ztredact::{TermNormalizer, TermPayload};
//!
//! let terms = TermNormalizer::new()
//!     .normalize(&[TermPayload::Delimited("  John   Smith , ,555-1234".into())])
//!     .unwrap();
//! assert_eq!(terms[0].as_str(), "John Smith");
//! assert_eq!(terms.len(), 2);
//! ```

pub mod audit;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod redaction;
pub mod server;

use std::path::Path;

pub use audit::{AuditAction, AuditEntry, AuditRecorder};
pub use config::ServiceConfig;
pub use domain::{EntityItem, NormalizedTerm, TermNormalizer, TermPayload};
pub use engine::{
    CaseSensitivity, DocumentHandle, DocumentMetadata, FillColor, MupdfEngine, PageHandle,
    PdfEngine, Region, SaveOptions,
};
pub use error::{ErrorCategory, RedactorError, RedactorResult};
pub use lifecycle::{ArtifactRole, InputRetention, TempArtifact, TempWorkspace};
pub use redaction::{
    FinalizationProfile, RedactedDocument, RedactionRequest, RedactionService, RedactionSummary,
};

/// Extracts the text layer of a PDF file.
///
/// Independent of the redaction engine, so it doubles as a check that
/// redacted text is really gone.
pub fn extract_text_from_pdf(path: &Path) -> RedactorResult<String> {
    let bytes = std::fs::read(path).map_err(|e| RedactorError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| RedactorError::TextExtraction {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Extracts the text layer of an in-memory PDF.
pub fn extract_text_from_mem(bytes: &[u8]) -> RedactorResult<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| RedactorError::BackendError {
        backend: "pdf-extract".to_string(),
        message: e.to_string(),
        source: None,
    })
}
