//! The redaction request pipeline.
//!
//! [`RedactionService::redact`] runs one request end to end:
//!
//! 1. normalize terms (nothing touches disk before this succeeds),
//! 2. materialize the upload as a temp artifact and fingerprint it,
//! 3. open it with the engine, then search, mark and commit page by page,
//! 4. finalize into a fresh output artifact,
//! 5. hand the output back to the caller, who owns its deletion.
//!
//! Audit entries bracket steps 2 to 4. On any failure both artifacts are
//! removed before the error is returned.

pub mod applicator;
pub mod finalizer;
pub mod resolver;

pub use applicator::{ApplyReport, RedactionApplicator};
pub use finalizer::{DocumentFinalizer, FinalizationProfile};
pub use resolver::{MatchLocation, MatchResolver, MATCH_TIERS};

use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use crate::audit::{fingerprint_file, AuditEntry, AuditRecorder};
use crate::config::ServiceConfig;
use crate::domain::{NormalizedTerm, TermNormalizer, TermPayload};
use crate::engine::{MupdfEngine, PdfEngine};
use crate::error::{RedactorError, RedactorResult};
use crate::lifecycle::{ArtifactRole, InputRetention, TempArtifact, TempWorkspace};

/// One redaction request, already detached from its transport.
#[derive(Debug, Clone)]
pub struct RedactionRequest {
    /// Uploaded PDF bytes.
    pub document: Vec<u8>,
    /// Term sources, normalized in order.
    pub payloads: Vec<TermPayload>,
    pub profile: FinalizationProfile,
}

/// Non-sensitive statistics about a completed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactionSummary {
    pub fingerprint: String,
    pub terms: usize,
    pub pages_processed: usize,
    pub pages_modified: usize,
    pub redactions: usize,
    pub profile: FinalizationProfile,
}

impl RedactionSummary {
    /// Returns true if any redactions were applied.
    pub fn has_redactions(&self) -> bool {
        self.redactions > 0
    }
}

/// Output of a successful request.
///
/// Dropping it deletes the output file, so keep it alive until the bytes
/// have been delivered.
#[derive(Debug)]
pub struct RedactedDocument {
    pub artifact: TempArtifact,
    pub summary: RedactionSummary,
}

impl RedactedDocument {
    pub fn path(&self) -> &Path {
        self.artifact.path()
    }
}

/// Redaction pipeline bound to an engine, a temp workspace and an audit log.
pub struct RedactionService<E: PdfEngine = MupdfEngine> {
    engine: E,
    normalizer: TermNormalizer,
    applicator: RedactionApplicator,
    finalizer: DocumentFinalizer,
    workspace: TempWorkspace,
    audit: AuditRecorder,
    retention: InputRetention,
    fingerprint_len: usize,
}

impl RedactionService<MupdfEngine> {
    /// Builds the production service from configuration.
    pub fn from_config(config: &ServiceConfig) -> RedactorResult<Self> {
        let engine = MupdfEngine::new().with_max_hits(config.max_hits_per_term);
        Self::with_engine(engine, config)
    }
}

impl<E: PdfEngine> RedactionService<E> {
    pub fn with_engine(engine: E, config: &ServiceConfig) -> RedactorResult<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            normalizer: TermNormalizer::new(),
            applicator: RedactionApplicator::new(),
            finalizer: DocumentFinalizer::new(config.scrubbed_metadata.clone()),
            workspace: TempWorkspace::new(&config.temp_dir)?,
            audit: AuditRecorder::new(&config.audit_log),
            retention: config.input_retention,
            fingerprint_len: config.fingerprint_len,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn workspace(&self) -> &TempWorkspace {
        &self.workspace
    }

    pub fn retention(&self) -> InputRetention {
        self.retention
    }

    /// Runs one request to completion or failure.
    pub fn redact(&self, request: RedactionRequest) -> RedactorResult<RedactedDocument> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "redact",
            %request_id,
            profile = %request.profile,
            fingerprint = tracing::field::Empty
        );
        let _enter = span.enter();

        if request.document.is_empty() {
            return Err(RedactorError::invalid_input("file", "No file provided"));
        }
        let terms = self.normalizer.normalize(&request.payloads)?;

        let input = self.workspace.allocate(ArtifactRole::Input);
        if let Err(err) = input.write(&request.document) {
            input.remove();
            self.audit
                .record(&AuditEntry::error(None, terms.len(), err.category()));
            return Err(err);
        }
        drop(request.document);

        let fingerprint = match fingerprint_file(input.path(), self.fingerprint_len) {
            Ok(fp) => fp,
            Err(e) => {
                input.remove();
                let err = RedactorError::Io {
                    path: input.path().to_path_buf(),
                    source: e,
                };
                self.audit
                    .record(&AuditEntry::error(None, terms.len(), err.category()));
                return Err(err);
            }
        };
        span.record("fingerprint", fingerprint.as_str());
        self.audit.record(&AuditEntry::start(&fingerprint, terms.len()));
        tracing::info!(%fingerprint, terms = terms.len(), "redaction started");

        let output = self.workspace.allocate(ArtifactRole::Output);
        match self.process(&terms, &input, &output, request.profile) {
            Ok(report) => {
                input.remove();
                self.audit.record(&AuditEntry::complete(
                    &fingerprint,
                    terms.len(),
                    report.redactions,
                ));
                tracing::info!(
                    redactions = report.redactions,
                    pages = report.pages_processed,
                    "redaction complete"
                );
                Ok(RedactedDocument {
                    artifact: output,
                    summary: RedactionSummary {
                        fingerprint,
                        terms: terms.len(),
                        pages_processed: report.pages_processed,
                        pages_modified: report.pages_modified,
                        redactions: report.redactions,
                        profile: request.profile,
                    },
                })
            }
            Err(err) => {
                input.remove();
                output.remove();
                self.audit.record(&AuditEntry::error(
                    Some(&fingerprint),
                    terms.len(),
                    err.category(),
                ));
                tracing::warn!(category = err.category().as_str(), error = %err, "redaction failed");
                Err(err)
            }
        }
    }

    /// Engine work for one request: load, redact, finalize.
    fn process(
        &self,
        terms: &[NormalizedTerm],
        input: &TempArtifact,
        output: &TempArtifact,
        profile: FinalizationProfile,
    ) -> RedactorResult<ApplyReport> {
        // Declared first so it is released after `doc`.
        let _engine = self.engine.exclusive();

        let bytes = input.read()?;
        let mut doc = self.engine.open(&bytes)?;
        drop(bytes);

        if self.retention == InputRetention::Early {
            input.remove();
        }

        let report = self.applicator.redact_document(&mut doc, terms)?;
        self.finalizer
            .finalize(&self.engine, &mut doc, output.path(), profile)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FakeDocument, FakeEngine, SnapshotEngine};
    use crate::error::ErrorCategory;
    use tempfile::TempDir;

    fn service(dir: &TempDir, retention: InputRetention) -> RedactionService<FakeEngine> {
        let config = ServiceConfig {
            temp_dir: dir.path().join("temp"),
            audit_log: dir.path().join("audit.log"),
            input_retention: retention,
            ..Default::default()
        };
        RedactionService::with_engine(FakeEngine, &config).unwrap()
    }

    fn request(pages: &[&str], words: &str, profile: FinalizationProfile) -> RedactionRequest {
        RedactionRequest {
            document: FakeDocument::new(pages).serialize().into_bytes(),
            payloads: vec![TermPayload::Delimited(words.to_string())],
            profile,
        }
    }

    fn audit_log(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join("audit.log")).unwrap_or_default()
    }

    #[test]
    fn test_two_page_scenario() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, InputRetention::Early);

        let result = service
            .redact(request(
                &["Patient John Smith", "Call 555-1234"],
                "John Smith, 555-1234",
                FinalizationProfile::Plain,
            ))
            .unwrap();

        assert_eq!(result.summary.redactions, 2);
        assert_eq!(result.summary.pages_modified, 2);
        let written = std::fs::read_to_string(result.path()).unwrap();
        assert!(!written.contains("John Smith"));
        assert!(!written.contains("555-1234"));

        // Only the output remains until the caller drops it.
        assert_eq!(service.workspace().residual_artifacts().unwrap().len(), 1);
        drop(result);
        assert!(service.workspace().residual_artifacts().unwrap().is_empty());

        let log = audit_log(&dir);
        assert!(log.contains("REDACTION_START"));
        assert!(log.contains("redactions=2"));
        assert!(!log.contains("John Smith"));
        assert!(!log.contains("555-1234"));
    }

    #[test]
    fn test_blank_terms_create_nothing() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, InputRetention::Early);

        let err = service
            .redact(request(&["text"], ", ,", FinalizationProfile::Plain))
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(service.workspace().residual_artifacts().unwrap().is_empty());
        assert!(audit_log(&dir).is_empty());
    }

    #[test]
    fn test_empty_upload_rejected() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, InputRetention::Early);
        let err = service
            .redact(RedactionRequest {
                document: Vec::new(),
                payloads: vec![TermPayload::Delimited("x".into())],
                profile: FinalizationProfile::Plain,
            })
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_corrupt_upload_cleans_up() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, InputRetention::Late);

        let err = service
            .redact(RedactionRequest {
                document: b"garbage".to_vec(),
                payloads: vec![TermPayload::Delimited("x".into())],
                profile: FinalizationProfile::Compact,
            })
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Engine);
        assert!(service.workspace().residual_artifacts().unwrap().is_empty());
        let log = audit_log(&dir);
        assert!(log.contains("REDACTION_ERROR"));
        assert!(log.contains("category=engine"));
    }

    #[test]
    fn test_idempotent_second_pass() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, InputRetention::Early);

        let first = service
            .redact(request(&["Alice"], "alice", FinalizationProfile::Plain))
            .unwrap();
        let redacted = std::fs::read(first.path()).unwrap();
        drop(first);

        let second = service
            .redact(RedactionRequest {
                document: redacted.clone(),
                payloads: vec![TermPayload::Delimited("alice".into())],
                profile: FinalizationProfile::Plain,
            })
            .unwrap();
        assert_eq!(second.summary.redactions, 0);
        assert_eq!(std::fs::read(second.path()).unwrap(), redacted);
    }

    #[test]
    fn test_compact_profile_scrubs_metadata() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, InputRetention::Late);

        let result = service
            .redact(request(&["Alice"], "Alice", FinalizationProfile::Compact))
            .unwrap();
        let written = std::fs::read_to_string(result.path()).unwrap();
        assert!(written.ends_with("%META Redacted Document"));
        assert_eq!(result.summary.profile, FinalizationProfile::Compact);
    }

    /// Artifacts present in the workspace when the output was saved.
    fn artifacts_at_save(retention: InputRetention) -> Vec<String> {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            temp_dir: dir.path().join("temp"),
            audit_log: dir.path().join("audit.log"),
            input_retention: retention,
            ..Default::default()
        };
        let engine = SnapshotEngine::new(&config.temp_dir);
        let snapshots = engine.snapshots.clone();
        let service = RedactionService::with_engine(engine, &config).unwrap();

        let result = service
            .redact(request(&["Alice"], "Alice", FinalizationProfile::Plain))
            .unwrap();
        assert_eq!(result.summary.redactions, 1);
        drop(result);
        assert!(service.workspace().residual_artifacts().unwrap().is_empty());

        let mut snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        snapshots.remove(0)
    }

    #[test]
    fn test_early_retention_removes_input_before_save() {
        let artifacts = artifacts_at_save(InputRetention::Early);
        assert!(artifacts.iter().all(|name| !name.starts_with("input_")));
    }

    #[test]
    fn test_late_retention_keeps_input_until_finalized() {
        let artifacts = artifacts_at_save(InputRetention::Late);
        assert_eq!(
            artifacts.iter().filter(|name| name.starts_with("input_")).count(),
            1
        );
    }
}
