//! Content-free audit trail.
//!
//! One line per lifecycle event, appended to a local file:
//!
//! ```text
//! [2026-01-01T12:00:00.000Z] REDACTION_COMPLETE: file_hash=3f7a9c01d2e4b6a8, entities=2, redactions=2
//! ```
//!
//! Entries carry a truncated SHA-256 of the upload and counters. They never
//! carry term text, file names or document content.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{ErrorCategory, RedactorError, RedactorResult};

/// Length of a full SHA-256 hex digest.
pub const MAX_FINGERPRINT_LEN: usize = 64;

/// Lifecycle event being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Start,
    Complete,
    Error,
}

impl AuditAction {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Start => "REDACTION_START",
            Self::Complete => "REDACTION_COMPLETE",
            Self::Error => "REDACTION_ERROR",
        }
    }
}

/// A single audit line.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    /// `None` when the upload could not be hashed.
    pub fingerprint: Option<String>,
    pub terms: usize,
    pub redactions: Option<usize>,
    pub category: Option<ErrorCategory>,
}

impl AuditEntry {
    pub fn start(fingerprint: &str, terms: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            action: AuditAction::Start,
            fingerprint: Some(fingerprint.to_string()),
            terms,
            redactions: None,
            category: None,
        }
    }

    pub fn complete(fingerprint: &str, terms: usize, redactions: usize) -> Self {
        Self {
            action: AuditAction::Complete,
            redactions: Some(redactions),
            ..Self::start(fingerprint, terms)
        }
    }

    pub fn error(fingerprint: Option<&str>, terms: usize, category: ErrorCategory) -> Self {
        Self {
            timestamp: Utc::now(),
            action: AuditAction::Error,
            fingerprint: fingerprint.map(str::to_string),
            terms,
            redactions: None,
            category: Some(category),
        }
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: file_hash={}, entities={}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.action.tag(),
            self.fingerprint.as_deref().unwrap_or("unknown"),
            self.terms
        )?;
        if let Some(redactions) = self.redactions {
            write!(f, ", redactions={redactions}")?;
        }
        if let Some(category) = self.category {
            write!(f, ", category={}", category.as_str())?;
        }
        Ok(())
    }
}

/// Appends [`AuditEntry`] lines to the local audit log.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    path: PathBuf,
}

impl AuditRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `entry`. Failures are logged and swallowed.
    pub fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.try_record(entry) {
            tracing::warn!(error = %e, "audit log write failed");
        }
    }

    /// Appends one line, opening the file in append mode for this write only.
    ///
    /// The whole line goes out in a single `write_all` on an `O_APPEND`
    /// handle so concurrent writers never interleave within a line.
    pub fn try_record(&self, entry: &AuditEntry) -> RedactorResult<()> {
        let line = format!("{entry}\n");
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .map_err(|e| RedactorError::Audit {
                path: self.path.clone(),
                source: e,
            })
    }
}

/// Truncated SHA-256 hex digest of a file's contents, streamed from disk.
pub fn fingerprint_file(path: &Path, len: usize) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut file = File::open(path)?;
    io::copy(&mut file, &mut hasher)?;
    Ok(truncate_digest(hasher.finalize().as_slice(), len))
}

fn truncate_digest(digest: &[u8], len: usize) -> String {
    let mut hex = hex::encode(digest);
    hex.truncate(len.min(MAX_FINGERPRINT_LEN));
    hex
}
