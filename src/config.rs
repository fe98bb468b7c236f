//! Process-wide configuration.
//!
//! Resolved once at startup (command line, then `ZTREDACT_*` environment
//! variables, then defaults) and handed to the service and router
//! explicitly. Nothing in the pipeline reads ambient globals.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;

use crate::audit::MAX_FINGERPRINT_LEN;
use crate::engine::DocumentMetadata;
use crate::error::{RedactorError, RedactorResult};
use crate::lifecycle::InputRetention;
use crate::redaction::FinalizationProfile;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;
pub const DEFAULT_FINGERPRINT_LEN: usize = 16;
pub const DEFAULT_MAX_HITS_PER_TERM: u32 = 500;

#[derive(Debug, Clone, Args)]
pub struct ServiceConfig {
    /// Address to listen on
    #[arg(long, env = "ZTREDACT_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Directory for per-request temp artifacts (created if missing)
    #[arg(long, env = "ZTREDACT_TEMP_DIR", default_value = "temp")]
    pub temp_dir: PathBuf,

    /// Append-only audit log
    #[arg(long, env = "ZTREDACT_AUDIT_LOG", default_value = "audit.log")]
    pub audit_log: PathBuf,

    /// Finalization profile used when a request does not pick one
    #[arg(long, env = "ZTREDACT_PROFILE", value_enum, default_value_t = FinalizationProfile::Compact)]
    pub default_profile: FinalizationProfile,

    /// When the uploaded copy is deleted on success
    #[arg(long, env = "ZTREDACT_INPUT_RETENTION", value_enum, default_value_t = InputRetention::Early)]
    pub input_retention: InputRetention,

    /// Largest accepted request body in bytes
    #[arg(long, env = "ZTREDACT_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Hex characters of the SHA-256 digest kept in audit entries
    #[arg(long, env = "ZTREDACT_FINGERPRINT_LEN", default_value_t = DEFAULT_FINGERPRINT_LEN)]
    pub fingerprint_len: usize,

    /// Initial search hit limit per term per page, doubled on a full page
    #[arg(long, env = "ZTREDACT_MAX_HITS", default_value_t = DEFAULT_MAX_HITS_PER_TERM)]
    pub max_hits_per_term: u32,

    /// Values written over the descriptive metadata by the compact profile
    #[arg(skip)]
    pub scrubbed_metadata: DocumentMetadata,
}

impl ServiceConfig {
    pub fn validate(&self) -> RedactorResult<()> {
        if self.fingerprint_len == 0 || self.fingerprint_len > MAX_FINGERPRINT_LEN {
            return Err(RedactorError::invalid_input(
                "fingerprint_len",
                format!("must be between 1 and {MAX_FINGERPRINT_LEN}"),
            ));
        }
        if self.max_hits_per_term == 0 {
            return Err(RedactorError::invalid_input(
                "max_hits_per_term",
                "must be at least 1",
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(RedactorError::invalid_input(
                "max_upload_bytes",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            temp_dir: PathBuf::from("temp"),
            audit_log: PathBuf::from("audit.log"),
            default_profile: FinalizationProfile::Compact,
            input_retention: InputRetention::Early,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            fingerprint_len: DEFAULT_FINGERPRINT_LEN,
            max_hits_per_term: DEFAULT_MAX_HITS_PER_TERM,
            scrubbed_metadata: DocumentMetadata::default(),
        }
    }
}
