//! Shared helpers for integration tests.
//!
//! - PDF fixtures built with printpdf
//! - assertions that inspect output with pdf-extract and lopdf
//! - a throwaway service configuration rooted in a temp dir

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

use std::path::Path;

use tempfile::TempDir;
use ztredact::ServiceConfig;

/// Config whose temp dir and audit log live under `root`.
pub fn isolated_config(root: &Path) -> ServiceConfig {
    ServiceConfig {
        temp_dir: root.join("temp"),
        audit_log: root.join("audit.log"),
        ..Default::default()
    }
}

/// A scratch directory plus a config pointing into it.
pub fn scratch() -> (TempDir, ServiceConfig) {
    let dir = TempDir::new().expect("create temp dir");
    let config = isolated_config(dir.path());
    (dir, config)
}

/// Files still present in the service's temp dir.
pub fn residual_files(config: &ServiceConfig) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(&config.temp_dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn audit_log(config: &ServiceConfig) -> String {
    std::fs::read_to_string(&config.audit_log).unwrap_or_default()
}
