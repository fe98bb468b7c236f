//! Temp artifact lifecycle.
//!
//! Every on-disk copy of a document is a [`TempArtifact`]. An artifact
//! deletes its file when dropped, so every exit path (success, error,
//! panic unwind, client disconnect mid-stream) ends with the file gone.
//! Deletion is best-effort: failures are logged and never replace the
//! request's own result.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{RedactorError, RedactorResult};

/// When the uploaded copy is deleted on the success path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputRetention {
    /// As soon as the engine has loaded the document.
    #[default]
    Early,
    /// After the output has been finalized.
    Late,
}

/// What an artifact holds. Used as the file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    Input,
    Output,
}

impl ArtifactRole {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "redacted",
        }
    }
}

/// The shared temp directory. Safe across workers through unique naming alone.
#[derive(Debug, Clone)]
pub struct TempWorkspace {
    dir: PathBuf,
}

impl TempWorkspace {
    /// Opens (creating if needed) the workspace directory.
    pub fn new(dir: impl Into<PathBuf>) -> RedactorResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| RedactorError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserves a fresh, collision-free path. Nothing is created on disk yet.
    pub fn allocate(&self, role: ArtifactRole) -> TempArtifact {
        let name = format!(
            "{}_{}_{}.pdf",
            role.prefix(),
            Utc::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4().simple()
        );
        TempArtifact {
            path: self.dir.join(name),
            role,
        }
    }

    /// Names of artifacts currently present in the workspace.
    pub fn residual_artifacts(&self) -> io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_artifact = path.file_name().and_then(|n| n.to_str()).is_some_and(|name| {
                [ArtifactRole::Input, ArtifactRole::Output]
                    .iter()
                    .any(|role| name.starts_with(&format!("{}_", role.prefix())))
            });
            if is_artifact {
                found.push(path);
            }
        }
        Ok(found)
    }
}

/// A uniquely named file owned by one request. Removed on drop.
pub struct TempArtifact {
    path: PathBuf,
    role: ArtifactRole,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn role(&self) -> ArtifactRole {
        self.role
    }

    /// Writes `bytes` to the artifact, creating it exclusively.
    pub fn write(&self, bytes: &[u8]) -> RedactorResult<()> {
        let io_err = |e| RedactorError::Io {
            path: self.path.clone(),
            source: e,
        };
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)
    }

    pub fn read(&self) -> RedactorResult<Vec<u8>> {
        fs::read(&self.path).map_err(|e| RedactorError::Io {
            path: self.path.clone(),
            source: e,
        })
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Deletes the file now. Safe to call repeatedly.
    pub fn remove(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(artifact = %self, "removed temp artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(artifact = %self, error = %e, "failed to remove temp artifact"),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Display for TempArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl fmt::Debug for TempArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempArtifact")
            .field("path", &self.path)
            .field("role", &self.role)
            .finish()
    }
}
