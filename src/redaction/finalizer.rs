//! Writing the redacted document to its output artifact.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::engine::{DocumentHandle, DocumentMetadata, PdfEngine, SaveOptions};
use crate::error::{RedactorError, RedactorResult};

/// Compaction and metadata behaviour applied when saving the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FinalizationProfile {
    /// Garbage-collect, deflate and clean, then scrub descriptive metadata
    /// in an incremental update.
    #[default]
    Compact,
    /// Save as-is.
    Plain,
}

impl FinalizationProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Plain => "plain",
        }
    }

    pub fn scrubs_metadata(&self) -> bool {
        matches!(self, Self::Compact)
    }
}

impl fmt::Display for FinalizationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinalizationProfile {
    type Err = RedactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "plain" => Ok(Self::Plain),
            other => Err(RedactorError::invalid_input(
                "profile",
                format!("unknown finalization profile '{other}' (expected compact or plain)"),
            )),
        }
    }
}

/// Persists a mutated document.
#[derive(Debug, Clone, Default)]
pub struct DocumentFinalizer {
    metadata: DocumentMetadata,
}

impl DocumentFinalizer {
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self { metadata }
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Writes `doc` to `output` according to `profile`.
    ///
    /// The compact profile scrubs the info dictionary and drops the XMP
    /// stream before compacting, so garbage collection discards the old
    /// values. It then reopens the written file and commits the metadata
    /// again as an incremental update.
    pub fn finalize<E: PdfEngine>(
        &self,
        engine: &E,
        doc: &mut E::Document,
        output: &Path,
        profile: FinalizationProfile,
    ) -> RedactorResult<()> {
        match profile {
            FinalizationProfile::Plain => doc.save(output, &SaveOptions::plain()),
            FinalizationProfile::Compact => {
                doc.set_metadata(&self.metadata)?;
                doc.remove_xmp_metadata()?;
                doc.save(output, &SaveOptions::compact())?;

                let written = std::fs::read(output).map_err(|e| RedactorError::Io {
                    path: output.to_path_buf(),
                    source: e,
                })?;
                let mut reopened = engine.open(&written)?;
                reopened.set_metadata(&self.metadata)?;
                reopened.save(output, &SaveOptions::incremental())
            }
        }
    }
}
