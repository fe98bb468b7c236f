//! PDF engine capability.
//!
//! The pipeline never talks to a PDF library directly. It drives the three
//! traits below, which model exactly what redaction needs: open a document,
//! walk its pages, find literal text, mark regions, commit the marks, save.
//! [`MupdfEngine`] is the production implementation.

pub mod mupdf_backend;

#[cfg(test)]
pub(crate) mod testing;

pub use mupdf_backend::MupdfEngine;

use crate::error::RedactorResult;
use std::path::Path;
use std::sync::MutexGuard;

/// Axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Region {
    /// Creates a region, normalizing the corner order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }
}

/// Case handling for a literal search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Insensitive,
    Sensitive,
}

/// RGB fill for a committed redaction, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl FillColor {
    pub const BLACK: FillColor = FillColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn components(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for FillColor {
    fn default() -> Self {
        Self::BLACK
    }
}

/// How a document is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOptions {
    /// Garbage collection level, 0 (none) to 4 (deduplicate objects and streams).
    pub garbage_level: u8,
    /// Deflate uncompressed streams.
    pub compress: bool,
    /// Clean and sanitize content streams.
    pub clean: bool,
    /// Append changes to the file at the target path instead of rewriting it.
    pub incremental: bool,
}

impl SaveOptions {
    /// Straight rewrite, no compaction.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Aggressive compaction: full garbage collection, deflate, clean.
    pub fn compact() -> Self {
        Self {
            garbage_level: 4,
            compress: true,
            clean: true,
            incremental: false,
        }
    }

    /// Incremental update appended to the existing file.
    pub fn incremental() -> Self {
        Self {
            incremental: true,
            ..Self::default()
        }
    }
}

/// Descriptive metadata fields written into the document info dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub producer: String,
    pub creator: String,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
}

impl DocumentMetadata {
    /// Info dictionary key/value pairs.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("Producer", self.producer.as_str()),
            ("Creator", self.creator.as_str()),
            ("Title", self.title.as_str()),
            ("Author", self.author.as_str()),
            ("Subject", self.subject.as_str()),
            ("Keywords", self.keywords.as_str()),
        ]
    }
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            producer: "Zero-Trust Redactor".to_string(),
            creator: "Zero-Trust Redactor".to_string(),
            title: "Redacted Document".to_string(),
            author: "Anonymous".to_string(),
            subject: "Redacted Content".to_string(),
            keywords: "redacted, secure, privacy".to_string(),
        }
    }
}

/// One page of an open document.
pub trait PageHandle {
    /// Literal search of the page's text layer.
    fn search(&self, text: &str, case: CaseSensitivity) -> RedactorResult<Vec<Region>>;

    /// Marks a region for redaction. Nothing is removed until [`apply_marks`](Self::apply_marks).
    fn mark_redaction(&mut self, region: Region, fill: FillColor) -> RedactorResult<()>;

    /// Irreversibly removes everything under the marked regions and paints the fill.
    fn apply_marks(&mut self) -> RedactorResult<()>;
}

/// An open, exclusively owned document. Dropping it closes it.
pub trait DocumentHandle {
    type Page<'a>: PageHandle
    where
        Self: 'a;

    fn page_count(&self) -> RedactorResult<usize>;

    fn page(&mut self, index: usize) -> RedactorResult<Self::Page<'_>>;

    /// Writes the document to `path`.
    fn save(&mut self, path: &Path, options: &SaveOptions) -> RedactorResult<()>;

    /// Replaces the descriptive metadata fields.
    fn set_metadata(&mut self, metadata: &DocumentMetadata) -> RedactorResult<()>;

    /// Drops the catalog's XMP metadata stream, if any.
    fn remove_xmp_metadata(&mut self) -> RedactorResult<()>;
}

/// Factory for [`DocumentHandle`]s.
pub trait PdfEngine: Send + Sync {
    type Document: DocumentHandle;

    /// Returns a human-readable name for this engine.
    fn name(&self) -> &str;

    /// Claims the engine for one request.
    ///
    /// Engines whose native library cannot run two documents at once return
    /// a guard. Callers hold it until every document they opened is dropped.
    fn exclusive(&self) -> Option<MutexGuard<'static, ()>> {
        None
    }

    /// Parses a document from memory.
    fn open(&self, bytes: &[u8]) -> RedactorResult<Self::Document>;
}
