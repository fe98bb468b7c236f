//! MuPDF-backed engine.
//!
//! Redactions are created as PDF `Redact` annotations and committed with
//! `pdf_redact_page`, which physically removes the glyphs, images and vector
//! content under each annotation before painting the fill box.
//!
//! MuPDF shares font and glyph caches across every document in the process,
//! so all work runs under [`MupdfEngine::exclusive`]'s process-wide lock.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfObject, PdfPage, PdfWriteOptions};
use mupdf::{Matrix, Page, Quad, TextPageOptions};

use super::{
    CaseSensitivity, DocumentHandle, DocumentMetadata, FillColor, PageHandle, PdfEngine, Region,
    SaveOptions,
};
use crate::error::{RedactorError, RedactorResult};

static ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// Upper bound for the doubling search retry.
const SEARCH_HIT_CEILING: u32 = 1 << 16;

/// Engine backed by the MuPDF library.
#[derive(Debug, Clone)]
pub struct MupdfEngine {
    /// Initial search hit limit per term per page
    max_hits: u32,
}

impl MupdfEngine {
    /// Creates an engine with default settings.
    pub fn new() -> Self {
        Self { max_hits: 500 }
    }

    /// Sets the initial number of search hits requested per term per page.
    ///
    /// A page with more occurrences is searched again with a doubled limit,
    /// so this only tunes how many retries a dense page costs.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits.max(1);
        self
    }

    pub fn max_hits(&self) -> u32 {
        self.max_hits
    }
}

impl Default for MupdfEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfEngine for MupdfEngine {
    type Document = MupdfDocument;

    fn name(&self) -> &str {
        "MuPDF"
    }

    fn exclusive(&self) -> Option<MutexGuard<'static, ()>> {
        // A panic mid-request leaves no MuPDF state behind the guard.
        Some(ENGINE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    fn open(&self, bytes: &[u8]) -> RedactorResult<MupdfDocument> {
        let doc = PdfDocument::from_bytes(bytes).map_err(|e| RedactorError::PdfProcessing {
            message: "Failed to open PDF with MuPDF".to_string(),
            page: None,
            source: Some(Box::new(e)),
        })?;

        Ok(MupdfDocument {
            doc,
            max_hits: self.max_hits,
        })
    }
}

/// Open MuPDF document. Closed on drop.
pub struct MupdfDocument {
    doc: PdfDocument,
    max_hits: u32,
}

impl DocumentHandle for MupdfDocument {
    type Page<'a> = MupdfPage;

    fn page_count(&self) -> RedactorResult<usize> {
        self.doc
            .page_count()
            .map(|count| count.max(0) as usize)
            .map_err(|e| RedactorError::mupdf("Failed to get page count", e))
    }

    fn page(&mut self, index: usize) -> RedactorResult<MupdfPage> {
        let page = self
            .doc
            .load_page(index as i32)
            .map_err(|e| RedactorError::page(index, "Failed to load page", Some(Box::new(e))))?;

        let pdf_page = PdfPage::try_from(page.clone())
            .map_err(|_| RedactorError::page(index, "Page is not a PDF page", None))?;

        Ok(MupdfPage {
            index,
            page,
            pdf_page,
            max_hits: self.max_hits,
            pending: 0,
        })
    }

    fn save(&mut self, path: &Path, options: &SaveOptions) -> RedactorResult<()> {
        let path_str = path.to_str().ok_or_else(|| RedactorError::Persistence {
            path: path.to_path_buf(),
            message: "Path contains invalid UTF-8".to_string(),
            source: None,
        })?;

        let mut write_options = PdfWriteOptions::default();
        write_options
            .set_garbage_level(i32::from(options.garbage_level))
            .set_compress(options.compress)
            .set_clean(options.clean)
            .set_incremental(options.incremental);

        self.doc
            .save_with_options(path_str, write_options)
            .map_err(|e| RedactorError::Persistence {
                path: path.to_path_buf(),
                message: "Failed to save PDF".to_string(),
                source: Some(Box::new(e)),
            })
    }

    fn set_metadata(&mut self, metadata: &DocumentMetadata) -> RedactorResult<()> {
        let mut trailer = self
            .doc
            .trailer()
            .map_err(|e| RedactorError::mupdf("Failed to read trailer", e))?;

        let existing = trailer
            .get_dict("Info")
            .map_err(|e| RedactorError::mupdf("Failed to read info dictionary", e))?;

        let mut info = match existing {
            Some(info) => info,
            None => {
                let dict = self
                    .doc
                    .new_dict()
                    .map_err(|e| RedactorError::mupdf("Failed to create info dictionary", e))?;
                let info = self
                    .doc
                    .add_object(&dict)
                    .map_err(|e| RedactorError::mupdf("Failed to add info dictionary", e))?;
                trailer
                    .dict_put("Info", info.clone())
                    .map_err(|e| RedactorError::mupdf("Failed to link info dictionary", e))?;
                info
            }
        };

        for (key, value) in metadata.entries() {
            let value = self
                .doc
                .new_string(value)
                .map_err(|e| RedactorError::mupdf("Failed to encode metadata value", e))?;
            info.dict_put(key, value)
                .map_err(|e| RedactorError::mupdf(format!("Failed to set {key}"), e))?;
        }

        Ok(())
    }

    fn remove_xmp_metadata(&mut self) -> RedactorResult<()> {
        let mut catalog = self
            .doc
            .catalog()
            .map_err(|e| RedactorError::mupdf("Failed to read catalog", e))?;
        catalog
            .dict_delete("Metadata")
            .map_err(|e| RedactorError::mupdf("Failed to drop XMP metadata", e))
    }
}

/// A loaded page plus its PDF view for annotation support.
pub struct MupdfPage {
    index: usize,
    page: Page,
    pdf_page: PdfPage,
    max_hits: u32,
    pending: usize,
}

impl MupdfPage {
    fn page_error(&self, message: &str, source: mupdf::Error) -> RedactorError {
        RedactorError::page(self.index, message, Some(Box::new(source)))
    }

    /// MuPDF's own search. It folds case and stops at the requested hit
    /// count, so a full result is retried with twice the limit.
    fn folded_search(&self, text: &str) -> RedactorResult<Vec<Quad>> {
        let ceiling = SEARCH_HIT_CEILING.max(self.max_hits);
        let mut limit = self.max_hits.max(1);
        loop {
            let hits: Vec<Quad> = self
                .page
                .search(text, limit)
                .map_err(|e| self.page_error("Search failed", e))?
                .into_iter()
                .collect();

            if (hits.len() as u64) < u64::from(limit) {
                return Ok(hits);
            }
            if limit >= ceiling {
                return Err(RedactorError::page(
                    self.index,
                    format!("Search hit limit of {limit} reached"),
                    None,
                ));
            }
            tracing::debug!(page = self.index + 1, limit, "search limit reached, retrying");
            limit = limit.saturating_mul(2).min(ceiling);
        }
    }

    /// Exact-case occurrences, found by scanning the page's text lines.
    ///
    /// Matches never span two text lines. Whitespace in `text` matches any
    /// single whitespace glyph.
    fn exact_search(&self, text: &str) -> RedactorResult<Vec<Region>> {
        let needle: Vec<char> = text.chars().collect();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let text_page = self
            .page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| self.page_error("Text extraction failed", e))?;

        let mut regions = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let glyphs: Vec<(char, Quad)> = line
                    .chars()
                    .filter_map(|ch| ch.char().map(|c| (c, ch.quad())))
                    .collect();

                let mut start = 0;
                while start + needle.len() <= glyphs.len() {
                    let window = &glyphs[start..start + needle.len()];
                    let matched = window.iter().zip(&needle).all(|((c, _), n)| {
                        c == n || (c.is_whitespace() && n.is_whitespace())
                    });
                    if matched {
                        regions.push(bounding_region(window.iter().map(|(_, q)| q)));
                        start += needle.len();
                    } else {
                        start += 1;
                    }
                }
            }
        }

        Ok(regions)
    }

    /// The annotation most recently created on this page. MuPDF appends new
    /// annotations to the end of `/Annots`.
    fn newest_annotation(&self) -> RedactorResult<PdfObject> {
        let missing = || RedactorError::page(self.index, "Redaction annotation not found", None);
        let annots = self
            .pdf_page
            .object()
            .get_dict("Annots")
            .map_err(|e| self.page_error("Failed to read annotations", e))?
            .ok_or_else(missing)?;
        let count = annots
            .len()
            .map_err(|e| self.page_error("Failed to read annotations", e))?;
        let last = count.checked_sub(1).ok_or_else(missing)?;
        annots
            .get_array(last as i32)
            .map_err(|e| self.page_error("Failed to read annotations", e))?
            .ok_or_else(missing)
    }

    /// A PDF array of reals bound to the annotation's document.
    fn number_array(&self, owner: &PdfObject, values: &[f32]) -> RedactorResult<PdfObject> {
        let doc = owner
            .document()
            .ok_or_else(|| RedactorError::page(self.index, "Annotation has no document", None))?;
        let mut array = doc
            .new_array()
            .map_err(|e| self.page_error("Failed to build annotation array", e))?;
        for value in values {
            let number = PdfObject::new_real(*value)
                .map_err(|e| self.page_error("Failed to build annotation array", e))?;
            array
                .array_push(number)
                .map_err(|e| self.page_error("Failed to build annotation array", e))?;
        }
        Ok(array)
    }
}

impl PageHandle for MupdfPage {
    fn search(&self, text: &str, case: CaseSensitivity) -> RedactorResult<Vec<Region>> {
        match case {
            CaseSensitivity::Insensitive => {
                Ok(self.folded_search(text)?.iter().map(quad_to_region).collect())
            }
            CaseSensitivity::Sensitive => self.exact_search(text),
        }
    }

    fn mark_redaction(&mut self, region: Region, fill: FillColor) -> RedactorResult<()> {
        self.pdf_page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(|e| self.page_error("Failed to create redaction annotation", e))?;

        let ctm = self
            .pdf_page
            .ctm()
            .map_err(|e| self.page_error("Failed to read page transform", e))?;
        let user_space = invert(&ctm)
            .map(|inverse| transform_region(&inverse, region))
            .ok_or_else(|| RedactorError::page(self.index, "Page transform is singular", None))?;

        let mut annot = self.newest_annotation()?;
        let rect = self.number_array(&annot, &[
            user_space.x0,
            user_space.y0,
            user_space.x1,
            user_space.y1,
        ])?;
        annot
            .dict_put("Rect", rect)
            .map_err(|e| self.page_error("Failed to set redaction area", e))?;
        let color = self.number_array(&annot, &fill.components())?;
        annot
            .dict_put("IC", color)
            .map_err(|e| self.page_error("Failed to set redaction fill", e))?;

        self.pending += 1;
        Ok(())
    }

    fn apply_marks(&mut self) -> RedactorResult<()> {
        if self.pending == 0 {
            return Ok(());
        }

        self.pdf_page
            .redact()
            .map_err(|e| self.page_error("Failed to apply redactions", e))?;
        self.pending = 0;
        Ok(())
    }
}

/// Bounding rectangle of a (possibly rotated) hit quad.
fn quad_to_region(quad: &Quad) -> Region {
    Region::new(
        quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
        quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
        quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
        quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
    )
}

/// Smallest region covering every quad. Callers pass at least one quad.
fn bounding_region<'a>(quads: impl Iterator<Item = &'a Quad>) -> Region {
    quads
        .map(quad_to_region)
        .reduce(|a, b| {
            Region::new(a.x0.min(b.x0), a.y0.min(b.y0), a.x1.max(b.x1), a.y1.max(b.y1))
        })
        .unwrap_or(Region::new(0.0, 0.0, 0.0, 0.0))
}

/// Inverse of an affine page transform, `None` when it is singular.
fn invert(m: &Matrix) -> Option<Matrix> {
    let det = m.a * m.d - m.b * m.c;
    if det.abs() < f32::EPSILON {
        return None;
    }
    Some(Matrix::new(
        m.d / det,
        -m.b / det,
        -m.c / det,
        m.a / det,
        (m.c * m.f - m.d * m.e) / det,
        (m.b * m.e - m.a * m.f) / det,
    ))
}

/// Bounding box of `region`'s corners under `m`.
fn transform_region(m: &Matrix, region: Region) -> Region {
    let apply = |x: f32, y: f32| (x * m.a + y * m.c + m.e, x * m.b + y * m.d + m.f);
    let corners = [
        apply(region.x0, region.y0),
        apply(region.x1, region.y0),
        apply(region.x0, region.y1),
        apply(region.x1, region.y1),
    ];
    let (mut x0, mut y0) = corners[0];
    let (mut x1, mut y1) = corners[0];
    for (x, y) in &corners[1..] {
        x0 = x0.min(*x);
        y0 = y0.min(*y);
        x1 = x1.max(*x);
        y1 = y1.max(*y);
    }
    Region::new(x0, y0, x1, y1)
}
