//! Text-only engine for unit tests.
//!
//! A page is a line of characters; a region spans `x0..x1` character
//! offsets. Applying marks overwrites the covered characters with `#`.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{
    CaseSensitivity, DocumentHandle, DocumentMetadata, FillColor, PageHandle, PdfEngine, Region,
    SaveOptions,
};
use crate::error::{RedactorError, RedactorResult};

pub(crate) const MAGIC: &str = "%FAKE\n";

#[derive(Debug, Default)]
pub(crate) struct FakeEngine;

impl PdfEngine for FakeEngine {
    type Document = FakeDocument;

    fn name(&self) -> &str {
        "fake"
    }

    fn open(&self, bytes: &[u8]) -> RedactorResult<FakeDocument> {
        let text = std::str::from_utf8(bytes)
            .ok()
            .and_then(|t| t.strip_prefix(MAGIC))
            .ok_or_else(|| RedactorError::PdfProcessing {
                message: "not a fake document".to_string(),
                page: None,
                source: None,
            })?;
        let body = text.split("\n%META").next().unwrap_or_default();
        Ok(FakeDocument::new(&body.split('\u{c}').collect::<Vec<_>>()))
    }
}

/// Artifact names present in a directory, captured at each save.
pub(crate) type SaveSnapshots = Arc<Mutex<Vec<Vec<String>>>>;

/// [`FakeEngine`] whose documents list `dir` every time they are saved.
#[derive(Debug, Clone)]
pub(crate) struct SnapshotEngine {
    pub dir: PathBuf,
    pub snapshots: SaveSnapshots,
}

impl SnapshotEngine {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            snapshots: SaveSnapshots::default(),
        }
    }
}

impl PdfEngine for SnapshotEngine {
    type Document = FakeDocument;

    fn name(&self) -> &str {
        "fake-snapshot"
    }

    fn open(&self, bytes: &[u8]) -> RedactorResult<FakeDocument> {
        let mut doc = FakeEngine.open(bytes)?;
        doc.snapshot = Some((self.dir.clone(), Arc::clone(&self.snapshots)));
        Ok(doc)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDocument {
    pub pages: Vec<Vec<char>>,
    pub metadata: Option<DocumentMetadata>,
    pub case_insensitive: bool,
    pub fail_search_on: Option<usize>,
    pub events: RefCell<Vec<String>>,
    pub snapshot: Option<(PathBuf, SaveSnapshots)>,
}

impl FakeDocument {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.chars().collect()).collect(),
            case_insensitive: true,
            ..Default::default()
        }
    }

    pub fn text(&self, page: usize) -> String {
        self.pages[page].iter().collect()
    }

    pub fn serialize(&self) -> String {
        let pages: Vec<String> = (0..self.pages.len()).map(|i| self.text(i)).collect();
        let mut out = format!("{MAGIC}{}", pages.join("\u{c}"));
        if let Some(meta) = &self.metadata {
            out.push_str(&format!("\n%META {}", meta.title));
        }
        out
    }
}

pub(crate) struct FakePage<'a> {
    index: usize,
    chars: &'a mut Vec<char>,
    case_insensitive: bool,
    fail: bool,
    marks: Vec<Region>,
    events: &'a RefCell<Vec<String>>,
}

impl PageHandle for FakePage<'_> {
    fn search(&self, text: &str, case: CaseSensitivity) -> RedactorResult<Vec<Region>> {
        self.events
            .borrow_mut()
            .push(format!("search:{}:{:?}", self.index, case));
        if self.fail {
            return Err(RedactorError::page(self.index, "corrupt page", None));
        }
        if case == CaseSensitivity::Insensitive && !self.case_insensitive {
            return Ok(Vec::new());
        }

        let needle: Vec<char> = text.chars().collect();
        let eq = |a: &char, b: &char| match case {
            CaseSensitivity::Sensitive => a == b,
            CaseSensitivity::Insensitive => a.to_lowercase().eq(b.to_lowercase()),
        };

        let mut hits = Vec::new();
        let mut start = 0;
        while start + needle.len() <= self.chars.len() {
            let window = &self.chars[start..start + needle.len()];
            if window.iter().zip(&needle).all(|(a, b)| eq(a, b)) {
                hits.push(Region::new(start as f32, 0.0, (start + needle.len()) as f32, 1.0));
                start += needle.len();
            } else {
                start += 1;
            }
        }
        Ok(hits)
    }

    fn mark_redaction(&mut self, region: Region, _fill: FillColor) -> RedactorResult<()> {
        self.events.borrow_mut().push(format!("mark:{}", self.index));
        self.marks.push(region);
        Ok(())
    }

    fn apply_marks(&mut self) -> RedactorResult<()> {
        self.events.borrow_mut().push(format!("apply:{}", self.index));
        for region in self.marks.drain(..) {
            for c in &mut self.chars[region.x0 as usize..region.x1 as usize] {
                *c = '#';
            }
        }
        Ok(())
    }
}

impl DocumentHandle for FakeDocument {
    type Page<'a> = FakePage<'a>;

    fn page_count(&self) -> RedactorResult<usize> {
        Ok(self.pages.len())
    }

    fn page(&mut self, index: usize) -> RedactorResult<FakePage<'_>> {
        let fail = self.fail_search_on == Some(index);
        let case_insensitive = self.case_insensitive;
        let chars = self
            .pages
            .get_mut(index)
            .ok_or_else(|| RedactorError::page(index, "no such page", None))?;
        Ok(FakePage {
            index,
            chars,
            case_insensitive,
            fail,
            marks: Vec::new(),
            events: &self.events,
        })
    }

    fn save(&mut self, path: &Path, options: &SaveOptions) -> RedactorResult<()> {
        self.events
            .borrow_mut()
            .push(format!("save:incremental={}", options.incremental));
        if let Some((dir, snapshots)) = &self.snapshot {
            let mut names: Vec<String> = std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .filter_map(|e| e.file_name().into_string().ok())
                        .collect()
                })
                .unwrap_or_default();
            names.sort();
            snapshots.lock().unwrap().push(names);
        }
        std::fs::write(path, self.serialize()).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn set_metadata(&mut self, metadata: &DocumentMetadata) -> RedactorResult<()> {
        self.events.borrow_mut().push("metadata".to_string());
        self.metadata = Some(metadata.clone());
        Ok(())
    }

    fn remove_xmp_metadata(&mut self) -> RedactorResult<()> {
        self.events.borrow_mut().push("drop_xmp".to_string());
        Ok(())
    }
}
