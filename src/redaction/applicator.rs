//! Page-by-page redaction.
//!
//! Each page goes through search, mark, commit before the next page is
//! touched. All terms are searched before anything on the page is marked, so
//! no commit can shift coordinates under a term that has not been searched.

use super::resolver::{MatchLocation, MatchResolver};
use crate::domain::NormalizedTerm;
use crate::engine::{DocumentHandle, FillColor, PageHandle};
use crate::error::RedactorResult;

/// Counters for one document pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub pages_processed: usize,
    pub pages_modified: usize,
    /// One per committed mark. Telemetry only.
    pub redactions: usize,
}

/// Marks and commits redactions across a document.
#[derive(Debug, Clone, Default)]
pub struct RedactionApplicator {
    resolver: MatchResolver,
    fill: FillColor,
}

impl RedactionApplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redacts every term on one page and commits. Returns the mark count.
    pub fn redact_page<P: PageHandle + ?Sized>(
        &self,
        page_index: usize,
        page: &mut P,
        terms: &[NormalizedTerm],
    ) -> RedactorResult<usize> {
        let mut locations: Vec<MatchLocation> = Vec::new();
        for term in terms {
            locations.extend(self.resolver.resolve(page_index, &*page, term)?);
        }

        for location in &locations {
            page.mark_redaction(location.region, self.fill)?;
        }

        page.apply_marks()?;
        Ok(locations.len())
    }

    /// Redacts every page in order. The first error aborts the whole pass.
    pub fn redact_document<D: DocumentHandle>(
        &self,
        doc: &mut D,
        terms: &[NormalizedTerm],
    ) -> RedactorResult<ApplyReport> {
        let page_count = doc.page_count()?;
        let mut report = ApplyReport {
            pages_processed: page_count,
            ..Default::default()
        };

        for page_index in 0..page_count {
            let mut page = doc.page(page_index)?;
            let marks = self.redact_page(page_index, &mut page, terms)?;
            if marks > 0 {
                report.pages_modified += 1;
                report.redactions += marks;
            }
        }

        Ok(report)
    }
}
