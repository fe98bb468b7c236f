//! Match resolution: where on a page does a term appear?

use crate::domain::NormalizedTerm;
use crate::engine::{CaseSensitivity, PageHandle, Region};
use crate::error::RedactorResult;

/// Search tiers, tried in order. The first tier with any hit wins.
pub const MATCH_TIERS: [CaseSensitivity; 2] =
    [CaseSensitivity::Insensitive, CaseSensitivity::Sensitive];

/// A place on a page where a term's rendered text was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchLocation {
    pub page: usize,
    pub region: Region,
}

/// Resolves terms to locations using literal search only.
#[derive(Debug, Clone, Default)]
pub struct MatchResolver;

impl MatchResolver {
    pub fn new() -> Self {
        Self
    }

    /// Returns every location of `term` on `page`.
    ///
    /// Case-insensitive search runs first; exact-case search only runs when
    /// it comes back empty. Engine failures propagate unchanged.
    pub fn resolve<P: PageHandle + ?Sized>(
        &self,
        page_index: usize,
        page: &P,
        term: &NormalizedTerm,
    ) -> RedactorResult<Vec<MatchLocation>> {
        for case in MATCH_TIERS {
            let regions = page.search(term.as_str(), case)?;
            if !regions.is_empty() {
                tracing::trace!(page = page_index, ?case, hits = regions.len(), "term matched");
                return Ok(regions
                    .into_iter()
                    .map(|region| MatchLocation {
                        page: page_index,
                        region,
                    })
                    .collect());
            }
        }

        Ok(Vec::new())
    }
}
