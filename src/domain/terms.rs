//! Term normalization.
//!
//! Normalization trims, collapses internal whitespace to single spaces and
//! drops empties. Case is preserved; case-folding is the match resolver's job.

use std::collections::HashSet;
use std::fmt;

use super::payload::TermPayload;
use crate::error::{RedactorError, RedactorResult};

/// A non-empty, whitespace-normalized redaction target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedTerm(String);

impl NormalizedTerm {
    /// Normalizes `raw`, returning `None` when nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            None
        } else {
            Some(Self(collapsed))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NormalizedTerm {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves caller payloads into the canonical term sequence.
#[derive(Debug, Clone)]
pub struct TermNormalizer {
    delimiter: char,
}

impl TermNormalizer {
    /// Creates a normalizer splitting delimited payloads on commas.
    pub fn new() -> Self {
        Self { delimiter: ',' }
    }

    /// Sets the delimiter used for [`TermPayload::Delimited`].
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Normalizes every payload in order into one term list.
    ///
    /// Exact duplicates (after normalization) keep their first position.
    /// Fails with a validation error when no term survives.
    pub fn normalize(&self, payloads: &[TermPayload]) -> RedactorResult<Vec<NormalizedTerm>> {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();

        for payload in payloads {
            let raw: Vec<&str> = match payload {
                TermPayload::Delimited(text) => text.split(self.delimiter).collect(),
                TermPayload::Entities(items) => items.iter().filter_map(|i| i.text()).collect(),
            };

            for term in raw.into_iter().filter_map(NormalizedTerm::new) {
                if seen.insert(term.clone()) {
                    terms.push(term);
                }
            }
        }

        if terms.is_empty() {
            return Err(RedactorError::invalid_input("words", "No words to redact"));
        }

        Ok(terms)
    }
}

impl Default for TermNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
