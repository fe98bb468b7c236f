//! Domain models for redaction requests.
//!
//! Callers describe what to redact in one of two shapes (a delimited word
//! string or a list of entity records). Both are resolved here, once, into
//! the canonical [`NormalizedTerm`] sequence the rest of the pipeline uses.

pub mod payload;
pub mod terms;

pub use payload::{EntityItem, TermPayload, ENTITY_TEXT_KEYS};
pub use terms::{NormalizedTerm, TermNormalizer};
