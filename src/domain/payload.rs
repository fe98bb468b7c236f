//! Caller-facing shapes of a term list.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{RedactorError, RedactorResult};

/// Keys checked, in order, for the text of an entity record.
pub const ENTITY_TEXT_KEYS: [&str; 4] = ["text", "entity", "word", "value"];

/// Raw term source as received at the request boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum TermPayload {
    /// A single string of terms separated by the normalizer's delimiter.
    Delimited(String),

    /// Already-resolved entities, e.g. from a client-side NER pass.
    Entities(Vec<EntityItem>),
}

/// One element of an entity list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EntityItem {
    /// Bare string entity.
    Plain(String),

    /// Record with the text under one of [`ENTITY_TEXT_KEYS`].
    Record(Map<String, Value>),
}

impl EntityItem {
    /// Returns the entity's text, if it has any.
    ///
    /// Records without a string value under a recognized key yield `None`.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Plain(text) => Some(text),
            Self::Record(fields) => ENTITY_TEXT_KEYS
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str)),
        }
    }
}

impl TermPayload {
    /// Parses a JSON entity list.
    ///
    /// Anything other than an array of strings and objects is rejected.
    pub fn entities_from_json(raw: &str) -> RedactorResult<Self> {
        serde_json::from_str::<Vec<EntityItem>>(raw)
            .map(Self::Entities)
            .map_err(|e| {
                RedactorError::invalid_input("entities", format!("malformed entity payload: {e}"))
            })
    }
}
