//! Multipart request parsing.

use axum::extract::multipart::{Multipart, MultipartError};

use crate::domain::TermPayload;
use crate::error::{RedactorError, RedactorResult};
use crate::redaction::{FinalizationProfile, RedactionRequest};

/// A parsed `/redact` form.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub document: Vec<u8>,
    pub payloads: Vec<TermPayload>,
    pub profile: FinalizationProfile,
}

impl Upload {
    /// Reads the form fields `file`, `words`, `entities` and `profile`.
    ///
    /// Unknown fields are ignored. `words` is merged before `entities`.
    pub async fn from_multipart(
        mut multipart: Multipart,
        default_profile: FinalizationProfile,
    ) -> RedactorResult<Self> {
        let mut file = None;
        let mut words = None;
        let mut entities = None;
        let mut profile = default_profile;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    file = Some((file_name, bytes.to_vec()));
                }
                Some("words") => words = Some(field.text().await.map_err(multipart_error)?),
                Some("entities") => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    if !raw.trim().is_empty() {
                        entities = Some(TermPayload::entities_from_json(&raw)?);
                    }
                }
                Some("profile") => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    if !raw.trim().is_empty() {
                        profile = raw.parse()?;
                    }
                }
                _ => {}
            }
        }

        let (file_name, document) =
            file.ok_or_else(|| RedactorError::invalid_input("file", "No file provided"))?;
        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(RedactorError::invalid_input("file", "File must be a PDF"));
        }
        if document.is_empty() {
            return Err(RedactorError::invalid_input("file", "Uploaded file is empty"));
        }

        let payloads = words
            .map(TermPayload::Delimited)
            .into_iter()
            .chain(entities)
            .collect();

        Ok(Self {
            file_name,
            document,
            payloads,
            profile,
        })
    }

    /// `redacted_<original name>`, reduced to characters safe in a header.
    pub fn download_name(&self) -> String {
        let base = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let safe: String = base
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
            .collect();
        if safe.trim().is_empty() {
            "redacted_secure.pdf".to_string()
        } else {
            format!("redacted_{}", safe.trim())
        }
    }

    pub fn into_request(self) -> RedactionRequest {
        RedactionRequest {
            document: self.document,
            payloads: self.payloads,
            profile: self.profile,
        }
    }
}

fn multipart_error(err: MultipartError) -> RedactorError {
    RedactorError::invalid_input("multipart", err.body_text())
}
