//! Custom assertions for redaction output.

use std::path::Path;

/// Asserts that `term` no longer appears in the extracted text.
///
/// # Panics
/// Panics if the term is still present.
pub fn assert_redacted(pdf_path: &Path, term: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        !text.contains(term),
        "Term '{}' should be redacted but was found in output PDF at '{}'.\nExtracted text length: {} chars",
        term,
        pdf_path.display(),
        text.len()
    );
}

/// Asserts that `text` survived redaction.
///
/// # Panics
/// Panics if the text is missing.
pub fn assert_preserved(pdf_path: &Path, text: &str) {
    let extracted = extract_text_or_panic(pdf_path);
    assert!(
        extracted.contains(text),
        "Text '{}' should be preserved but was not found in PDF at '{}'",
        text,
        pdf_path.display()
    );
}

/// Asserts that the file loads as a PDF with `pages` pages.
pub fn assert_valid_pdf(pdf_path: &Path, pages: usize) {
    let doc = lopdf::Document::load(pdf_path)
        .unwrap_or_else(|e| panic!("'{}' is not a loadable PDF: {}", pdf_path.display(), e));
    assert_eq!(doc.get_pages().len(), pages, "page count changed");
}

/// Reads one entry of the trailer's Info dictionary as lossy UTF-8.
pub fn info_entry(pdf_path: &Path, key: &str) -> Option<String> {
    let doc = lopdf::Document::load(pdf_path).ok()?;
    let info = match doc.trailer.get(b"Info").ok()? {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match info.as_dict().ok()?.get(key.as_bytes()).ok()? {
        lopdf::Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

fn extract_text_or_panic(pdf_path: &Path) -> String {
    ztredact::extract_text_from_pdf(pdf_path)
        .unwrap_or_else(|e| panic!("Failed to extract text from PDF '{}': {}", pdf_path.display(), e))
}
