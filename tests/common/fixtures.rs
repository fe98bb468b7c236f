//! Test fixtures and PDF builders.

use anyhow::Result;
use printpdf::*;

const LINE_HEIGHT_MM: f32 = 10.0;

/// Builder for multi-page test PDFs with one text line per call.
///
/// # Example
///
/// ```no_run
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let bytes = TestPdfBuilder::new()
///     .with_title("Statement")
///     .line("Dear John Smith,")
///     .page()
///     .line("Reference 555-1234")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: vec![Vec::new()],
            page_width: Mm(210.0),
            page_height: Mm(297.0),
        }
    }

    /// Sets the Info dictionary title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Appends a line of text to the current page.
    pub fn line(mut self, text: &str) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(text.to_string());
        }
        self
    }

    /// Starts a new page.
    pub fn page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Renders the document and returns its bytes.
    pub fn build(self) -> Result<Vec<u8>> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        for (index, lines) in self.pages.iter().enumerate() {
            let (page, layer) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(self.page_width, self.page_height, "Layer 1")
            };
            let layer = doc.get_page(page).get_layer(layer);
            for (row, text) in lines.iter().enumerate() {
                let y = Mm(270.0 - row as f32 * LINE_HEIGHT_MM);
                layer.use_text(text.as_str(), 14.0, Mm(20.0), y, &font);
            }
        }

        Ok(doc.save_to_bytes()?)
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Two pages: a name on the first, a phone number on the second.
pub fn two_page_letter() -> Result<Vec<u8>> {
    TestPdfBuilder::new()
        .with_title("Customer Letter")
        .line("Dear John Smith,")
        .line("Your statement is attached.")
        .page()
        .line("Questions? Call 555-1234 today.")
        .build()
}
