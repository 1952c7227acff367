//! PDF documents, via `lopdf`.

use lopdf::Document;

use super::{BoxError, TextExtractor};

/// Extracts the text layer of every page, in page order.
///
/// Scanned PDFs without a text layer yield little or nothing; they are not
/// routed to OCR.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, BoxError> {
        let doc = Document::load_mem(bytes)?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Ok(String::new());
        }
        Ok(doc.extract_text(&pages)?)
    }
}
