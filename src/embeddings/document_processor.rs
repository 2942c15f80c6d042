// PDF text extraction and document metadata

use std::path::Path;

use lopdf::Document;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{AppError, AppResult};
use crate::utils::truncate_with_ellipsis;

/// Characters of first-page text shown in the upload preview
pub const PREVIEW_CHARS: usize = 200;

/// Extracted text of one PDF page (1-based page number)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

/// Page count and first-page preview shown after upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfMetadata {
    pub page_count: usize,
    pub first_page_preview: Option<String>,
}

/// Reads a PDF into per-page text
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

impl PdfReader {
    pub fn read_path(&self, path: &Path) -> AppResult<Vec<PageText>> {
        let doc = Document::load(path)
            .map_err(|e| AppError::Pdf(format!("{}: {}", path.display(), e)))?;
        Ok(Self::pages(&doc))
    }

    pub fn read_bytes(&self, bytes: &[u8]) -> AppResult<Vec<PageText>> {
        let doc = Document::load_mem(bytes).map_err(|e| AppError::Pdf(e.to_string()))?;
        Ok(Self::pages(&doc))
    }

    fn pages(doc: &Document) -> Vec<PageText> {
        doc.get_pages()
            .keys()
            .map(|&page| {
                // A page with an unsupported font still counts; it just has no text.
                let text = doc.extract_text(&[page]).unwrap_or_else(|e| {
                    warn!(page, error = %e, "Could not extract page text");
                    String::new()
                });
                PageText { page, text }
            })
            .collect()
    }
}

/// Quick header sniff; the `%PDF-` marker may follow a little leading junk
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

/// Page count plus a preview of the first page, truncated to [`PREVIEW_CHARS`]
pub fn inspect_pdf(bytes: &[u8]) -> AppResult<PdfMetadata> {
    let pages = PdfReader.read_bytes(bytes)?;
    debug!(page_count = pages.len(), "Inspected PDF");

    let first_page_preview = pages
        .first()
        .map(|p| preview_text(&p.text));

    Ok(PdfMetadata {
        page_count: pages.len(),
        first_page_preview,
    })
}

pub fn preview_text(text: &str) -> String {
    truncate_with_ellipsis(text, PREVIEW_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::build_pdf;

    #[test]
    fn test_preview_truncates_long_text() {
        let text = "x".repeat(450);
        let preview = preview_text(&text);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert!(preview.starts_with(&"x".repeat(PREVIEW_CHARS)));
    }

    #[test]
    fn test_preview_keeps_short_text() {
        assert_eq!(preview_text("Master Services Agreement"), "Master Services Agreement");
        let exact = "y".repeat(PREVIEW_CHARS);
        assert_eq!(preview_text(&exact), exact);
    }

    #[test]
    fn test_looks_like_pdf() {
        assert!(looks_like_pdf(b"%PDF-1.5\n..."));
        assert!(looks_like_pdf(b"\n\n%PDF-1.7"));
        assert!(!looks_like_pdf(b"PK\x03\x04 not a pdf"));
        assert!(!looks_like_pdf(b""));
    }

    #[test]
    fn test_inspect_two_page_pdf() {
        let bytes = build_pdf(&[
            &["SERVICES AGREEMENT", "This agreement is made between Acme and Beta."],
            &["Termination", "Either party may terminate with notice."],
        ]);
        let meta = inspect_pdf(&bytes).unwrap();
        assert_eq!(meta.page_count, 2);
        let preview = meta.first_page_preview.unwrap();
        assert!(preview.contains("SERVICES AGREEMENT"));
    }

    #[test]
    fn test_read_bytes_yields_text_per_page() {
        let bytes = build_pdf(&[&["Page one liability clause"], &["Page two indemnity clause"]]);
        let pages = PdfReader.read_bytes(&bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 1);
        assert!(pages[0].text.contains("liability"));
        assert!(pages[1].text.contains("indemnity"));
    }

    #[test]
    fn test_garbage_is_a_pdf_error() {
        let err = inspect_pdf(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, AppError::Pdf(_)));
    }
}
