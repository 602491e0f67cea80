//! PDF text extraction.
//!
//! `pdf-extract` separates pages with form feeds (`\f`), which gives the
//! page count without a second parse.

use anyhow::{anyhow, Result};

/// Extracted PDF text plus its page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub text: String,
    pub pages: usize,
}

/// Extract UTF-8 text from PDF bytes.
pub fn extract_pdf(bytes: &[u8]) -> Result<PdfText> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| anyhow!("PDF extraction failed: {}", e))?;
    let pages = count_pages(&text);
    Ok(PdfText { text, pages })
}

/// Form-feed count plus one; `0` for empty text.
pub fn count_pages(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.matches('\u{c}').count() + 1
    }
}
