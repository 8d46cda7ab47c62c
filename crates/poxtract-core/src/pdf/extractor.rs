//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, trace};

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;

/// PDF text extractor.
///
/// lopdf opens the document (and removes empty-password encryption);
/// pdf-extract lays out the text of each page.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    min_text_length: usize,
}

/// Extracted content from a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Type of PDF content.
    pub pdf_type: PdfType,
    /// Page texts joined with a single space.
    pub text: String,
    /// Pages that were read.
    pub pages: Vec<PdfPage>,
    /// Total pages in the document.
    pub total_pages: u32,
}

/// Content from a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page.
    pub text: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            min_text_length: 0,
        }
    }

    /// Set the minimum amount of text for a document to count as text-based.
    ///
    /// A document without any text is always [`PdfType::Empty`].
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Read up to `max_pages` pages (0 reads all) and join their text with a space.
    pub fn extract_content(&self, max_pages: usize) -> Result<PdfContent> {
        let total_pages = self.page_count();
        if total_pages == 0 {
            return Err(PdfError::NoPages);
        }

        let mut texts = self.extract_pages()?;
        if max_pages > 0 && texts.len() > max_pages {
            trace!("Reading {} of {} pages", max_pages, texts.len());
            texts.truncate(max_pages);
        }

        let pages: Vec<PdfPage> = texts
            .into_iter()
            .enumerate()
            .map(|(idx, text)| PdfPage {
                number: idx as u32 + 1,
                text,
            })
            .collect();

        let text = pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let text_len = text.trim().chars().count();
        let pdf_type = if text_len > 0 && text_len >= self.min_text_length {
            PdfType::Text
        } else {
            PdfType::Empty
        };

        debug!(
            "PDF analysis: {} of {} pages, {} chars text -> {:?}",
            pages.len(),
            total_pages,
            text_len,
            pdf_type
        );

        Ok(PdfContent {
            pdf_type,
            text,
            pages,
            total_pages,
        })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_pages(&self) -> Result<Vec<String>> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_extract_without_document() {
        let extractor = PdfExtractor::new();
        assert!(matches!(extractor.extract_pages(), Err(PdfError::Parse(_))));
        assert!(matches!(extractor.extract_content(3), Err(PdfError::NoPages)));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        let result = extractor.load(b"this is not a pdf");
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_reads_at_most_max_pages() {
        let data = crate::pdf::sample_pdf(&[
            "Purchase Order 4471",
            "Ship To Acme",
            "Terms Net 30",
            "Page four should not be read",
        ]);
        let mut extractor = PdfExtractor::new().with_min_text_length(5);
        extractor.load(&data).unwrap();
        assert_eq!(extractor.page_count(), 4);

        let content = extractor.extract_content(3).unwrap();
        assert_eq!(content.total_pages, 4);
        assert_eq!(content.pages.len(), 3);
        assert_eq!(content.pdf_type, PdfType::Text);
        assert!(content.text.contains("Purchase Order 4471"));
        assert!(!content.text.contains("Page four"));
    }

    #[test]
    fn test_zero_max_pages_reads_everything() {
        let data = crate::pdf::sample_pdf(&["one page", "two page"]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();
        assert_eq!(extractor.extract_content(0).unwrap().pages.len(), 2);
    }

    #[test]
    fn test_short_text_is_still_text() {
        let data = crate::pdf::sample_pdf(&["PO 7"]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        let content = extractor.extract_content(3).unwrap();
        assert_eq!(content.pdf_type, PdfType::Text);
        assert!(content.text.contains("PO 7"));

        let mut strict = PdfExtractor::new().with_min_text_length(20);
        strict.load(&data).unwrap();
        assert_eq!(strict.extract_content(3).unwrap().pdf_type, PdfType::Empty);
    }

    #[test]
    fn test_invalid_page_number() {
        let extractor = PdfExtractor::new();
        // Without a document the page lookup fails before the index is checked.
        assert!(extractor.extract_page_text(0).is_err());
    }
}
