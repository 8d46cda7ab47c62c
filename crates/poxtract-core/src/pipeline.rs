//! End-to-end processing of purchase order documents.

use std::sync::Arc;

use poxtract_llm::ChatBackend;
use tracing::{error, info, warn};

use crate::address::AddressParser;
use crate::email::EmailMessage;
use crate::error::{AddressError, PdfError, Result};
use crate::extraction::{BudgetCheck, StructuredExtractor, TokenBudget, compose};
use crate::models::config::PoxtractConfig;
use crate::models::order::OutputRecord;
use crate::pdf::{PdfContent, PdfExtractor, PdfProcessor, PdfType};
use crate::sink::{BlobName, RecordSink};

/// What happened to one document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// A record was produced.
    Extracted(Box<OutputRecord>),
    /// The text was longer than the token limit; nothing was extracted.
    OverTokenLimit { tokens: usize, limit: usize },
    /// The PDF has no usable text layer.
    NoText,
    /// An address could not be tagged unambiguously; no record was produced.
    AmbiguousAddress(AddressError),
}

impl DocumentOutcome {
    pub fn record(&self) -> Option<&OutputRecord> {
        match self {
            DocumentOutcome::Extracted(record) => Some(record.as_ref()),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<OutputRecord> {
        match self {
            DocumentOutcome::Extracted(record) => Some(*record),
            _ => None,
        }
    }
}

/// Summary of one email message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailReport {
    /// Subject line of the message, when present.
    pub subject: Option<String>,
    /// All attachments in the message.
    pub attachments: usize,
    /// Attachments with a `.pdf` name.
    pub pdf_attachments: usize,
    /// Keys of the records written.
    pub records: Vec<String>,
    /// PDFs read successfully but producing no record.
    pub skipped: usize,
    /// PDFs that could not be read, or whose output could not be stored.
    pub failed: usize,
}

/// Runs the stages for one document: text, token gate, extraction, addresses.
pub struct OrderPipeline {
    extractor: StructuredExtractor,
    budget: TokenBudget,
    parser: AddressParser,
    max_pages: usize,
    min_text_length: usize,
}

impl OrderPipeline {
    pub fn new(extractor: StructuredExtractor, budget: TokenBudget, parser: AddressParser) -> Self {
        Self {
            extractor,
            budget,
            parser,
            max_pages: 3,
            min_text_length: 0,
        }
    }

    /// Build a pipeline from configuration and a chat backend.
    pub fn from_config(config: &PoxtractConfig, backend: Arc<dyn ChatBackend>) -> Result<Self> {
        let extractor = StructuredExtractor::from_config(backend, &config.llm, &config.extraction);
        let budget = TokenBudget::new(config.extraction.token_limit)?;
        let parser = AddressParser::default().with_dedup_threshold(config.address.dedup_threshold);

        Ok(Self::new(extractor, budget, parser)
            .with_page_limit(config.pdf.max_pages)
            .with_min_text_length(config.pdf.min_text_length))
    }

    /// Pages read from each PDF (0 reads all).
    pub fn with_page_limit(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Open a PDF and read the leading pages.
    pub fn read_pdf(&self, data: &[u8]) -> std::result::Result<PdfContent, PdfError> {
        let mut extractor = PdfExtractor::new().with_min_text_length(self.min_text_length);
        extractor.load(data)?;
        extractor.extract_content(self.max_pages)
    }

    /// Process document text that has already been extracted.
    pub async fn process_text(&self, text: &str, input_name: &str) -> DocumentOutcome {
        match self.budget.check(text) {
            BudgetCheck::Exceeded(tokens) => {
                warn!(
                    "Too many tokens in {}: {} > {}. No results extracted.",
                    input_name,
                    tokens,
                    self.budget.limit()
                );
                return DocumentOutcome::OverTokenLimit {
                    tokens,
                    limit: self.budget.limit(),
                };
            }
            BudgetCheck::Within(tokens) => {
                info!("Number of tokens in {}: {}", input_name, tokens);
            }
        }

        let data = self.extractor.extract(text).await;

        match compose(data, &self.parser) {
            Ok(extended) => {
                info!("Extracted order data from {}", input_name);
                DocumentOutcome::Extracted(Box::new(OutputRecord::new(extended, input_name)))
            }
            Err(e) => {
                error!("Address parsing failed for {}: {}", input_name, e);
                DocumentOutcome::AmbiguousAddress(e)
            }
        }
    }

    /// Process PDF text read by [`read_pdf`](Self::read_pdf).
    pub async fn process_content(&self, content: &PdfContent, input_name: &str) -> DocumentOutcome {
        if content.pdf_type == PdfType::Empty {
            warn!("No extractable text in {}", input_name);
            return DocumentOutcome::NoText;
        }
        self.process_text(&content.text, input_name).await
    }

    /// Read and process one PDF.
    pub async fn process_pdf(
        &self,
        data: &[u8],
        input_name: &str,
    ) -> std::result::Result<DocumentOutcome, PdfError> {
        let content = self.read_pdf(data)?;
        Ok(self.process_content(&content, input_name).await)
    }

    /// Handle one email message: copy, extract and publish each PDF attachment.
    ///
    /// `blob_name` is the `<container>/<path>` name of the message and decides
    /// where outputs are stored. A PDF that cannot be read, or whose outputs
    /// cannot be stored, is logged and counted; the other attachments still run.
    pub async fn handle_email<S: RecordSink + ?Sized>(
        &self,
        message: &[u8],
        blob_name: &str,
        sink: &S,
    ) -> Result<EmailReport> {
        let blob = BlobName::parse(blob_name)?;
        let email = EmailMessage::from_slice(message)?;
        info!(
            "Loaded email message {} (subject: {})",
            blob_name,
            email.subject().unwrap_or("<none>")
        );

        let attachments = email.pdf_attachments()?;
        let mut report = EmailReport {
            subject: email.subject().map(str::to_string),
            attachments: email.attachment_names().count(),
            pdf_attachments: attachments.len(),
            ..Default::default()
        };

        for attachment in attachments {
            let name = attachment.name.as_str();
            let content = match self.read_pdf(&attachment.content) {
                Ok(content) => content,
                Err(e) => {
                    error!("Error processing PDF {}: {}", name, e);
                    report.failed += 1;
                    continue;
                }
            };
            info!("Opened PDF document {} ({} pages)", name, content.total_pages);

            let mut stored = true;
            if let Err(e) = sink.store_attachment(&blob, name, &attachment.content) {
                error!("Error uploading PDF attachment {}: {}", name, e);
                stored = false;
            }

            let Some(record) = self.process_content(&content, name).await.into_record() else {
                report.skipped += 1;
                continue;
            };

            match sink.store_record(&blob, &record) {
                Ok(key) => report.records.push(key),
                Err(e) => {
                    error!("Error uploading JSON for {}: {}", name, e);
                    stored = false;
                }
            }
            if let Err(e) = sink.enqueue(&record) {
                error!("Error sending message to the queue: {}", e);
                stored = false;
            }

            if !stored {
                report.failed += 1;
            }
        }

        info!(
            "Processed {}: {} PDF attachments, {} records",
            blob_name,
            report.pdf_attachments,
            report.records.len()
        );
        Ok(report)
    }
}
