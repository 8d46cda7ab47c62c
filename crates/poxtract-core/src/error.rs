//! Error types for the poxtract-core library.

use thiserror::Error;

/// Main error type for the poxtract library.
#[derive(Error, Debug)]
pub enum PoxtractError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Address could not be tagged unambiguously.
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Structured extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Email message ingestion error.
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Persistence error.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised while turning address text into components.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A component label was applied to two separate parts of the text.
    #[error("ambiguous address: {label} tagged as both '{first}' and '{second}'")]
    Ambiguous {
        label: String,
        first: String,
        second: String,
    },
}

/// Errors from the structured extraction call.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The chat backend failed.
    #[error("backend error: {0}")]
    Backend(#[from] poxtract_llm::LlmError),

    /// The call exceeded its deadline.
    #[error("extraction timed out after {0}s")]
    Timeout(u64),

    /// The answer did not match the schema.
    #[error("response does not match schema: {0}")]
    Schema(String),

    /// The token encoder could not be loaded.
    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),
}

/// Errors reading an email message document.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The message is not valid JSON or misses required fields.
    #[error("invalid message: {0}")]
    Message(String),

    /// An attachment body is not valid base64.
    #[error("invalid attachment '{name}': {reason}")]
    Attachment { name: String, reason: String },
}

/// Errors writing records or queue messages.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The blob name does not have a `<container>/<path>` form.
    #[error("invalid blob name: {0}")]
    BlobName(String),

    /// Record serialization failed.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the poxtract library.
pub type Result<T> = std::result::Result<T, PoxtractError>;
