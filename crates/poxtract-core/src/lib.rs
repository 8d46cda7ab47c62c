//! Core library for purchase order extraction.
//!
//! This crate provides:
//! - PDF text extraction (leading pages only)
//! - Structured extraction of order data through a chat backend
//! - US address cleanup, component tagging and normalization
//! - Email attachment ingestion and record persistence

pub mod address;
pub mod email;
pub mod error;
pub mod extraction;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod sink;

pub use address::{
    AddressLabel, AddressParser, AddressPreprocessor, ComponentTagger, LineDeduplicator,
    TaggedAddress, UsAddressTagger, preprocess_address, token_set_ratio,
};
pub use email::{Attachment, EmailMessage};
pub use error::{
    AddressError, ExtractionError, IngestError, PdfError, PoxtractError, Result, SinkError,
};
#[cfg(feature = "http")]
pub use extraction::backend_from_config;
pub use extraction::{BudgetCheck, StructuredExtractor, TokenBudget, compose};
pub use models::config::PoxtractConfig;
pub use models::order::{
    ExtendedExtractedData, ExtendedOrderInfo, ExtractedData, OrderInfo, OutputRecord,
    ParsedAddress, ProductLineItem, ProductTable,
};
pub use pdf::{PdfContent, PdfExtractor, PdfProcessor, PdfType};
pub use pipeline::{DocumentOutcome, EmailReport, OrderPipeline};
pub use sink::{BlobName, FsSink, RecordSink};

/// Re-export chat backend types.
pub use poxtract_llm::{ChatBackend, LlmError, MockBackend};
