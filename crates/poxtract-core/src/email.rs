//! Email message documents with base64 attachments.
//!
//! A message is the JSON body of an email as exported by a mail connector:
//! an `attachments` array whose items carry a `name` and a base64
//! `contentBytes` field. Other fields are ignored.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::IngestError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttachment {
    name: String,
    #[serde(default)]
    content_bytes: Option<String>,
}

/// A parsed email message.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailMessage {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

/// A decoded attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn is_pdf(&self) -> bool {
        is_pdf_name(&self.name)
    }
}

fn is_pdf_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

impl EmailMessage {
    /// Parse a message from raw JSON bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, IngestError> {
        serde_json::from_slice(data).map_err(|e| IngestError::Message(e.to_string()))
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Names of all attachments, in message order.
    pub fn attachment_names(&self) -> impl Iterator<Item = &str> {
        self.attachments.iter().map(|a| a.name.as_str())
    }

    /// Decode the PDF attachments. Other attachments are skipped.
    pub fn pdf_attachments(&self) -> Result<Vec<Attachment>, IngestError> {
        let mut pdfs = Vec::new();

        for raw in &self.attachments {
            if !is_pdf_name(&raw.name) {
                info!("Skipping non-PDF attachment: {}", raw.name);
                continue;
            }

            let encoded = raw.content_bytes.as_deref().ok_or_else(|| IngestError::Attachment {
                name: raw.name.clone(),
                reason: "missing contentBytes".to_string(),
            })?;

            let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
            let content = STANDARD
                .decode(compact)
                .map_err(|e| IngestError::Attachment {
                    name: raw.name.clone(),
                    reason: e.to_string(),
                })?;

            debug!("Decoded attachment {} ({} bytes)", raw.name, content.len());
            pdfs.push(Attachment {
                name: raw.name.clone(),
                content,
            });
        }

        Ok(pdfs)
    }
}
