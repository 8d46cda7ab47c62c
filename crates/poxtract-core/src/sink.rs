//! Persistence of attachments, records and queue messages.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::SinkError;
use crate::models::order::OutputRecord;

/// The name of the blob that triggered processing: `<container>/<path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobName {
    container: String,
    path: String,
}

impl BlobName {
    pub fn parse(name: &str) -> Result<Self, SinkError> {
        let trimmed = name.trim().trim_start_matches('/');
        let (container, path) = trimmed
            .split_once('/')
            .ok_or_else(|| SinkError::BlobName(name.to_string()))?;

        let path = path.trim_matches('/');
        let valid = |s: &str| !s.is_empty() && s.split('/').all(|part| part != ".." && part != ".");
        if !valid(container) || !valid(path) {
            return Err(SinkError::BlobName(name.to_string()));
        }

        Ok(Self {
            container: container.to_string(),
            path: path.to_string(),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `<container>/attachments/<path>/<filename>`
    pub fn attachment_key(&self, filename: &str) -> String {
        format!(
            "{}/attachments/{}/{}",
            self.container,
            self.path,
            base_name(filename)
        )
    }

    /// `<container>/json_output/<path>/<stem>_extract.json`
    pub fn record_key(&self, filename: &str) -> String {
        let base = base_name(filename);
        let stem = Path::new(base)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(base);
        format!(
            "{}/json_output/{}/{}_extract.json",
            self.container, self.path, stem
        )
    }
}

/// Last path component of an attachment name.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(filename)
}

/// Destination for everything one trigger produces.
pub trait RecordSink {
    /// Store an attachment copy. Returns its key.
    fn store_attachment(
        &self,
        blob: &BlobName,
        filename: &str,
        content: &[u8],
    ) -> Result<String, SinkError>;

    /// Store an extraction record. Returns its key.
    fn store_record(&self, blob: &BlobName, record: &OutputRecord) -> Result<String, SinkError>;

    /// Publish a record to the processing queue.
    fn enqueue(&self, record: &OutputRecord) -> Result<(), SinkError>;
}

/// Sink writing blobs as files under a root directory.
///
/// Keys map to relative paths. The queue is a file named `<queue>.queue`
/// holding one base64-encoded record per line.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
    queue_name: String,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>, queue_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            queue_name: queue_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn queue_path(&self) -> PathBuf {
        self.root.join(format!("{}.queue", self.queue_name))
    }

    fn write_blob(&self, key: &str, content: &[u8]) -> Result<PathBuf, SinkError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }
}

impl RecordSink for FsSink {
    fn store_attachment(
        &self,
        blob: &BlobName,
        filename: &str,
        content: &[u8],
    ) -> Result<String, SinkError> {
        let key = blob.attachment_key(filename);
        self.write_blob(&key, content)?;
        info!("Stored PDF attachment: {}", key);
        Ok(key)
    }

    fn store_record(&self, blob: &BlobName, record: &OutputRecord) -> Result<String, SinkError> {
        let key = blob.record_key(&record.input_blob_name);
        let json = record.to_json()?;
        self.write_blob(&key, json.as_bytes())?;
        info!("Stored extraction record: {}", key);
        Ok(key)
    }

    fn enqueue(&self, record: &OutputRecord) -> Result<(), SinkError> {
        let json = record.to_json()?;
        let message = STANDARD.encode(json.as_bytes());

        fs::create_dir_all(&self.root)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.queue_path())?;
        writeln!(file, "{}", message)?;

        info!("Sent message to queue {}", self.queue_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::ExtendedExtractedData;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blob_name() {
        let blob = BlobName::parse("repeat-orders-emails/msg-body/2024/abc.json").unwrap();
        assert_eq!(blob.container(), "repeat-orders-emails");
        assert_eq!(blob.path(), "msg-body/2024/abc.json");
    }

    #[test]
    fn test_invalid_blob_names() {
        for name in ["", "no-slash", "container/", "/path-only", "c/../etc"] {
            assert!(BlobName::parse(name).is_err(), "{:?}", name);
        }
    }

    #[test]
    fn test_routing_keys() {
        let blob = BlobName::parse("orders/msg-body/abc.json").unwrap();
        assert_eq!(
            blob.attachment_key("PO-4471.pdf"),
            "orders/attachments/msg-body/abc.json/PO-4471.pdf"
        );
        assert_eq!(
            blob.record_key("PO-4471.pdf"),
            "orders/json_output/msg-body/abc.json/PO-4471_extract.json"
        );
        assert_eq!(
            blob.record_key("scans/PO.v2.pdf"),
            "orders/json_output/msg-body/abc.json/PO.v2_extract.json"
        );
    }

    #[test]
    fn test_fs_sink_writes_blobs_and_queue() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsSink::new(dir.path(), "order-processing-queue");
        let blob = BlobName::parse("orders/msg-body/abc.json").unwrap();

        let key = sink.store_attachment(&blob, "PO.pdf", b"%PDF-1.4").unwrap();
        assert_eq!(fs::read(dir.path().join(&key)).unwrap(), b"%PDF-1.4");

        let record = OutputRecord::new(ExtendedExtractedData::default(), "PO.pdf");
        let key = sink.store_record(&blob, &record).unwrap();
        let stored: OutputRecord =
            serde_json::from_slice(&fs::read(dir.path().join(&key)).unwrap()).unwrap();
        assert_eq!(stored, record);

        sink.enqueue(&record).unwrap();
        sink.enqueue(&record).unwrap();
        let queue = fs::read_to_string(sink.queue_path()).unwrap();
        let lines: Vec<&str> = queue.lines().collect();
        assert_eq!(lines.len(), 2);

        let decoded = STANDARD.decode(lines[0]).unwrap();
        let message: OutputRecord = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(message.input_blob_name, "PO.pdf");
    }
}
