//! Deterministic backend for tests and dry runs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::{ChatBackend, Result, StructuredRequest};

#[derive(Debug, Clone)]
enum Reply {
    Content(String),
    Failure(String),
}

/// Backend returning a canned reply without any network traffic.
///
/// Clones share the call counter and the captured request.
#[derive(Debug, Clone)]
pub struct MockBackend {
    reply: Reply,
    delay: Option<Duration>,
    call_count: Arc<Mutex<usize>>,
    last_request: Arc<Mutex<Option<StructuredRequest>>>,
}

impl MockBackend {
    /// Always answer with `content`.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_reply(Reply::Content(content.into()))
    }

    /// Always fail with a network error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Failure(message.into()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            call_count: Arc::new(Mutex::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Sleep before answering, to exercise caller timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls so far.
    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|c| *c).unwrap_or(0)
    }

    /// The most recent request seen.
    pub fn last_request(&self) -> Option<StructuredRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(&self, request: &StructuredRequest) -> Result<String> {
        if let Ok(mut count) = self.call_count.lock() {
            *count += 1;
        }
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Content(content) => Ok(content.clone()),
            Reply::Failure(message) => Err(LlmError::Network(message.clone())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;

    fn request() -> StructuredRequest {
        StructuredRequest::new(
            "gpt-4o",
            vec![ChatMessage::system("extract")],
            "text",
            "order",
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn test_mock_returns_content() {
        let backend = MockBackend::new(r#"{"ok":true}"#);
        let content = backend.complete(&request()).await.unwrap();

        assert_eq!(content, r#"{"ok":true}"#);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(
            backend.last_request().unwrap().user_content(),
            Some("text")
        );
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let backend = MockBackend::failing("boom");
        let result = backend.complete(&request()).await;

        assert!(matches!(result, Err(LlmError::Network(_))));
    }

    #[tokio::test]
    async fn test_clones_share_counter() {
        let backend = MockBackend::default();
        let clone = backend.clone();

        clone.complete(&request()).await.unwrap();
        assert_eq!(backend.call_count(), 1);
    }
}
