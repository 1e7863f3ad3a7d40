use super::{ChatBackend, OutgoingTurn, SimplifyService, UploadedDocument};
use crate::attachment::SelectedFile;
use crate::models::{ClientMode, SimplifiedResult};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted outcome for one mocked call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Ok(String),
    Fail { status: u16, message: String },
    Malformed,
}

impl MockReply {
    fn into_result(self) -> Result<String> {
        match self {
            MockReply::Ok(text) => Ok(text),
            MockReply::Fail { status, message } => Err(Error::Backend { status, message }),
            MockReply::Malformed => Err(Error::MalformedResponse("missing content".to_string())),
        }
    }
}

#[derive(Clone)]
pub struct MockChatBackend {
    mode: ClientMode,
    replies: Arc<Mutex<Vec<MockReply>>>,
    uploads: Arc<Mutex<Vec<MockReply>>>,
    sent: Arc<Mutex<Vec<OutgoingTurn>>>,
    call_count: Arc<Mutex<usize>>,
    upload_count: Arc<Mutex<usize>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockChatBackend {
    pub fn new(mode: ClientMode) -> Self {
        Self {
            mode,
            replies: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            upload_count: Arc::new(Mutex::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push(MockReply::Ok(reply.into()));
        self
    }

    pub fn with_failure(self, status: u16, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push(MockReply::Fail {
            status,
            message: message.into(),
        });
        self
    }

    pub fn with_malformed_reply(self) -> Self {
        self.replies.lock().unwrap().push(MockReply::Malformed);
        self
    }

    /// Queue an upload outcome; `Ok` carries the extracted text.
    pub fn with_upload(self, reply: MockReply) -> Self {
        self.uploads.lock().unwrap().push(reply);
        self
    }

    /// Hold every call for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    /// Highest number of `send` calls observed running at once.
    pub fn max_concurrent_sends(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn sent_turns(&self) -> Vec<OutgoingTurn> {
        self.sent.lock().unwrap().clone()
    }

    fn next(queue: &Mutex<Vec<MockReply>>, count: usize) -> Option<MockReply> {
        let queue = queue.lock().unwrap();
        if queue.is_empty() {
            None
        } else {
            Some(queue[(count - 1) % queue.len()].clone())
        }
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    fn mode(&self) -> ClientMode {
        self.mode
    }

    async fn send(&self, turn: &OutgoingTurn) -> Result<String> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.sent.lock().unwrap().push(turn.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match Self::next(&self.replies, count) {
            Some(reply) => reply.into_result(),
            None => Ok(format!("Mock reply to: {}", turn.prompt)),
        }
    }

    async fn upload(&self, file: &SelectedFile) -> Result<UploadedDocument> {
        let count = {
            let mut count = self.upload_count.lock().unwrap();
            *count += 1;
            *count
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let extracted_text = match Self::next(&self.uploads, count) {
            Some(reply) => reply.into_result()?,
            None => format!("Extracted text of {}", file.name),
        };

        Ok(UploadedDocument {
            display_name: file.name.clone(),
            extracted_text,
        })
    }
}

#[derive(Clone, Default)]
pub struct MockSimplifyClient {
    results: Arc<Mutex<Vec<SimplifiedResult>>>,
    failure: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockSimplifyClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(self, result: SimplifiedResult) -> Self {
        self.results.lock().unwrap().push(result);
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(message.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl SimplifyService for MockSimplifyClient {
    async fn simplify(&self, discharge_notes: &str) -> Result<SimplifiedResult> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Backend {
                status: 500,
                message,
            });
        }

        let results = self.results.lock().unwrap();
        if results.is_empty() {
            Ok(SimplifiedResult {
                summary: format!("Simplified: {}", discharge_notes),
                ..Default::default()
            })
        } else {
            let index = (*count - 1) % results.len();
            Ok(results[index].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(prompt: &str) -> OutgoingTurn {
        OutgoingTurn {
            prompt: prompt.to_string(),
            history: Vec::new(),
            attachment: None,
        }
    }

    #[tokio::test]
    async fn test_mock_backend_default_reply() {
        let backend = MockChatBackend::new(ClientMode::Query);
        let reply = backend.send(&turn("hello")).await.unwrap();
        assert!(reply.contains("hello"));
        assert_eq!(backend.get_call_count(), 1);
        assert_eq!(backend.sent_turns()[0].prompt, "hello");
    }

    #[tokio::test]
    async fn test_mock_backend_cycles_scripted_replies() {
        let backend = MockChatBackend::new(ClientMode::Upload)
            .with_reply("first")
            .with_failure(500, "second failed");

        assert_eq!(backend.send(&turn("a")).await.unwrap(), "first");
        assert_eq!(
            backend.send(&turn("b")).await.unwrap_err().to_string(),
            "second failed"
        );
        // Should cycle back
        assert_eq!(backend.send(&turn("c")).await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_mock_backend_upload_outcomes() {
        let backend = MockChatBackend::new(ClientMode::Upload).with_upload(MockReply::Fail {
            status: 413,
            message: "File too large".to_string(),
        });
        let file = SelectedFile::new("a.pdf", "application/pdf", vec![1]);

        let err = backend.upload(&file).await.unwrap_err();
        assert_eq!(err.to_string(), "File too large");
        assert_eq!(backend.get_upload_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_simplify_failure() {
        let client = MockSimplifyClient::new().with_failure("Service unavailable");
        let err = client.simplify("notes").await.unwrap_err();
        assert_eq!(err.to_string(), "Service unavailable");
        assert_eq!(client.get_call_count(), 1);
    }
}
