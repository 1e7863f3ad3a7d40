//! Backend service integration
//!
//! Two alternative HTTP contracts are supported. The unified query contract
//! sends the raw file with every message; the upload contract extracts text
//! once and resends it as chat context on each turn.

pub mod chat;
pub mod client;
pub mod mock;
pub mod query;
pub mod types;

pub use chat::UploadChatClient;
pub use client::BackendHttpClient;
pub use mock::{MockChatBackend, MockSimplifyClient};
pub use query::QueryClient;

use crate::attachment::SelectedFile;
use crate::models::{Attachment, ClientMode, HistoryEntry, SimplifiedResult};
use crate::Result;
use async_trait::async_trait;

/// Everything one chat turn sends to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingTurn {
    pub prompt: String,
    pub history: Vec<HistoryEntry>,
    pub attachment: Option<Attachment>,
}

/// Text extracted from a document by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub display_name: String,
    pub extracted_text: String,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// The contract this backend speaks.
    fn mode(&self) -> ClientMode;

    /// Send one turn and return the assistant's reply text.
    async fn send(&self, turn: &OutgoingTurn) -> Result<String>;

    /// Extract text from a document ahead of chatting.
    async fn upload(&self, file: &SelectedFile) -> Result<UploadedDocument>;
}

#[async_trait]
pub trait SimplifyService: Send + Sync {
    async fn simplify(&self, discharge_notes: &str) -> Result<SimplifiedResult>;
}

/// Build the chat backend for a configured mode.
pub fn backend_for(mode: ClientMode, base_url: &str) -> Box<dyn ChatBackend> {
    match mode {
        ClientMode::Query => Box::new(QueryClient::new(base_url)),
        ClientMode::Upload => Box::new(UploadChatClient::new(base_url)),
    }
}
