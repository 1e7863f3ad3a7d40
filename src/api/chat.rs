use super::client::BackendHttpClient;
use super::types::{
    ChatRequest, ContentResponse, UploadResponse, CHAT_ERROR_FIELDS, UPLOAD_ERROR_FIELDS,
};
use super::{ChatBackend, OutgoingTurn, UploadedDocument};
use crate::attachment::SelectedFile;
use crate::models::{AttachmentPayload, ClientMode};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

const UPLOAD_PATH: &str = "/api/upload";
const CHAT_PATH: &str = "/api/chat";

/// Client for the upload-then-chat contract.
pub struct UploadChatClient {
    http: BackendHttpClient,
}

impl UploadChatClient {
    pub fn new(base_url: &str) -> Self {
        Self::new_with_client(base_url, reqwest::Client::new())
    }

    pub fn new_with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            http: BackendHttpClient::new_with_client(base_url, client),
        }
    }

    fn context_of(turn: &OutgoingTurn) -> &str {
        match turn.attachment.as_ref().map(|a| &a.payload) {
            Some(AttachmentPayload::Extracted(text)) => text.as_str(),
            _ => "",
        }
    }
}

#[async_trait]
impl ChatBackend for UploadChatClient {
    fn mode(&self) -> ClientMode {
        ClientMode::Upload
    }

    async fn send(&self, turn: &OutgoingTurn) -> Result<String> {
        let request = ChatRequest {
            prompt: &turn.prompt,
            history: &turn.history,
            context: Self::context_of(turn),
        };

        let response: ContentResponse = self
            .http
            .post_json(CHAT_PATH, &request, CHAT_ERROR_FIELDS)
            .await?;

        response
            .content
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::MalformedResponse("missing content".to_string()))
    }

    async fn upload(&self, file: &SelectedFile) -> Result<UploadedDocument> {
        tracing::info!("Uploading '{}' ({} bytes) for extraction", file.name, file.size());

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = Form::new().part("file", part);

        let response: UploadResponse = self
            .http
            .post_multipart(UPLOAD_PATH, form, UPLOAD_ERROR_FIELDS)
            .await?;

        let extracted_text = response
            .extracted_text
            .ok_or_else(|| Error::MalformedResponse("missing extractedText".to_string()))?;
        let display_name = response
            .file_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| file.name.clone());

        Ok(UploadedDocument {
            display_name,
            extracted_text,
        })
    }
}
