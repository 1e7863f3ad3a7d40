use super::client::BackendHttpClient;
use super::types::{
    ContentResponse, SimplifyRequest, SimplifyResponse, QUERY_ERROR_FIELDS, SIMPLIFY_ERROR_FIELDS,
};
use super::{ChatBackend, OutgoingTurn, SimplifyService, UploadedDocument};
use crate::attachment::SelectedFile;
use crate::models::{AttachmentPayload, ClientMode, SimplifiedResult};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

const QUERY_PATH: &str = "/api/query";
const SIMPLIFY_PATH: &str = "/api/simplify-discharge";

/// Client for the unified query contract: `/api/query` for chat turns and
/// `/api/simplify-discharge` for the one-shot form.
pub struct QueryClient {
    http: BackendHttpClient,
}

impl QueryClient {
    pub fn new(base_url: &str) -> Self {
        Self::new_with_client(base_url, reqwest::Client::new())
    }

    pub fn new_with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            http: BackendHttpClient::new_with_client(base_url, client),
        }
    }

    fn build_form(turn: &OutgoingTurn) -> Result<Form> {
        let mut form = Form::new();

        if let Some(attachment) = &turn.attachment {
            match &attachment.payload {
                AttachmentPayload::File { bytes, mime } => {
                    let part = Part::bytes(bytes.clone())
                        .file_name(attachment.name.clone())
                        .mime_str(mime)?;
                    form = form.part("file", part);
                }
                AttachmentPayload::Extracted(_) => {
                    tracing::warn!(
                        "Dropping extracted-text attachment '{}': /api/query expects a file",
                        attachment.name
                    );
                }
            }
        }

        let history = serde_json::to_string(&turn.history)?;
        Ok(form
            .text("message", turn.prompt.clone())
            .text("history", history))
    }
}

#[async_trait]
impl ChatBackend for QueryClient {
    fn mode(&self) -> ClientMode {
        ClientMode::Query
    }

    async fn send(&self, turn: &OutgoingTurn) -> Result<String> {
        let form = Self::build_form(turn)?;
        let response: ContentResponse = self
            .http
            .post_multipart(QUERY_PATH, form, QUERY_ERROR_FIELDS)
            .await?;

        response
            .content
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::MalformedResponse("missing content".to_string()))
    }

    async fn upload(&self, file: &SelectedFile) -> Result<UploadedDocument> {
        Err(Error::Config(format!(
            "Cannot upload '{}': the query contract sends files with each message",
            file.name
        )))
    }
}

#[async_trait]
impl SimplifyService for QueryClient {
    async fn simplify(&self, discharge_notes: &str) -> Result<SimplifiedResult> {
        let request = SimplifyRequest { discharge_notes };
        let response: SimplifyResponse = self
            .http
            .post_json(SIMPLIFY_PATH, &request, SIMPLIFY_ERROR_FIELDS)
            .await?;

        response
            .data
            .ok_or_else(|| Error::MalformedResponse("missing data".to_string()))
    }
}
