//! Request/response payloads exchanged with the discharge backend.

use crate::models::{HistoryEntry, SimplifiedResult};
use serde::{Deserialize, Serialize};

/// Reply body shared by `/api/query` and `/api/chat`.
#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    pub content: Option<String>,
}

/// JSON body for `/api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub prompt: &'a str,
    pub history: &'a [HistoryEntry],
    pub context: &'a str,
}

/// Reply body for `/api/upload`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: Option<String>,
    pub extracted_text: Option<String>,
}

/// JSON body for `/api/simplify-discharge`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifyRequest<'a> {
    pub discharge_notes: &'a str,
}

/// Reply body for `/api/simplify-discharge`.
#[derive(Debug, Deserialize)]
pub struct SimplifyResponse {
    pub data: Option<SimplifiedResult>,
}

/// Failure body as sent by the backend. Fields are read one at a time, so a
/// non-string sibling (for example a serialized `fullError` object) does not
/// hide the ones that are plain strings.
#[derive(Debug, Default)]
pub struct ErrorBody(serde_json::Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorField {
    Details,
    Error,
    FullError,
    Message,
}

/// `/api/query`: most detailed first.
pub const QUERY_ERROR_FIELDS: &[ErrorField] =
    &[ErrorField::Details, ErrorField::Error, ErrorField::FullError];
pub const CHAT_ERROR_FIELDS: &[ErrorField] = &[ErrorField::Error];
pub const UPLOAD_ERROR_FIELDS: &[ErrorField] = &[ErrorField::Error];
pub const SIMPLIFY_ERROR_FIELDS: &[ErrorField] = &[ErrorField::Message];

impl ErrorField {
    fn key(self) -> &'static str {
        match self {
            ErrorField::Details => "details",
            ErrorField::Error => "error",
            ErrorField::FullError => "fullError",
            ErrorField::Message => "message",
        }
    }
}

impl ErrorBody {
    /// `None` when the body is not JSON at all.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok().map(Self)
    }

    fn field(&self, field: ErrorField) -> Option<&str> {
        self.0
            .get(field.key())
            .and_then(serde_json::Value::as_str)
            .filter(|v| !v.is_empty())
    }

    /// First non-empty string field in precedence order.
    pub fn describe(&self, precedence: &[ErrorField]) -> Option<String> {
        precedence
            .iter()
            .find_map(|field| self.field(*field))
            .map(str::to_string)
    }
}
