//! Data models and structures
//!
//! Defines the transcript, attachment and simplified-result types shared by
//! the session state machine and the backend clients, plus configuration.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One transcript entry. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            is_error: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn error(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            is_error: true,
        }
    }
}

/// Wire form of a transcript entry sent as conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Builds the history sent to the backend: every entry except `system`
/// bookkeeping, in transcript order.
pub fn history_from(messages: &[Message]) -> Vec<HistoryEntry> {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| HistoryEntry {
            role: m.role,
            content: m.content.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Image => write!(f, "image"),
            AttachmentKind::Pdf => write!(f, "pdf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentPayload {
    /// Raw file, sent fresh with the next query.
    File { bytes: Vec<u8>, mime: String },
    /// Text extracted by the upload endpoint, resent as chat context.
    Extracted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub kind: AttachmentKind,
    pub payload: AttachmentPayload,
}

impl Attachment {
    /// Label used for the optimistic user entry when no text was typed.
    pub fn label(&self) -> String {
        format!("📎 {}", self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub care_plan: Vec<CarePlanDay>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medications: Vec<Medication>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warning_signs: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub follow_up_reminders: Vec<FollowUpReminder>,
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarePlanDay {
    pub day: u32,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub important_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowUpReminder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub action: String,
}

/// Which backend contract the client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientMode {
    /// Unified `/api/query`: file and message travel together each turn.
    #[default]
    Query,
    /// `/api/upload` then `/api/chat` with extracted text as context.
    Upload,
}

/// How long a held attachment lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentPolicy {
    /// Consumed by the next send; a second send needs a fresh attachment.
    PerSend,
    /// Kept across turns until the user removes it.
    Sticky,
}

impl ClientMode {
    pub fn attachment_policy(self) -> AttachmentPolicy {
        match self {
            ClientMode::Query => AttachmentPolicy::PerSend,
            ClientMode::Upload => AttachmentPolicy::Sticky,
        }
    }

    /// Role of the transcript entry recording a failed send.
    pub fn failure_role(self) -> Role {
        match self {
            ClientMode::Query => Role::Assistant,
            ClientMode::Upload => Role::System,
        }
    }

    /// Whether a selected file is sent for extraction right away.
    pub fn uploads_on_select(self) -> bool {
        matches!(self, ClientMode::Upload)
    }
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMode::Query => write!(f, "query"),
            ClientMode::Upload => write!(f, "upload"),
        }
    }
}

impl FromStr for ClientMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" | "a" => Ok(ClientMode::Query),
            "upload" | "b" => Ok(ClientMode::Upload),
            other => Err(crate::Error::Config(format!(
                "Unknown client mode '{}'. Expected 'query' or 'upload'",
                other
            ))),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub mode: ClientMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            mode: ClientMode::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_vars(
            std::env::var("DISCHARGE_API_URL").ok(),
            std::env::var("DISCHARGE_CLIENT_MODE").ok(),
        )
    }

    fn from_vars(api_url: Option<String>, mode: Option<String>) -> crate::Result<Self> {
        let api_url = api_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mode = match mode {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => ClientMode::default(),
        };

        Ok(Self {
            api_url: normalize_base_url(&api_url),
            mode,
        })
    }
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_history_excludes_system_and_keeps_order() {
        let messages = vec![
            Message::assistant("hello"),
            Message::system("📎 Attached: notes.pdf"),
            Message::user("what does this mean?"),
            Message::error(Role::Assistant, "Server error"),
            Message::system("bookkeeping"),
            Message::user("again"),
        ];

        let history = history_from(&messages);
        let roles: Vec<Role> = history.iter().map(|h| h.role).collect();
        assert_eq!(
            roles,
            vec![Role::Assistant, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(history[1].content, "what does this mean?");
        assert_eq!(history[3].content, "again");
    }

    #[test]
    fn test_history_entry_serialization() {
        let entry = HistoryEntry {
            role: Role::Assistant,
            content: "hi".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_simplified_result_tolerates_missing_sections() {
        let result: SimplifiedResult =
            serde_json::from_str(r#"{"summary":"Rest at home."}"#).unwrap();
        assert_eq!(result.summary, "Rest at home.");
        assert!(result.care_plan.is_empty());
        assert!(result.medications.is_empty());
        assert!(result.warning_signs.is_empty());
        assert!(result.follow_up_reminders.is_empty());
    }

    #[test]
    fn test_simplified_result_tolerates_null_sections() {
        let result: SimplifiedResult = serde_json::from_str(
            r#"{"summary":null,"carePlan":null,"medications":null,"warningSigns":null,"followUpReminders":null}"#,
        )
        .unwrap();
        assert_eq!(result, SimplifiedResult::default());
    }

    #[test]
    fn test_simplified_result_camel_case_fields() {
        let json = serde_json::json!({
            "summary": "You had bronchitis.",
            "carePlan": [{"day": 1, "instructions": "Rest"}],
            "medications": [{
                "name": "Azithromycin",
                "dosage": "500mg",
                "importantNotes": "Take with food"
            }],
            "warningSigns": ["High fever"],
            "followUpReminders": [{"action": "See your GP"}]
        });

        let result: SimplifiedResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.care_plan[0].day, 1);
        assert_eq!(
            result.medications[0].important_notes.as_deref(),
            Some("Take with food")
        );
        assert_eq!(result.medications[0].frequency, None);
        assert_eq!(result.follow_up_reminders[0].date, None);
    }

    #[test]
    fn test_client_mode_parsing() {
        assert_eq!("query".parse::<ClientMode>().unwrap(), ClientMode::Query);
        assert_eq!(" Upload ".parse::<ClientMode>().unwrap(), ClientMode::Upload);
        assert!("grpc".parse::<ClientMode>().is_err());
    }

    #[test]
    fn test_mode_policies() {
        assert_eq!(
            ClientMode::Query.attachment_policy(),
            AttachmentPolicy::PerSend
        );
        assert_eq!(ClientMode::Upload.attachment_policy(), AttachmentPolicy::Sticky);
        assert_eq!(ClientMode::Query.failure_role(), Role::Assistant);
        assert_eq!(ClientMode::Upload.failure_role(), Role::System);
        assert!(!ClientMode::Query.uploads_on_select());
        assert_eq!(ClientMode::Upload.to_string(), "upload");
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let config = Config::from_vars(None, None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.mode, ClientMode::Query);

        let config = Config::from_vars(
            Some("https://discharge.example.org/".to_string()),
            Some("upload".to_string()),
        )
        .unwrap();
        assert_eq!(config.api_url, "https://discharge.example.org");
        assert_eq!(config.mode, ClientMode::Upload);
    }

    #[test]
    fn test_message_error_flag_is_omitted_when_false() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(!json.contains("isError"));

        let json = serde_json::to_string(&Message::error(Role::System, "boom")).unwrap();
        assert!(json.contains("\"isError\":true"));
    }
}
