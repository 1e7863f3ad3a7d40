//! Client session state machine
//!
//! A [`Session`] owns the transcript, the draft input, the held attachment and
//! the in-flight flags for one conversation. Every user action and every
//! backend outcome goes through [`Session::update`], which mutates state and
//! returns the [`Effect`] the caller must perform. No I/O happens here.

use crate::api::{OutgoingTurn, UploadedDocument};
use crate::attachment::SelectedFile;
use crate::models::{
    history_from, Attachment, AttachmentKind, AttachmentPayload, AttachmentPolicy, ClientMode,
    Message, Role,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const GREETING: &str = "Hello! I can help you understand your discharge summary. \
You can upload a photo or PDF of your document, or just ask me questions.";

/// Sent in place of an empty message when only an attachment is held.
pub const DEFAULT_DOCUMENT_PROMPT: &str =
    "Please analyze this medical document and explain it in simple, patient-friendly terms.";

pub const UPLOAD_IN_PROGRESS: &str = "Please wait for the current upload to finish.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Debug, Clone)]
pub enum Action {
    EditInput(String),
    SelectFile(SelectedFile),
    RemoveAttachment,
    Submit,
    KeyPress { key: Key, shift: bool },
    UploadSucceeded(UploadedDocument),
    UploadFailed(String),
    UploadAbandoned,
    ReplyReceived(String),
    SendFailed(String),
    SendAbandoned,
}

/// Work the caller must carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Shown to the user as-is; no request is made.
    Notice(String),
    Upload(SelectedFile),
    Dispatch(OutgoingTurn),
}

#[derive(Debug, Clone)]
struct PendingUpload {
    name: String,
    kind: AttachmentKind,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    mode: ClientMode,
    messages: Vec<Message>,
    input: String,
    attachment: Option<Attachment>,
    pending_upload: Option<PendingUpload>,
    sending: bool,
}

impl Session {
    pub fn new(mode: ClientMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            messages: vec![Message::assistant(GREETING)],
            input: String::new(),
            attachment: None,
            pending_upload: None,
            sending: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> ClientMode {
        self.mode
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_uploading(&self) -> bool {
        self.pending_upload.is_some()
    }

    /// Whether a submit right now would send anything.
    pub fn can_send(&self) -> bool {
        !self.sending && (!self.input.trim().is_empty() || self.attachment.is_some())
    }

    pub fn update(&mut self, action: Action) -> Effect {
        match action {
            Action::EditInput(text) => {
                self.input = text;
                Effect::None
            }
            Action::SelectFile(file) => self.select_file(file),
            Action::RemoveAttachment => {
                if let Some(removed) = self.attachment.take() {
                    info!(session = %self.id, "Removed attachment '{}'", removed.name);
                }
                Effect::None
            }
            Action::Submit => self.submit(),
            Action::KeyPress {
                key: Key::Enter,
                shift: false,
            } => self.submit(),
            Action::KeyPress { .. } => Effect::None,
            Action::UploadSucceeded(document) => {
                self.finish_upload(document);
                Effect::None
            }
            Action::UploadFailed(error) => {
                if self.pending_upload.take().is_some() {
                    warn!(session = %self.id, "Upload failed: {}", error);
                    self.messages
                        .push(Message::error(Role::System, format!("Upload failed: {}", error)));
                }
                Effect::None
            }
            Action::UploadAbandoned => {
                self.pending_upload = None;
                Effect::None
            }
            Action::ReplyReceived(content) => {
                if self.sending {
                    self.messages.push(Message::assistant(content));
                    self.sending = false;
                } else {
                    debug!(session = %self.id, "Ignoring reply with no send in flight");
                }
                Effect::None
            }
            Action::SendFailed(error) => {
                if self.sending {
                    warn!(session = %self.id, "Send failed: {}", error);
                    self.messages
                        .push(Message::error(self.mode.failure_role(), error));
                    self.sending = false;
                }
                Effect::None
            }
            Action::SendAbandoned => {
                self.sending = false;
                Effect::None
            }
        }
    }

    fn select_file(&mut self, file: SelectedFile) -> Effect {
        let kind = match file.validate() {
            Ok(kind) => kind,
            Err(e) => {
                warn!(session = %self.id, "Rejected file '{}': {}", file.name, e);
                return Effect::Notice(e.to_string());
            }
        };

        if !self.mode.uploads_on_select() {
            info!(session = %self.id, "Attached '{}' ({})", file.name, kind);
            self.attachment = Some(file.into_raw_attachment(kind));
            return Effect::None;
        }

        if self.pending_upload.is_some() {
            return Effect::Notice(UPLOAD_IN_PROGRESS.to_string());
        }

        self.pending_upload = Some(PendingUpload {
            name: file.name.clone(),
            kind,
        });
        Effect::Upload(file)
    }

    fn finish_upload(&mut self, document: UploadedDocument) {
        let Some(pending) = self.pending_upload.take() else {
            debug!(session = %self.id, "Ignoring upload result with no upload pending");
            return;
        };

        info!(
            session = %self.id,
            "Extracted {} chars from '{}'",
            document.extracted_text.len(),
            pending.name
        );
        self.messages.push(Message::system(format!(
            "📎 Attached: {}",
            document.display_name
        )));
        self.attachment = Some(Attachment {
            name: document.display_name,
            kind: pending.kind,
            payload: AttachmentPayload::Extracted(document.extracted_text),
        });
    }

    fn submit(&mut self) -> Effect {
        if self.sending {
            debug!(session = %self.id, "Send already in flight");
            return Effect::None;
        }

        let text = self.input.trim().to_string();
        let shown = match (&self.attachment, text.is_empty()) {
            (_, false) => text.clone(),
            (Some(attachment), true) => attachment.label(),
            (None, true) => return Effect::None,
        };
        let prompt = if text.is_empty() {
            DEFAULT_DOCUMENT_PROMPT.to_string()
        } else {
            text
        };

        let history = history_from(&self.messages);
        self.messages.push(Message::user(shown));
        self.input.clear();

        let attachment = match self.mode.attachment_policy() {
            AttachmentPolicy::PerSend => self.attachment.take(),
            AttachmentPolicy::Sticky => self.attachment.clone(),
        };

        self.sending = true;
        info!(
            session = %self.id,
            "Sending turn ({} history entries, attachment: {})",
            history.len(),
            attachment.is_some()
        );

        Effect::Dispatch(OutgoingTurn {
            prompt,
            history,
            attachment,
        })
    }
}
