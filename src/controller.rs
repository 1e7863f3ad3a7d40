//! Async driver for a chat session.
//!
//! Applies actions to the [`Session`] and performs the resulting effects
//! against a [`ChatBackend`]. The session lock is never held across an
//! await, so the session stays usable (for example removing an attachment)
//! while a request is pending.

use crate::api::ChatBackend;
use crate::attachment::SelectedFile;
use crate::models::{Attachment, Message};
use crate::session::{Action, Effect, Key, Session};
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

pub struct ChatController {
    session: Mutex<Session>,
    backend: Box<dyn ChatBackend>,
}

/// Applies `abandon` on drop unless the flight was finished, so the
/// in-flight flag is released even when the awaiting future is dropped.
struct FlightGuard<'a> {
    session: &'a Mutex<Session>,
    abandon: Option<Action>,
}

impl<'a> FlightGuard<'a> {
    fn new(session: &'a Mutex<Session>, abandon: Action) -> Self {
        Self {
            session,
            abandon: Some(abandon),
        }
    }

    fn finish(mut self, outcome: Action) {
        self.abandon = None;
        lock(self.session).update(outcome);
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(action) = self.abandon.take() {
            lock(self.session).update(action);
        }
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatController {
    pub fn new(backend: Box<dyn ChatBackend>) -> Self {
        let session = Session::new(backend.mode());
        info!(session = %session.id(), "Started {} session", session.mode());
        Self {
            session: Mutex::new(session),
            backend,
        }
    }

    /// Run `f` against the current session state.
    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&*lock(&self.session))
    }

    pub fn messages(&self) -> Vec<Message> {
        self.with_session(|s| s.messages().to_vec())
    }

    pub fn attachment(&self) -> Option<Attachment> {
        self.with_session(|s| s.attachment().cloned())
    }

    pub fn is_sending(&self) -> bool {
        self.with_session(Session::is_sending)
    }

    /// Apply an action and carry out its effect.
    ///
    /// Client-side rejections come back as [`Error::Rejected`]; backend
    /// failures are recorded in the transcript and return `Ok`.
    pub async fn handle(&self, action: Action) -> Result<()> {
        let effect = lock(&self.session).update(action);

        match effect {
            Effect::None => Ok(()),
            Effect::Notice(message) => Err(Error::Rejected(message)),
            Effect::Upload(file) => {
                let guard = FlightGuard::new(&self.session, Action::UploadAbandoned);
                let outcome = match self.backend.upload(&file).await {
                    Ok(document) => Action::UploadSucceeded(document),
                    Err(e) => Action::UploadFailed(e.to_string()),
                };
                guard.finish(outcome);
                Ok(())
            }
            Effect::Dispatch(turn) => {
                let guard = FlightGuard::new(&self.session, Action::SendAbandoned);
                let outcome = match self.backend.send(&turn).await {
                    Ok(content) => Action::ReplyReceived(content),
                    Err(e) => Action::SendFailed(e.to_string()),
                };
                guard.finish(outcome);
                Ok(())
            }
        }
    }

    pub fn set_input(&self, text: impl Into<String>) {
        lock(&self.session).update(Action::EditInput(text.into()));
    }

    pub async fn select_file(&self, file: SelectedFile) -> Result<()> {
        self.handle(Action::SelectFile(file)).await
    }

    pub fn remove_attachment(&self) {
        lock(&self.session).update(Action::RemoveAttachment);
    }

    pub async fn submit(&self) -> Result<()> {
        self.handle(Action::Submit).await
    }

    pub async fn key_press(&self, key: Key, shift: bool) -> Result<()> {
        self.handle(Action::KeyPress { key, shift }).await
    }

    /// Type `text` and submit it.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<()> {
        self.set_input(text);
        self.submit().await
    }
}
