//! Modal prompts as request/continuation pairs.
//!
//! A prompt never blocks the scheduler: [`Prompter::ask`] sends a
//! [`PromptRequest`] to the front-end and suspends until the front-end calls
//! [`PromptRequest::respond`]. Prompts are strictly sequential; a second
//! `ask` waits until the first one has been answered.

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

use crate::error::{AuthError, Result};

/// How the front-end should render a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Single-line text input.
    Text,
    /// Single-line input with echo disabled.
    Secret,
    /// Yes/No question.
    Confirm,
}

/// A modal question for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    /// Window title.
    pub title: String,
    /// Field label or question text.
    pub label: String,
}

impl Prompt {
    pub fn text(title: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(PromptKind::Text, title, label)
    }

    pub fn secret(title: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(PromptKind::Secret, title, label)
    }

    pub fn confirm(title: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(PromptKind::Confirm, title, label)
    }

    fn new(kind: PromptKind, title: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            label: label.into(),
        }
    }
}

/// The user's answer to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReply {
    /// Text entered into a `Text` or `Secret` prompt.
    Value(String),
    /// "Yes" on a `Confirm` prompt.
    Accepted,
    /// Dialog dismissed, or "No" on a `Confirm` prompt.
    Cancelled,
}

/// A pending prompt waiting for the front-end's answer.
#[derive(Debug)]
pub struct PromptRequest {
    pub prompt: Prompt,
    reply: oneshot::Sender<PromptReply>,
}

impl PromptRequest {
    /// Resumes the suspended caller with `reply`.
    pub fn respond(self, reply: PromptReply) {
        // The asker may have been dropped (e.g. shutdown); nothing to resume then.
        let _ = self.reply.send(reply);
    }

    /// Shorthand for `respond(PromptReply::Cancelled)`.
    pub fn cancel(self) {
        self.respond(PromptReply::Cancelled);
    }
}

/// Issues prompts to the front-end one at a time.
#[derive(Debug)]
pub struct Prompter {
    requests: mpsc::UnboundedSender<PromptRequest>,
    gate: Mutex<()>,
}

impl Prompter {
    /// Creates a prompter and the receiving end the front-end answers from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PromptRequest>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (
            Self {
                requests,
                gate: Mutex::new(()),
            },
            rx,
        )
    }

    /// Asks the user and suspends until they answer.
    ///
    /// Fails with [`AuthError::PromptClosed`] when the front-end has dropped
    /// its receiver or the request without answering.
    pub async fn ask(&self, prompt: Prompt) -> Result<PromptReply> {
        let _turn = self.gate.lock().await;

        let (reply, answer) = oneshot::channel();
        debug!(kind = ?prompt.kind, title = %prompt.title, "issuing prompt");
        self.requests
            .send(PromptRequest { prompt, reply })
            .map_err(|_| AuthError::PromptClosed)?;

        answer.await.map_err(|_| AuthError::PromptClosed)
    }

    /// Returns true while a prompt is waiting for an answer.
    pub fn is_pending(&self) -> bool {
        self.gate.try_lock().is_err()
    }
}
