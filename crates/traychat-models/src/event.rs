//! Conversation events produced by an active session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChatEventId, ConversationId, UserId};

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipChange {
    Join,
    Leave,
}

/// What happened in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEventKind {
    /// A chat message arrived.
    ChatMessage {
        /// Plain-text rendering of the message segments.
        text: String,
    },
    /// Users joined or left.
    Membership {
        change: MembershipChange,
        participants: Vec<UserId>,
    },
    /// The conversation was renamed.
    Rename {
        new_name: String,
    },
    /// A call started or ended.
    Call,
}

/// A single event in the conversation event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEvent {
    /// Event id.
    pub id: ChatEventId,
    /// Conversation the event belongs to.
    pub conversation_id: ConversationId,
    /// Author of the event.
    pub sender: UserId,
    /// Server timestamp.
    pub timestamp: DateTime<Utc>,
    /// Payload.
    pub kind: ConversationEventKind,
}

impl ConversationEvent {
    /// Creates an event stamped with the current time.
    pub fn new(
        conversation_id: impl Into<ConversationId>,
        sender: impl Into<UserId>,
        kind: ConversationEventKind,
    ) -> Self {
        Self {
            id: ChatEventId::new(),
            conversation_id: conversation_id.into(),
            sender: sender.into(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Shorthand for a chat message event.
    pub fn chat_message(
        conversation_id: impl Into<ConversationId>,
        sender: impl Into<UserId>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            conversation_id,
            sender,
            ConversationEventKind::ChatMessage { text: text.into() },
        )
    }

    /// Returns true if this event carries a chat message.
    pub fn is_message(&self) -> bool {
        matches!(self.kind, ConversationEventKind::ChatMessage { .. })
    }

    /// Returns the message text for chat message events.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ConversationEventKind::ChatMessage { text } => Some(text),
            _ => None,
        }
    }
}
