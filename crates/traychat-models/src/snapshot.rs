//! Initial state delivered once when a connection is established.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConversationId, UserId};

/// A user known to the chat service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Service-assigned user id.
    pub id: UserId,
    /// Name shown in conversation titles.
    pub display_name: String,
    /// Primary email, when the service exposes it.
    #[serde(default)]
    pub email: Option<String>,
}

impl Entity {
    /// Creates an entity without an email address.
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Membership of one user in one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
}

/// Server-side state of a conversation at sync time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Conversation id.
    pub id: ConversationId,
    /// Explicit conversation name, if one was set.
    #[serde(default)]
    pub name: Option<String>,
    /// Participant ids, the signed-in user included.
    #[serde(default)]
    pub participants: Vec<UserId>,
    /// Timestamp of the latest event in the conversation.
    pub last_activity: DateTime<Utc>,
}

impl ConversationState {
    /// Creates an unnamed conversation state with no participants.
    pub fn new(id: impl Into<ConversationId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            participants: Vec::new(),
            last_activity: Utc::now(),
        }
    }

    /// Sets the conversation name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a participant.
    pub fn with_participant(mut self, user: impl Into<UserId>) -> Self {
        self.participants.push(user.into());
        self
    }
}

/// One-time initial state handed to the `on_connect` observers.
///
/// The snapshot only seeds the user and conversation collections; it is
/// consumed by value and never kept around afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The signed-in user.
    pub self_entity: Entity,
    /// Every other user referenced by the synced conversations.
    pub entities: Vec<Entity>,
    /// Conversation membership.
    pub conversation_participants: Vec<Participant>,
    /// Per-conversation state.
    pub conversation_states: Vec<ConversationState>,
    /// Point in time the snapshot was taken at.
    pub sync_timestamp: DateTime<Utc>,
}
