//! The users and conversations a loopback service knows about.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use traychat_models::{ConversationState, Entity, Participant, Snapshot};

/// Seed data of a loopback service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    /// The account the client signs in as.
    pub self_entity: Entity,
    /// Everybody else.
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub conversations: Vec<ConversationState>,
}

impl Directory {
    pub fn new(self_entity: Entity) -> Self {
        Self {
            self_entity,
            entities: Vec::new(),
            conversations: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_conversation(mut self, conversation: ConversationState) -> Self {
        self.conversations.push(conversation);
        self
    }

    /// A small directory for trying things out.
    pub fn demo() -> Self {
        Self::new(Entity::new("me", "Me").with_email("me@example.com"))
            .with_entity(Entity::new("alice", "Alice").with_email("alice@example.com"))
            .with_entity(Entity::new("bob", "Bob").with_email("bob@example.com"))
            .with_conversation(
                ConversationState::new("alice-dm")
                    .with_participant("me")
                    .with_participant("alice"),
            )
            .with_conversation(
                ConversationState::new("team")
                    .with_name("Team")
                    .with_participant("me")
                    .with_participant("alice")
                    .with_participant("bob"),
            )
    }

    /// Reads a directory from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// The connect-time snapshot of this directory.
    pub fn snapshot(&self) -> Snapshot {
        let conversation_participants = self
            .conversations
            .iter()
            .flat_map(|state| {
                state.participants.iter().map(|user_id| Participant {
                    conversation_id: state.id.clone(),
                    user_id: user_id.clone(),
                })
            })
            .collect();

        Snapshot {
            self_entity: self.self_entity.clone(),
            entities: self.entities.clone(),
            conversation_participants,
            conversation_states: self.conversations.clone(),
            sync_timestamp: Utc::now(),
        }
    }
}
