//! Seams to the external chat-client library.
//!
//! The chat protocol is not implemented here. A backend provides the client
//! handle and the collections built from the connect-time [`Snapshot`];
//! everything the controller needs from them is captured by these traits.
//!
//! [`Snapshot`]: traychat_models::Snapshot

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use traychat_models::{
    ConversationEvent, ConversationId, ConversationState, Cookies, Entity, Participant, Snapshot,
    UserId,
};

use crate::error::ClientError;
use crate::observer::Subscription;

/// Handle to one connection to the chat service.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Connects and services the connection.
    ///
    /// Resolves once the connection is closed, either through
    /// [`disconnect`](Self::disconnect) or by the remote side.
    async fn connect(&self) -> Result<(), ClientError>;

    /// Closes the connection.
    async fn disconnect(&self) -> Result<(), ClientError>;

    /// Observes successful connects. Every connect delivers one snapshot.
    fn on_connect(&self) -> Subscription<Snapshot>;
}

/// Users known to the session.
pub trait UserList: Send + Sync {
    /// The signed-in user.
    fn self_user(&self) -> Entity;

    /// Looks up a user.
    fn get(&self, id: &UserId) -> Option<Entity>;
}

/// Conversations known to the session, plus their event stream.
pub trait ConversationList: Send + Sync {
    /// Observes conversation events for the lifetime of the session.
    fn on_event(&self) -> Subscription<ConversationEvent>;

    /// Looks up a conversation.
    fn get(&self, id: &ConversationId) -> Option<ConversationState>;

    /// All conversations, most recently active first.
    fn conversations(&self) -> Vec<ConversationState>;
}

/// Desktop notification service attached to a conversation list.
///
/// The service subscribes to the conversation events itself; the session only
/// owns the handle and closes it on teardown.
pub trait Notifier: Send + Sync {
    fn close(&self);
}

/// Constructors of the chat-client library.
pub trait ChatBackend: Send + Sync {
    /// Creates an unconnected client authenticated by `cookies`.
    fn client(&self, cookies: Cookies) -> Arc<dyn ChatClient>;

    /// Builds the user collection from snapshot fields.
    fn user_list(
        &self,
        client: Arc<dyn ChatClient>,
        self_entity: Entity,
        entities: Vec<Entity>,
        participants: Vec<Participant>,
    ) -> Arc<dyn UserList>;

    /// Builds the conversation collection from snapshot fields.
    fn conversation_list(
        &self,
        client: Arc<dyn ChatClient>,
        states: Vec<ConversationState>,
        users: Arc<dyn UserList>,
        sync_timestamp: DateTime<Utc>,
    ) -> Arc<dyn ConversationList>;

    /// Starts the notification service for `conversations`.
    fn notifier(&self, conversations: Arc<dyn ConversationList>) -> Arc<dyn Notifier>;
}

/// Title for a conversation tab: its name, or the other participants' names.
pub fn conversation_title(state: &ConversationState, users: &dyn UserList) -> String {
    if let Some(name) = state.name.as_deref().filter(|n| !n.trim().is_empty()) {
        return name.to_string();
    }

    let self_id = users.self_user().id;
    let names: Vec<String> = state
        .participants
        .iter()
        .filter(|id| **id != self_id)
        .map(|id| {
            users
                .get(id)
                .map(|user| user.display_name)
                .unwrap_or_else(|| id.to_string())
        })
        .collect();

    if names.is_empty() {
        state.id.to_string()
    } else {
        names.join(", ")
    }
}
