//! [`ChatBackend`] implementation for the loopback service.

use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use tracing::debug;
use traychat_models::{ConversationState, Cookies, Entity, Participant};
use traychat_session::{ChatBackend, ChatClient, ConversationList, Notifier, UserList};

use crate::client::LoopbackClient;
use crate::collections::{LoopbackConversations, LoopbackUsers};
use crate::hub::LoopbackHub;
use crate::notifier::LoopbackNotifier;

/// Builds loopback clients and collections for one hub.
pub struct LoopbackBackend {
    hub: Arc<LoopbackHub>,
    /// Users of the most recent session, for the notifier's sender names.
    users: Mutex<Weak<LoopbackUsers>>,
    notifiers: Mutex<Vec<Weak<LoopbackNotifier>>>,
}

impl LoopbackBackend {
    pub fn new(hub: Arc<LoopbackHub>) -> Self {
        Self {
            hub,
            users: Mutex::new(Weak::new()),
            notifiers: Mutex::new(Vec::new()),
        }
    }

    pub fn hub(&self) -> &Arc<LoopbackHub> {
        &self.hub
    }

    /// The notifier of the live session, if any.
    pub fn active_notifier(&self) -> Option<Arc<LoopbackNotifier>> {
        let mut notifiers = self.notifiers.lock().ok()?;
        notifiers.retain(|n| n.strong_count() > 0);
        notifiers
            .iter()
            .rev()
            .filter_map(Weak::upgrade)
            .find(|n| !n.is_closed())
    }
}

impl ChatBackend for LoopbackBackend {
    fn client(&self, cookies: Cookies) -> Arc<dyn ChatClient> {
        debug!("creating loopback client");
        Arc::new(LoopbackClient::new(Arc::clone(&self.hub), cookies))
    }

    fn user_list(
        &self,
        _client: Arc<dyn ChatClient>,
        self_entity: Entity,
        entities: Vec<Entity>,
        participants: Vec<Participant>,
    ) -> Arc<dyn UserList> {
        let users = Arc::new(LoopbackUsers::new(self_entity, entities, participants));
        if let Ok(mut current) = self.users.lock() {
            *current = Arc::downgrade(&users);
        }
        users
    }

    fn conversation_list(
        &self,
        _client: Arc<dyn ChatClient>,
        states: Vec<ConversationState>,
        _users: Arc<dyn UserList>,
        sync_timestamp: DateTime<Utc>,
    ) -> Arc<dyn ConversationList> {
        let conversations = Arc::new(LoopbackConversations::new(states, sync_timestamp));
        self.hub.attach_conversations(&conversations);
        conversations
    }

    fn notifier(&self, conversations: Arc<dyn ConversationList>) -> Arc<dyn Notifier> {
        let users: Arc<dyn UserList> = match self.users.lock().ok().and_then(|u| u.upgrade()) {
            Some(users) => users,
            None => {
                let snapshot = self.hub.directory().snapshot();
                Arc::new(LoopbackUsers::new(
                    snapshot.self_entity,
                    snapshot.entities,
                    snapshot.conversation_participants,
                ))
            }
        };

        let notifier = Arc::new(LoopbackNotifier::start(conversations, users));
        if let Ok(mut notifiers) = self.notifiers.lock() {
            notifiers.push(Arc::downgrade(&notifier));
        }
        notifier
    }
}
