//! User and conversation collections built from the connect-time snapshot.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::trace;
use traychat_models::{
    ConversationEvent, ConversationEventKind, ConversationId, ConversationState, Entity,
    MembershipChange, Participant, UserId,
};
use traychat_session::{ConversationList, Observable, Subscription, UserList};

/// Users of one session, keyed by id.
pub struct LoopbackUsers {
    self_user: Entity,
    users: HashMap<UserId, Entity>,
    participants: Vec<Participant>,
}

impl LoopbackUsers {
    pub fn new(self_user: Entity, entities: Vec<Entity>, participants: Vec<Participant>) -> Self {
        let users = std::iter::once(self_user.clone())
            .chain(entities)
            .map(|entity| (entity.id.clone(), entity))
            .collect();
        Self {
            self_user,
            users,
            participants,
        }
    }

    /// Users taking part in `conversation_id` according to the snapshot.
    pub fn members_of(&self, conversation_id: &ConversationId) -> Vec<UserId> {
        self.participants
            .iter()
            .filter(|p| &p.conversation_id == conversation_id)
            .map(|p| p.user_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserList for LoopbackUsers {
    fn self_user(&self) -> Entity {
        self.self_user.clone()
    }

    fn get(&self, id: &UserId) -> Option<Entity> {
        self.users.get(id).cloned()
    }
}

/// Conversations of one session.
///
/// Incoming events update the stored state before observers see them.
pub struct LoopbackConversations {
    states: RwLock<Vec<ConversationState>>,
    sync_timestamp: DateTime<Utc>,
    events: Observable<ConversationEvent>,
}

impl LoopbackConversations {
    pub fn new(states: Vec<ConversationState>, sync_timestamp: DateTime<Utc>) -> Self {
        Self {
            states: RwLock::new(states),
            sync_timestamp,
            events: Observable::new(),
        }
    }

    pub fn sync_timestamp(&self) -> DateTime<Utc> {
        self.sync_timestamp
    }

    pub fn observers(&self) -> usize {
        self.events.subscriber_count()
    }

    /// Folds `event` into the conversation state and notifies observers.
    pub fn apply(&self, event: ConversationEvent) -> usize {
        if let Ok(mut states) = self.states.write() {
            let index = match states.iter().position(|s| s.id == event.conversation_id) {
                Some(index) => index,
                None => {
                    states.push(ConversationState::new(event.conversation_id.clone()));
                    states.len() - 1
                }
            };
            let state = &mut states[index];
            state.last_activity = event.timestamp;
            match &event.kind {
                ConversationEventKind::Rename { new_name } => {
                    state.name = Some(new_name.clone());
                }
                ConversationEventKind::Membership {
                    change: MembershipChange::Join,
                    participants,
                } => {
                    for user in participants {
                        if !state.participants.contains(user) {
                            state.participants.push(user.clone());
                        }
                    }
                }
                ConversationEventKind::Membership {
                    change: MembershipChange::Leave,
                    participants,
                } => {
                    state.participants.retain(|user| !participants.contains(user));
                }
                ConversationEventKind::ChatMessage { .. } | ConversationEventKind::Call => {}
            }
        }

        trace!(conversation_id = %event.conversation_id, "conversation event");
        self.events.emit(event)
    }
}

impl ConversationList for LoopbackConversations {
    fn on_event(&self) -> Subscription<ConversationEvent> {
        self.events.subscribe()
    }

    fn get(&self, id: &ConversationId) -> Option<ConversationState> {
        self.states
            .read()
            .ok()
            .and_then(|states| states.iter().find(|s| &s.id == id).cloned())
    }

    fn conversations(&self) -> Vec<ConversationState> {
        let mut states = self
            .states
            .read()
            .map(|states| states.clone())
            .unwrap_or_default();
        states.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        states
    }
}
