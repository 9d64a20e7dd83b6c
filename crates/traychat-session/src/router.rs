//! Routing of conversation events to UI surfaces.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use traychat_models::{ConversationEvent, ConversationId};

use crate::client::{conversation_title, ChatClient, ConversationList, UserList};
use crate::message::SessionMessage;
use crate::ui::{MessageView, Surface, SurfaceFactory};

/// Open message-view tabs, keyed by conversation id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationTabs {
    order: Vec<ConversationId>,
    current: Option<ConversationId>,
}

impl ConversationTabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.order.contains(id)
    }

    /// Adds a tab; returns false if it was already open.
    pub fn insert(&mut self, id: ConversationId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Removes a tab; returns false if it was not open.
    pub fn remove(&mut self, id: &ConversationId) -> bool {
        let before = self.order.len();
        self.order.retain(|open| open != id);
        if self.current.as_ref() == Some(id) {
            self.current = self.order.last().cloned();
        }
        self.order.len() != before
    }

    /// Makes an open tab current.
    pub fn select(&mut self, id: &ConversationId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.current = Some(id.clone());
        true
    }

    pub fn current(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    /// Open tabs in the order they were opened.
    pub fn ids(&self) -> &[ConversationId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Reacts to conversation events of one connected session.
///
/// Owns the session's UI surfaces. Both are created lazily and dropped
/// together with the router when the session is torn down.
pub struct EventRouter {
    client: Arc<dyn ChatClient>,
    conversations: Arc<dyn ConversationList>,
    users: Arc<dyn UserList>,
    conversation_list: Option<Box<dyn Surface>>,
    message_view: Option<Box<dyn MessageView>>,
    tabs: ConversationTabs,
    pump: JoinHandle<()>,
}

impl EventRouter {
    /// Subscribes to the conversation event stream.
    ///
    /// Events are forwarded into the controller's inbox tagged with `epoch`,
    /// so events of a torn-down session can be told apart.
    pub(crate) fn new(
        epoch: u64,
        client: Arc<dyn ChatClient>,
        conversations: Arc<dyn ConversationList>,
        users: Arc<dyn UserList>,
        inbox: UnboundedSender<SessionMessage>,
    ) -> Self {
        let mut events = conversations.on_event();
        let pump = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if inbox
                    .send(SessionMessage::ConversationEvent { epoch, event })
                    .is_err()
                {
                    break;
                }
            }
            trace!(epoch, "conversation event stream ended");
        });

        Self {
            client,
            conversations,
            users,
            conversation_list: None,
            message_view: None,
            tabs: ConversationTabs::new(),
            pump,
        }
    }

    /// Shows the conversation list, creating it on first use.
    pub fn show_conversation_list(&mut self, factory: &mut dyn SurfaceFactory) {
        let client = &self.client;
        let conversations = &self.conversations;
        self.conversation_list
            .get_or_insert_with(|| {
                debug!("creating conversation list surface");
                factory.conversation_list(Arc::clone(client), Arc::clone(conversations))
            })
            .show();
    }

    /// Hides a visible conversation list and shows a hidden one.
    ///
    /// Returns the new visibility, or `None` if there is no list yet.
    pub fn toggle_conversation_list(&mut self) -> Option<bool> {
        let list = self.conversation_list.as_mut()?;
        if list.is_visible() {
            list.hide();
        } else {
            list.show();
        }
        Some(list.is_visible())
    }

    /// Routes one event. Returns true if it reached a surface.
    ///
    /// Chat messages open (or retarget) their conversation's tab and switch
    /// to it; every other event is left to the notification service.
    pub fn route(&mut self, event: &ConversationEvent, factory: &mut dyn SurfaceFactory) -> bool {
        if !event.is_message() {
            trace!(conversation_id = %event.conversation_id, "event not routed");
            return false;
        }
        debug!(conversation_id = %event.conversation_id, "routing chat message");
        self.open_conversation(&event.conversation_id, true, factory);
        true
    }

    /// Opens the tab for `conversation_id` and shows the message view.
    ///
    /// With `switch` the tab becomes current; otherwise the current tab is
    /// kept.
    pub fn open_conversation(
        &mut self,
        conversation_id: &ConversationId,
        switch: bool,
        factory: &mut dyn SurfaceFactory,
    ) {
        let client = &self.client;
        let conversations = &self.conversations;
        let view = self.message_view.get_or_insert_with(|| {
            debug!("creating message view surface");
            factory.message_view(Arc::clone(client), Arc::clone(conversations))
        });

        if self.tabs.insert(conversation_id.clone()) {
            let title = self
                .conversations
                .get(conversation_id)
                .map(|state| conversation_title(&state, self.users.as_ref()))
                .unwrap_or_else(|| conversation_id.to_string());
            view.add_tab(conversation_id, &title);
        }
        if switch || self.tabs.current().is_none() {
            self.tabs.select(conversation_id);
            view.focus_tab(conversation_id);
        }
        view.show();
    }

    /// Closes a tab. Closing the last tab hides the message view.
    pub fn close_tab(&mut self, conversation_id: &ConversationId) {
        if !self.tabs.remove(conversation_id) {
            return;
        }
        if let Some(view) = self.message_view.as_mut() {
            view.remove_tab(conversation_id);
            if self.tabs.is_empty() {
                view.hide();
            } else if let Some(current) = self.tabs.current() {
                view.focus_tab(current);
            }
        }
    }

    pub fn tabs(&self) -> &ConversationTabs {
        &self.tabs
    }

    pub fn has_message_view(&self) -> bool {
        self.message_view.is_some()
    }

    pub fn has_conversation_list(&self) -> bool {
        self.conversation_list.is_some()
    }

    pub fn conversation_list_visible(&self) -> bool {
        self.conversation_list
            .as_ref()
            .map(|list| list.is_visible())
            .unwrap_or(false)
    }

    pub fn message_view_visible(&self) -> bool {
        self.message_view
            .as_ref()
            .map(|view| view.is_visible())
            .unwrap_or(false)
    }

    /// Hides every surface and unsubscribes from the event stream.
    pub(crate) fn teardown(mut self) {
        self.pump.abort();
        if let Some(list) = self.conversation_list.as_mut() {
            list.hide();
        }
        if let Some(view) = self.message_view.as_mut() {
            view.hide();
        }
        debug!(tabs = self.tabs.len(), "event router torn down");
    }
}

impl Drop for EventRouter {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
