//! Desktop notifications for incoming messages.

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use traychat_models::ConversationEvent;
use traychat_session::{conversation_title, ConversationList, Notifier, UserList};

/// A notification as it would pop up on the desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Conversation title.
    pub title: String,
    /// `"<sender>: <text>"`.
    pub body: String,
}

/// Raises a notification for every chat message not sent by the signed-in
/// user.
pub struct LoopbackNotifier {
    shown: Arc<Mutex<Vec<Notification>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LoopbackNotifier {
    /// Subscribes to `conversations` and starts notifying.
    pub fn start(conversations: Arc<dyn ConversationList>, users: Arc<dyn UserList>) -> Self {
        let shown = Arc::new(Mutex::new(Vec::new()));
        let mut events = conversations.on_event();
        let task = tokio::spawn({
            let shown = Arc::clone(&shown);
            async move {
                while let Some(event) = events.next().await {
                    if let Some(notification) =
                        notification_for(&event, conversations.as_ref(), users.as_ref())
                    {
                        info!(title = %notification.title, body = %notification.body, "notification");
                        if let Ok(mut shown) = shown.lock() {
                            shown.push(notification);
                        }
                    }
                }
            }
        });

        Self {
            shown,
            task: Mutex::new(Some(task)),
        }
    }

    /// Notifications raised so far.
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.task.lock().map(|t| t.is_none()).unwrap_or(true)
    }
}

impl Notifier for LoopbackNotifier {
    fn close(&self) {
        if let Some(task) = self.task.lock().ok().and_then(|mut t| t.take()) {
            debug!("notifier closed");
            task.abort();
        }
    }
}

impl Drop for LoopbackNotifier {
    fn drop(&mut self) {
        self.close();
    }
}

fn notification_for(
    event: &ConversationEvent,
    conversations: &dyn ConversationList,
    users: &dyn UserList,
) -> Option<Notification> {
    let text = event.text()?;
    if event.sender == users.self_user().id {
        return None;
    }

    let sender = users
        .get(&event.sender)
        .map(|user| user.display_name)
        .unwrap_or_else(|| event.sender.to_string());
    let title = conversations
        .get(&event.conversation_id)
        .map(|state| conversation_title(&state, users))
        .unwrap_or_else(|| event.conversation_id.to_string());

    Some(Notification {
        title,
        body: format!("{sender}: {text}"),
    })
}
