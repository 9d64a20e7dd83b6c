//! Shared state of one loopback service.
//!
//! The hub is what the authenticator, the clients and the test/console
//! controls have in common: the issued session cookies, the live connection
//! and the counters.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::Notify;
use tracing::{debug, info};
use traychat_models::{ConversationEvent, ConversationId, Cookies, UserId};
use uuid::Uuid;

use crate::collections::LoopbackConversations;
use crate::directory::Directory;

/// Name of the session cookie minted by the authenticator.
pub const SESSION_COOKIE: &str = "SID";

#[derive(Default)]
struct Live {
    closer: Option<Arc<Notify>>,
    conversations: Option<Weak<LoopbackConversations>>,
}

/// Counters of a hub's connection activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub connects: usize,
    pub disconnects: usize,
    pub delivered: usize,
}

/// One in-process chat service.
pub struct LoopbackHub {
    directory: Directory,
    sessions: Mutex<HashSet<String>>,
    live: Mutex<Live>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    delivered: AtomicUsize,
}

impl LoopbackHub {
    pub fn new(directory: Directory) -> Arc<Self> {
        Arc::new(Self {
            directory,
            sessions: Mutex::new(HashSet::new()),
            live: Mutex::new(Live::default()),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            delivered: AtomicUsize::new(0),
        })
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Mints a new session cookie.
    pub fn issue_session(&self) -> Cookies {
        let sid = Uuid::new_v4().to_string();
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(sid.clone());
        }
        let mut cookies = Cookies::new();
        cookies.insert(SESSION_COOKIE, sid);
        cookies
    }

    /// Returns true if `cookies` carry a session this hub issued.
    pub fn accepts(&self, cookies: &Cookies) -> bool {
        let Some(sid) = cookies.get(SESSION_COOKIE) else {
            return false;
        };
        self.sessions
            .lock()
            .map(|sessions| sessions.contains(sid))
            .unwrap_or(false)
    }

    /// Forgets every issued session; stored cookies stop working.
    pub fn revoke_sessions(&self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.clear();
        }
    }

    /// Delivers an event to the live conversation list.
    ///
    /// Returns false when nobody is connected.
    pub fn deliver(&self, event: ConversationEvent) -> bool {
        let conversations = self
            .live
            .lock()
            .ok()
            .and_then(|live| live.conversations.as_ref().and_then(Weak::upgrade));
        match conversations {
            Some(conversations) => {
                conversations.apply(event);
                self.delivered.fetch_add(1, Ordering::SeqCst);
                true
            }
            None => {
                debug!("no live connection, event dropped");
                false
            }
        }
    }

    /// Delivers a chat message from `sender` to `conversation_id`.
    pub fn send_message(
        &self,
        conversation_id: impl Into<ConversationId>,
        sender: impl Into<UserId>,
        text: impl Into<String>,
    ) -> bool {
        self.deliver(ConversationEvent::chat_message(conversation_id, sender, text))
    }

    /// Ends the live connection from the service side.
    pub fn drop_connection(&self) -> bool {
        let closer = self.live.lock().ok().and_then(|mut live| {
            live.conversations = None;
            live.closer.take()
        });
        match closer {
            Some(closer) => {
                info!("dropping live connection");
                closer.notify_one();
                true
            }
            None => false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.live
            .lock()
            .map(|live| live.closer.is_some())
            .unwrap_or(false)
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            connects: self.connects.load(Ordering::SeqCst),
            disconnects: self.disconnects.load(Ordering::SeqCst),
            delivered: self.delivered.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn attach(&self, closer: Arc<Notify>) {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut live) = self.live.lock() {
            // A newer connection replaces the old one, as a real service would.
            if let Some(previous) = live.closer.replace(closer) {
                previous.notify_one();
            }
            live.conversations = None;
        }
    }

    pub(crate) fn attach_conversations(&self, conversations: &Arc<LoopbackConversations>) {
        if let Ok(mut live) = self.live.lock() {
            live.conversations = Some(Arc::downgrade(conversations));
        }
    }

    pub(crate) fn detach(&self, closer: &Arc<Notify>) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut live) = self.live.lock() {
            if live
                .closer
                .as_ref()
                .map(|current| Arc::ptr_eq(current, closer))
                .unwrap_or(false)
            {
                live.closer = None;
                live.conversations = None;
            }
        }
    }
}
