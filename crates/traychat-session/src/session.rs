//! The single live session and its handles.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::client::{ChatClient, ConversationList, Notifier, UserList};

/// Connection state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Disconnected => write!(f, "disconnected"),
            SessionStatus::Connecting => write!(f, "connecting"),
            SessionStatus::Connected => write!(f, "connected"),
        }
    }
}

/// The session's handles.
///
/// - Disconnected: no handles
/// - Connecting: the client handle only
/// - Connected: client, conversations, users and notifier
pub struct Session {
    status: SessionStatus,
    client: Option<Arc<dyn ChatClient>>,
    conversations: Option<Arc<dyn ConversationList>>,
    users: Option<Arc<dyn UserList>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status)
            .field("client", &self.client.is_some())
            .field("conversations", &self.conversations.is_some())
            .field("users", &self.users.is_some())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a disconnected session.
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            client: None,
            conversations: None,
            users: None,
            notifier: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns true while connecting or connected.
    pub fn is_active(&self) -> bool {
        self.status != SessionStatus::Disconnected
    }

    pub fn client(&self) -> Option<&Arc<dyn ChatClient>> {
        self.client.as_ref()
    }

    pub fn conversations(&self) -> Option<&Arc<dyn ConversationList>> {
        self.conversations.as_ref()
    }

    pub fn users(&self) -> Option<&Arc<dyn UserList>> {
        self.users.as_ref()
    }

    pub fn notifier(&self) -> Option<&Arc<dyn Notifier>> {
        self.notifier.as_ref()
    }

    /// Checks that the handles present match the status.
    pub fn is_consistent(&self) -> bool {
        let collections = [
            self.conversations.is_some(),
            self.users.is_some(),
            self.notifier.is_some(),
        ];
        match self.status {
            SessionStatus::Disconnected => self.client.is_none() && collections.iter().all(|p| !p),
            SessionStatus::Connecting => self.client.is_some() && collections.iter().all(|p| !p),
            SessionStatus::Connected => self.client.is_some() && collections.iter().all(|p| *p),
        }
    }

    /// Disconnected -> Connecting. Returns false from any other state.
    pub(crate) fn begin(&mut self, client: Arc<dyn ChatClient>) -> bool {
        if self.status != SessionStatus::Disconnected {
            return false;
        }
        self.client = Some(client);
        self.status = SessionStatus::Connecting;
        debug!(status = %self.status, "session transition");
        true
    }

    /// Connecting -> Connected. Returns false from any other state.
    pub(crate) fn establish(
        &mut self,
        conversations: Arc<dyn ConversationList>,
        users: Arc<dyn UserList>,
        notifier: Arc<dyn Notifier>,
    ) -> bool {
        if self.status != SessionStatus::Connecting {
            return false;
        }
        self.conversations = Some(conversations);
        self.users = Some(users);
        self.notifier = Some(notifier);
        self.status = SessionStatus::Connected;
        debug!(status = %self.status, "session transition");
        true
    }

    /// Any state -> Disconnected, handing back the client for disconnecting.
    pub(crate) fn release(&mut self) -> Option<Arc<dyn ChatClient>> {
        if let Some(notifier) = self.notifier.take() {
            notifier.close();
        }
        self.conversations = None;
        self.users = None;
        self.status = SessionStatus::Disconnected;
        debug!(status = %self.status, "session transition");
        self.client.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::observer::{Observable, Subscription};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use traychat_models::{ConversationEvent, ConversationId, ConversationState, Entity, Snapshot, UserId};

    struct NullClient;

    #[async_trait]
    impl ChatClient for NullClient {
        async fn connect(&self) -> Result<(), ClientError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), ClientError> {
            Ok(())
        }

        fn on_connect(&self) -> Subscription<Snapshot> {
            Observable::new().subscribe()
        }
    }

    struct NullUsers;

    impl UserList for NullUsers {
        fn self_user(&self) -> Entity {
            Entity::new("me", "Me")
        }

        fn get(&self, _id: &UserId) -> Option<Entity> {
            None
        }
    }

    struct NullConversations;

    impl ConversationList for NullConversations {
        fn on_event(&self) -> Subscription<ConversationEvent> {
            Observable::new().subscribe()
        }

        fn get(&self, _id: &ConversationId) -> Option<ConversationState> {
            None
        }

        fn conversations(&self) -> Vec<ConversationState> {
            Vec::new()
        }
    }

    #[derive(Default)]
    struct FlagNotifier {
        closed: AtomicBool,
    }

    impl Notifier for FlagNotifier {
        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let session = Session::new();
        assert_eq!(session.status(), SessionStatus::Disconnected);
        assert!(!session.is_active());
        assert!(session.is_consistent());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = Session::new();

        assert!(session.begin(Arc::new(NullClient)));
        assert_eq!(session.status(), SessionStatus::Connecting);
        assert!(session.client().is_some());
        assert!(session.conversations().is_none());
        assert!(session.is_consistent());

        let notifier = Arc::new(FlagNotifier::default());
        assert!(session.establish(
            Arc::new(NullConversations),
            Arc::new(NullUsers),
            notifier.clone(),
        ));
        assert_eq!(session.status(), SessionStatus::Connected);
        assert!(session.is_consistent());

        let client = session.release();
        assert!(client.is_some());
        assert!(notifier.closed.load(Ordering::SeqCst));
        assert_eq!(session.status(), SessionStatus::Disconnected);
        assert!(session.client().is_none());
        assert!(session.users().is_none());
        assert!(session.notifier().is_none());
        assert!(session.is_consistent());
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut session = Session::new();
        assert!(!session.establish(
            Arc::new(NullConversations),
            Arc::new(NullUsers),
            Arc::new(FlagNotifier::default()),
        ));
        assert_eq!(session.status(), SessionStatus::Disconnected);

        assert!(session.begin(Arc::new(NullClient)));
        assert!(!session.begin(Arc::new(NullClient)));
        assert_eq!(session.status(), SessionStatus::Connecting);
    }

    #[test]
    fn test_release_while_connecting() {
        let mut session = Session::new();
        session.begin(Arc::new(NullClient));

        assert!(session.release().is_some());
        assert_eq!(session.status(), SessionStatus::Disconnected);
        assert!(session.is_consistent());
    }

    #[test]
    fn test_release_when_disconnected_returns_nothing() {
        let mut session = Session::new();
        assert!(session.release().is_none());
        assert!(session.is_consistent());
    }
}
