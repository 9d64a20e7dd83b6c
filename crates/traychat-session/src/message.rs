//! Messages delivered to the session controller.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinError;
use traychat_auth::LoginOutcome;
use traychat_models::{ConversationEvent, ConversationId, Snapshot};

use crate::error::ClientError;
use crate::settings::Settings;

/// Tray menu entries handled by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Connect,
    Disconnect,
    About,
    Quit,
}

/// Input from the front-end or the operating system.
#[derive(Debug, Clone)]
pub enum UserInput {
    /// One activation of the tray icon (a single physical click).
    TrayActivated,
    /// A tray menu entry was chosen.
    Menu(MenuAction),
    /// The settings dialog was accepted.
    SettingsChanged(Settings),
    /// The user picked a conversation in the conversation list.
    OpenConversation {
        conversation_id: ConversationId,
        switch: bool,
    },
    /// The user closed a message-view tab.
    TabClosed(ConversationId),
    /// A termination signal arrived.
    Terminate,
}

/// Outcome of a spawned connect or disconnect task.
pub(crate) type TaskResult = std::result::Result<std::result::Result<(), ClientError>, JoinError>;

/// Everything the controller's inbox carries.
#[derive(Debug)]
pub(crate) enum SessionMessage {
    Input(UserInput),
    LoginFinished(LoginOutcome),
    Connected {
        epoch: u64,
        snapshot: Box<Snapshot>,
    },
    ConversationEvent {
        epoch: u64,
        event: ConversationEvent,
    },
    ConnectFinished {
        epoch: u64,
        result: TaskResult,
    },
    DisconnectFinished {
        result: TaskResult,
    },
    QuitAnswered(bool),
}

/// Cloneable sender for front-ends and signal handlers.
///
/// Every method returns false once the controller has stopped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionMessage>,
}

impl SessionHandle {
    pub(crate) fn new(tx: UnboundedSender<SessionMessage>) -> Self {
        Self { tx }
    }

    /// Sends arbitrary input.
    pub fn send(&self, input: UserInput) -> bool {
        self.tx.send(SessionMessage::Input(input)).is_ok()
    }

    pub fn tray_activated(&self) -> bool {
        self.send(UserInput::TrayActivated)
    }

    pub fn menu(&self, action: MenuAction) -> bool {
        self.send(UserInput::Menu(action))
    }

    pub fn change_settings(&self, settings: Settings) -> bool {
        self.send(UserInput::SettingsChanged(settings))
    }

    pub fn open_conversation(&self, conversation_id: ConversationId, switch: bool) -> bool {
        self.send(UserInput::OpenConversation {
            conversation_id,
            switch,
        })
    }

    pub fn close_tab(&self, conversation_id: ConversationId) -> bool {
        self.send(UserInput::TabClosed(conversation_id))
    }

    /// Requests a forced, confirmation-less quit.
    pub fn terminate(&self) -> bool {
        self.send(UserInput::Terminate)
    }
}
