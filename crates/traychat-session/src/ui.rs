//! Seams to the desktop UI.
//!
//! The tray icon, its menu and the conversation windows are drawn by a
//! front-end; the controller only tells them what to show.

use std::sync::Arc;
use std::time::Duration;

use traychat_models::{ConversationId, Translator};

use crate::client::{ChatClient, ConversationList};
use crate::session::SessionStatus;

/// Tray icon glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIcon {
    Active,
    Disabled,
}

/// What the tray shows for a given session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub icon: TrayIcon,
    /// "Connect" menu action enabled.
    pub connect_enabled: bool,
    /// "Disconnect" menu action enabled.
    pub disconnect_enabled: bool,
}

impl Affordances {
    pub fn for_status(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Disconnected => Self {
                icon: TrayIcon::Disabled,
                connect_enabled: true,
                disconnect_enabled: false,
            },
            SessionStatus::Connecting => Self {
                icon: TrayIcon::Disabled,
                connect_enabled: false,
                disconnect_enabled: true,
            },
            SessionStatus::Connected => Self {
                icon: TrayIcon::Active,
                connect_enabled: false,
                disconnect_enabled: true,
            },
        }
    }
}

/// The tray icon and its context menu.
pub trait TrayShell: Send {
    /// Switches the icon glyph and menu action enablement.
    fn apply(&mut self, affordances: Affordances);

    /// Re-reads every label through `translator`.
    fn retranslate(&mut self, translator: &Translator);

    /// Shows a warning message box.
    fn warn(&mut self, title: &str, message: &str);

    /// Shows an informational message box.
    fn inform(&mut self, title: &str, message: &str);

    /// The platform double-click interval, if the shell knows it.
    fn double_click_interval(&self) -> Option<Duration> {
        None
    }
}

/// A window the controller can show or hide.
pub trait Surface: Send {
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
}

/// The tabbed message window; one tab per open conversation.
pub trait MessageView: Surface {
    /// Adds a tab for `conversation`.
    fn add_tab(&mut self, conversation: &ConversationId, title: &str);

    /// Removes the tab for `conversation`.
    fn remove_tab(&mut self, conversation: &ConversationId);

    /// Makes the tab for `conversation` current and gives it focus.
    fn focus_tab(&mut self, conversation: &ConversationId);
}

/// Creates the UI surfaces of a session.
pub trait SurfaceFactory: Send {
    fn conversation_list(
        &mut self,
        client: Arc<dyn ChatClient>,
        conversations: Arc<dyn ConversationList>,
    ) -> Box<dyn Surface>;

    fn message_view(
        &mut self,
        client: Arc<dyn ChatClient>,
        conversations: Arc<dyn ConversationList>,
    ) -> Box<dyn MessageView>;
}
