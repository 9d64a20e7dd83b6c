//! Session lifecycle for TrayChat.
//!
//! This crate provides:
//! - [`SessionController`] - the connect/disconnect state machine, driven by
//!   user input and the completions of its own background tasks
//! - [`EventRouter`] - turns conversation events into UI actions
//! - [`GestureDisambiguator`] - tells single from double tray clicks
//! - [`Observable`] - the observer registry the chat client exposes
//! - the seams to the chat-client library ([`ChatBackend`]) and to the UI
//!   toolkit ([`TrayShell`], [`SurfaceFactory`])
//!
//! Everything runs on one cooperative scheduler. Collaborator calls are
//! spawned as tasks and report back through the controller's inbox.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod message;
pub mod observer;
pub mod router;
pub mod session;
pub mod settings;
pub mod ui;

pub use client::{
    conversation_title, ChatBackend, ChatClient, ConversationList, Notifier, UserList,
};
pub use config::SessionConfig;
pub use controller::{Collaborators, SessionController};
pub use error::{ClientError, Result, SessionError};
pub use gesture::{GestureAction, GestureDisambiguator, GestureState};
pub use message::{MenuAction, SessionHandle, UserInput};
pub use observer::{Observable, Subscription};
pub use router::{ConversationTabs, EventRouter};
pub use session::{Session, SessionStatus};
pub use settings::{Settings, SettingsStore};
pub use ui::{Affordances, MessageView, Surface, SurfaceFactory, TrayIcon, TrayShell};
