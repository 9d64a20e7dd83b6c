//! In-process chat service for TrayChat.
//!
//! A [`LoopbackHub`] plays the remote chat service: it issues session
//! cookies, holds the one live connection and lets callers inject
//! conversation events. [`LoopbackBackend`] and [`LoopbackAuthenticator`]
//! plug it into the session controller.
//!
//! # Example
//!
//! ```ignore
//! let hub = LoopbackHub::new(Directory::demo());
//! let backend = Arc::new(LoopbackBackend::new(hub.clone()));
//! let authenticator = Arc::new(LoopbackAuthenticator::new(
//!     hub.clone(),
//!     Account::new("me@example.com", "secret"),
//! ));
//!
//! // ... once connected:
//! hub.send_message("team", "alice", "lunch?");
//! ```

pub mod auth;
pub mod backend;
pub mod client;
pub mod collections;
pub mod directory;
pub mod hub;
pub mod notifier;

pub use auth::{Account, LoopbackAuthenticator};
pub use backend::LoopbackBackend;
pub use client::LoopbackClient;
pub use collections::{LoopbackConversations, LoopbackUsers};
pub use directory::Directory;
pub use hub::{HubStats, LoopbackHub, SESSION_COOKIE};
pub use notifier::{LoopbackNotifier, Notification};
