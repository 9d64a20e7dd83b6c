//! Core data models for TrayChat.
//!
//! This crate provides the plain data types shared by every TrayChat crate:
//! typed identifiers, the connect-time snapshot, conversation events, the
//! opaque cookie jar handed out by the authentication service and the shared
//! translation catalog.

pub mod cookies;
pub mod event;
pub mod i18n;
pub mod ids;
pub mod snapshot;

// Re-export main types
pub use cookies::Cookies;
pub use event::{ConversationEvent, ConversationEventKind, MembershipChange};
pub use i18n::Translator;
pub use ids::{ChatEventId, ConversationId, UserId};
pub use snapshot::{ConversationState, Entity, Participant, Snapshot};
