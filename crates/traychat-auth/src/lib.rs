//! Credential and second-factor prompting for TrayChat.
//!
//! The external authentication service drives a two-step challenge: it asks
//! for email and password, and optionally for a second-factor PIN. This crate
//! provides:
//! - [`Prompter`] - a request/continuation channel for modal user prompts
//! - [`AuthenticationBridge`] - answers the service's challenges by issuing
//!   prompts to whatever front-end holds the receiving end of the channel
//! - [`Authenticator`] - the seam the authentication service plugs into
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use traychat_auth::{AuthenticationBridge, LoginOutcome, Prompter, PromptReply};
//!
//! let (prompter, mut requests) = Prompter::channel();
//! let bridge = AuthenticationBridge::new(Arc::new(prompter), translator);
//!
//! // Front-end side: answer every prompt.
//! tokio::spawn(async move {
//!     while let Some(request) = requests.recv().await {
//!         let answer = ask_the_user(&request.prompt);
//!         request.respond(answer);
//!     }
//! });
//!
//! match bridge.login(&authenticator, &cookie_path).await {
//!     LoginOutcome::Authenticated(cookies) => { /* connect */ }
//!     LoginOutcome::Cancelled => { /* silent */ }
//!     LoginOutcome::Failed(e) => { /* warn the user */ }
//! }
//! ```

pub mod bridge;
pub mod error;
pub mod prompt;

pub use bridge::{AuthenticationBridge, Authenticator, CredentialSource, Credentials, LoginOutcome};
pub use error::{AuthError, Result};
pub use prompt::{Prompt, PromptKind, PromptReply, PromptRequest, Prompter};
