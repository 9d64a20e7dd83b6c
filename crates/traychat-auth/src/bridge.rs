//! Bridge between the authentication service and the user.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use traychat_models::{Cookies, Translator};

use crate::error::{AuthError, Result};
use crate::prompt::{Prompt, PromptReply, Prompter};

/// Email and password entered by the user.
///
/// Never persisted; handed to the authentication service and dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Answers the challenges of an authentication flow.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Step one: email and password.
    async fn credentials(&self) -> Result<Credentials>;

    /// Step two, only when the service asks for a second factor.
    async fn pin(&self) -> Result<String>;
}

/// The external authentication service.
///
/// Implementations may satisfy a login from the cookie store at
/// `cookie_path` without consulting `source` at all. They must propagate
/// [`AuthError::Cancelled`] from `source` unchanged and report rejected
/// credentials as [`AuthError::InvalidCredentials`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn get_auth(&self, source: &dyn CredentialSource, cookie_path: &Path) -> Result<Cookies>;
}

/// How a login attempt ended, from the session's point of view.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Cookies for the chat client.
    Authenticated(Cookies),
    /// The user dismissed a prompt. Nothing to report.
    Cancelled,
    /// The login failed and the user should be warned.
    Failed(AuthError),
}

/// Presents credential and PIN prompts on behalf of the authentication service.
#[derive(Clone)]
pub struct AuthenticationBridge {
    prompter: Arc<Prompter>,
    translator: Translator,
}

impl AuthenticationBridge {
    /// Creates a bridge issuing its prompts through `prompter`.
    pub fn new(prompter: Arc<Prompter>, translator: Translator) -> Self {
        Self {
            prompter,
            translator,
        }
    }

    /// Returns the prompter shared with other modal requests.
    pub fn prompter(&self) -> &Arc<Prompter> {
        &self.prompter
    }

    /// Runs the authentication flow and classifies its result.
    pub async fn login(&self, authenticator: &dyn Authenticator, cookie_path: &Path) -> LoginOutcome {
        match authenticator.get_auth(self, cookie_path).await {
            Ok(cookies) => {
                info!(cookies = cookies.len(), "authenticated");
                LoginOutcome::Authenticated(cookies)
            }
            Err(AuthError::Cancelled) => {
                debug!("authentication cancelled");
                LoginOutcome::Cancelled
            }
            Err(e) => {
                warn!(error = %e, "authentication failed");
                LoginOutcome::Failed(e)
            }
        }
    }

    async fn ask_value(&self, prompt: Prompt) -> Result<String> {
        match self.prompter.ask(prompt).await? {
            PromptReply::Value(value) => Ok(value),
            PromptReply::Accepted | PromptReply::Cancelled => Err(AuthError::Cancelled),
        }
    }
}

#[async_trait]
impl CredentialSource for AuthenticationBridge {
    async fn credentials(&self) -> Result<Credentials> {
        let tr = |s: &str| self.translator.tr(s);

        let email = self
            .ask_value(Prompt::text(tr("TrayChat - Email"), tr("Email:")))
            .await?;
        let password = self
            .ask_value(Prompt::secret(tr("TrayChat - Password"), tr("Password:")))
            .await?;

        Ok(Credentials { email, password })
    }

    async fn pin(&self) -> Result<String> {
        self.ask_value(Prompt::secret(
            self.translator.tr("TrayChat - PIN"),
            self.translator.tr("PIN:"),
        ))
        .await
    }
}
