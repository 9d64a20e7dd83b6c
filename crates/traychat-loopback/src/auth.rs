//! Loopback authentication service with a cookie store.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use traychat_auth::{AuthError, Authenticator, CredentialSource, Result};
use traychat_models::Cookies;

use crate::hub::LoopbackHub;

/// The one account a loopback service accepts.
#[derive(Clone)]
pub struct Account {
    pub email: String,
    pub password: String,
    /// Second-factor PIN; `None` skips the PIN challenge.
    pub pin: Option<String>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("pin", &self.pin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Account {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            pin: None,
        }
    }

    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }
}

/// Signs in against a [`LoopbackHub`].
///
/// Cookies stored at the cookie path are reused while the hub still accepts
/// them; otherwise the user is challenged and fresh cookies are stored.
pub struct LoopbackAuthenticator {
    hub: Arc<LoopbackHub>,
    account: Account,
}

impl LoopbackAuthenticator {
    pub fn new(hub: Arc<LoopbackHub>, account: Account) -> Self {
        Self { hub, account }
    }

    async fn challenge(&self, source: &dyn CredentialSource) -> Result<Cookies> {
        let credentials = source.credentials().await?;
        if !credentials.email.trim().eq_ignore_ascii_case(&self.account.email)
            || credentials.password != self.account.password
        {
            return Err(AuthError::InvalidCredentials(
                "wrong email or password".to_string(),
            ));
        }

        if let Some(expected) = &self.account.pin {
            let pin = source.pin().await?;
            if pin.trim() != expected {
                return Err(AuthError::InvalidCredentials("wrong PIN".to_string()));
            }
        }

        Ok(self.hub.issue_session())
    }
}

#[async_trait]
impl Authenticator for LoopbackAuthenticator {
    async fn get_auth(&self, source: &dyn CredentialSource, cookie_path: &Path) -> Result<Cookies> {
        match load_cookies(cookie_path) {
            Ok(Some(cookies)) if self.hub.accepts(&cookies) => {
                info!(path = %cookie_path.display(), "reusing stored session");
                return Ok(cookies);
            }
            Ok(Some(_)) => debug!("stored session expired"),
            Ok(None) => debug!("no stored session"),
            Err(e) => warn!(error = %e, "ignoring unreadable cookie store"),
        }

        let cookies = self.challenge(source).await?;
        save_cookies(cookie_path, &cookies)?;
        info!(path = %cookie_path.display(), "new session stored");
        Ok(cookies)
    }
}

/// Reads the cookie store; `None` if it does not exist.
pub fn load_cookies(path: &Path) -> Result<Option<Cookies>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path).map_err(|source| AuthError::CookieStore {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| AuthError::CookieStore {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
}

/// Writes the cookie store atomically.
pub fn save_cookies(path: &Path, cookies: &Cookies) -> Result<()> {
    let store_error = |source| AuthError::CookieStore {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(store_error)?;

    let json = serde_json::to_string_pretty(cookies)
        .map_err(|e| store_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(store_error)?;
    temp.write_all(json.as_bytes()).map_err(store_error)?;
    temp.persist(path).map_err(|e| store_error(e.error))?;
    Ok(())
}
