//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the session controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie store handed to the authentication service.
    pub cookie_path: PathBuf,
    /// Directory holding `traychat_<lang>.json` catalogs.
    pub languages_dir: PathBuf,
    /// Double-click interval used when the tray shell does not report one.
    pub double_click_interval: Duration,
    /// How long a quitting controller waits for in-flight disconnects.
    pub shutdown_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_path: PathBuf::from("cookies.json"),
            languages_dir: PathBuf::from("languages"),
            double_click_interval: Duration::from_millis(400),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

impl SessionConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cookie store path.
    pub fn with_cookie_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Sets the translation catalog directory.
    pub fn with_languages_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.languages_dir = dir.into();
        self
    }

    /// Sets the fallback double-click interval.
    pub fn with_double_click_interval(mut self, interval: Duration) -> Self {
        self.double_click_interval = interval;
        self
    }

    /// Sets the shutdown grace period.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}
