//! Command-line interface definition using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::paths::Paths;

/// TrayChat - chat client living in the system tray
#[derive(Parser, Debug)]
#[command(name = "traychat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug messages
    #[arg(short, long)]
    pub debug: bool,

    /// Log file [default: <data dir>/TrayChat/traychat.log]
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Cookie store [default: <data dir>/TrayChat/cookies.json]
    #[arg(long, value_name = "PATH")]
    pub cookies: Option<PathBuf>,

    /// Settings file [default: <config dir>/TrayChat/settings.json]
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Directory with translation catalogs [default: ./languages]
    #[arg(long, value_name = "DIR")]
    pub languages: Option<PathBuf>,

    /// Email of the loopback account
    #[arg(long, env = "TRAYCHAT_EMAIL", default_value = "me@example.com")]
    pub email: String,

    /// Password of the loopback account
    #[arg(long, env = "TRAYCHAT_PASSWORD", default_value = "secret", hide_env_values = true)]
    pub password: String,

    /// Second-factor PIN of the loopback account
    #[arg(long, env = "TRAYCHAT_PIN", hide_env_values = true)]
    pub pin: Option<String>,
}

impl Cli {
    /// Resolves every path, letting explicit flags win over the defaults.
    pub fn paths(&self) -> Paths {
        let mut paths = Paths::default_locations();
        if let Some(log) = &self.log {
            paths.log_file = log.clone();
        }
        if let Some(cookies) = &self.cookies {
            paths.cookie_file = cookies.clone();
        }
        if let Some(settings) = &self.settings {
            paths.settings_file = settings.clone();
        }
        if let Some(languages) = &self.languages {
            paths.languages_dir = languages.clone();
        }
        paths
    }

    /// Filter directives used when `RUST_LOG` is not set.
    pub fn log_directives(&self) -> &'static str {
        if self.debug {
            "traychat=debug,traychat_session=debug,traychat_auth=debug,traychat_loopback=debug,traychat_models=debug"
        } else {
            "warn"
        }
    }
}
