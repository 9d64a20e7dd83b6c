//! Default file locations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Application directory name below the platform data/config dirs.
pub const APP_DIR: &str = "TrayChat";

/// Overrides the platform data dir.
pub const DATA_DIR_ENV: &str = "TRAYCHAT_DATA_DIR";

/// Overrides the platform config dir.
pub const CONFIG_DIR_ENV: &str = "TRAYCHAT_CONFIG_DIR";

/// A directory that could not be created.
#[derive(Debug, Error)]
#[error("{}: {source}", .path.display())]
pub struct DirectoryError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Every file the application touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub log_file: PathBuf,
    pub cookie_file: PathBuf,
    pub settings_file: PathBuf,
    pub languages_dir: PathBuf,
}

impl Paths {
    pub fn default_locations() -> Self {
        let data = data_dir();
        let config = config_dir();
        Self {
            log_file: data.join("traychat.log"),
            cookie_file: data.join("cookies.json"),
            settings_file: config.join("settings.json"),
            languages_dir: default_languages_dir(),
        }
    }

    /// Creates the parent directories of the log, cookie and settings files.
    pub fn ensure_dirs(&self) -> Result<(), DirectoryError> {
        for file in [&self.log_file, &self.cookie_file, &self.settings_file] {
            if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|source| DirectoryError {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// `<data dir>/TrayChat`.
pub fn data_dir() -> PathBuf {
    base_dir(DATA_DIR_ENV, dirs::data_dir).join(APP_DIR)
}

/// `<config dir>/TrayChat`.
pub fn config_dir() -> PathBuf {
    base_dir(CONFIG_DIR_ENV, dirs::config_dir).join(APP_DIR)
}

/// Loads `<config dir>/TrayChat/.env` into the environment, if present.
///
/// Returns the path that was loaded.
pub fn load_env_file() -> Option<PathBuf> {
    let path = config_dir().join(".env");
    dotenvy::from_path(&path).ok().map(|()| path)
}

fn base_dir(env: &str, platform: fn() -> Option<PathBuf>) -> PathBuf {
    std::env::var_os(env)
        .map(PathBuf::from)
        .or_else(platform)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `languages/` next to the executable, falling back to the working dir.
fn default_languages_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join("languages"))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("languages"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dirs_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            log_file: dir.path().join("data/traychat.log"),
            cookie_file: dir.path().join("data/cookies.json"),
            settings_file: dir.path().join("config/settings.json"),
            languages_dir: dir.path().join("languages"),
        };

        paths.ensure_dirs().unwrap();

        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("config").is_dir());
    }

    #[test]
    fn test_ensure_dirs_reports_failing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let paths = Paths {
            log_file: blocker.join("traychat.log"),
            cookie_file: dir.path().join("cookies.json"),
            settings_file: dir.path().join("settings.json"),
            languages_dir: dir.path().join("languages"),
        };

        let err = paths.ensure_dirs().unwrap_err();

        assert_eq!(err.path, blocker);
        assert!(err.to_string().starts_with(&blocker.display().to_string()));
    }

    #[test]
    fn test_default_locations_use_app_dir() {
        let paths = Paths::default_locations();

        assert!(paths.log_file.ends_with("TrayChat/traychat.log"));
        assert!(paths.cookie_file.ends_with("TrayChat/cookies.json"));
        assert!(paths.settings_file.ends_with("TrayChat/settings.json"));
    }
}
