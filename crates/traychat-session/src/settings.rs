//! Persisted user settings.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use traychat_models::i18n::system_language;

use crate::error::{Result, SessionError};

/// User settings edited through the settings dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// UI language; `None` follows the system locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Settings {
    /// Settings with an explicit language.
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
        }
    }

    /// The language to bind the translator to.
    pub fn language(&self) -> String {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(system_language)
    }
}

/// JSON settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings; a missing file yields the defaults.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }
        let data = fs::read_to_string(&self.path).map_err(|source| SessionError::Settings {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Saves the settings atomically (temp file + rename).
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let settings_error = |source| SessionError::Settings {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(settings_error)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(settings_error)?;
        temp.write_all(json.as_bytes()).map_err(settings_error)?;
        temp.flush().map_err(settings_error)?;
        temp.persist(&self.path)
            .map_err(|e| settings_error(e.error))?;

        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));

        store.save(&Settings::with_language("cs")).unwrap();
        assert_eq!(store.load().unwrap().language.as_deref(), Some("cs"));
    }

    #[test]
    fn test_invalid_file_is_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let result = SettingsStore::new(&path).load();
        assert!(matches!(result, Err(SessionError::Json(_))));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"language": "de", "theme": "dark"}"#).unwrap();

        let settings = SettingsStore::new(&path).load().unwrap();
        assert_eq!(settings.language(), "de");
    }

    #[test]
    fn test_explicit_language_wins() {
        assert_eq!(Settings::with_language(" cs ").language(), "cs");
    }

    #[test]
    fn test_blank_language_follows_system() {
        let settings = Settings::with_language("  ");
        assert_eq!(settings.language(), system_language());
        assert_eq!(Settings::default().language(), system_language());
    }
}
