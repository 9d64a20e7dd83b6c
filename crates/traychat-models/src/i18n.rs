//! Translation catalogs.
//!
//! A catalog is a flat JSON object mapping source strings to their
//! translation, stored as `traychat_<lang>.json` in the languages directory.
//! [`Translator`] is a cheap-to-clone handle: the session controller owns the
//! rebinding, every other holder only looks strings up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

/// File name prefix of translation catalogs.
pub const CATALOG_PREFIX: &str = "traychat";

/// Language used when neither the settings nor the environment name one.
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug)]
struct Catalog {
    language: String,
    entries: HashMap<String, String>,
}

/// Shared handle to the process-wide translation catalog.
#[derive(Debug, Clone)]
pub struct Translator {
    inner: Arc<RwLock<Catalog>>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    /// Creates a translator bound to the identity translation.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Catalog {
                language: DEFAULT_LANGUAGE.to_string(),
                entries: HashMap::new(),
            })),
        }
    }

    /// Creates a translator and binds it to `language`.
    pub fn load(dir: &Path, language: &str) -> Self {
        let translator = Self::new();
        translator.rebind(dir, language);
        translator
    }

    /// Rebinds every clone of this handle to `language`.
    ///
    /// Returns true if a catalog was found. A missing or unreadable catalog
    /// binds the identity translation.
    pub fn rebind(&self, dir: &Path, language: &str) -> bool {
        let path = catalog_path(dir, language);
        let entries = if path.is_file() {
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| {
                    serde_json::from_str::<HashMap<String, String>>(&s).map_err(|e| e.to_string())
                }) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Failed to load translation catalog");
                    None
                }
            }
        } else {
            debug!(path = %path.display(), "No translation catalog, using source strings");
            None
        };

        let found = entries.is_some();
        if let Ok(mut catalog) = self.inner.write() {
            catalog.language = language.to_string();
            catalog.entries = entries.unwrap_or_default();
        }
        found
    }

    /// Translates `source`, falling back to the source string itself.
    pub fn tr(&self, source: &str) -> String {
        self.inner
            .read()
            .ok()
            .and_then(|catalog| catalog.entries.get(source).cloned())
            .unwrap_or_else(|| source.to_string())
    }

    /// Returns the language the translator is currently bound to.
    pub fn language(&self) -> String {
        self.inner
            .read()
            .map(|catalog| catalog.language.clone())
            .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string())
    }
}

/// Path of the catalog for `language` inside `dir`.
pub fn catalog_path(dir: &Path, language: &str) -> PathBuf {
    dir.join(format!("{}_{}.json", CATALOG_PREFIX, language))
}

/// Language of the process environment (`LC_ALL`, `LC_MESSAGES`, `LANG`).
pub fn system_language() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|locale| language_from_locale(&locale))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// Extracts the language part of a POSIX locale name (`cs_CZ.UTF-8` -> `cs`).
pub fn language_from_locale(locale: &str) -> Option<String> {
    let language = locale
        .split(|c| c == '_' || c == '.' || c == '@')
        .next()
        .unwrap_or("")
        .trim();

    if language.is_empty() || language == "C" || language == "POSIX" {
        return None;
    }
    Some(language.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_catalog(dir: &Path, language: &str, json: &str) {
        std::fs::write(catalog_path(dir, language), json).unwrap();
    }

    #[test]
    fn test_identity_without_catalog() {
        let dir = tempdir().unwrap();
        let translator = Translator::load(dir.path(), "fr");

        assert_eq!(translator.language(), "fr");
        assert_eq!(translator.tr("&Connect"), "&Connect");
    }

    #[test]
    fn test_catalog_lookup() {
        let dir = tempdir().unwrap();
        write_catalog(dir.path(), "cs", r#"{"&Connect": "&Připojit"}"#);

        let translator = Translator::load(dir.path(), "cs");
        assert_eq!(translator.tr("&Connect"), "&Připojit");
        assert_eq!(translator.tr("&Quit"), "&Quit");
    }

    #[test]
    fn test_rebind_is_seen_by_clones() {
        let dir = tempdir().unwrap();
        write_catalog(dir.path(), "de", r#"{"&Quit": "&Beenden"}"#);

        let translator = Translator::new();
        let clone = translator.clone();

        assert!(translator.rebind(dir.path(), "de"));
        assert_eq!(clone.tr("&Quit"), "&Beenden");
        assert_eq!(clone.language(), "de");

        assert!(!translator.rebind(dir.path(), "en"));
        assert_eq!(clone.tr("&Quit"), "&Quit");
    }

    #[test]
    fn test_invalid_catalog_falls_back() {
        let dir = tempdir().unwrap();
        write_catalog(dir.path(), "cs", "not json");

        let translator = Translator::load(dir.path(), "cs");
        assert_eq!(translator.tr("&Connect"), "&Connect");
    }

    #[test]
    fn test_language_from_locale() {
        assert_eq!(language_from_locale("cs_CZ.UTF-8"), Some("cs".to_string()));
        assert_eq!(language_from_locale("de"), Some("de".to_string()));
        assert_eq!(language_from_locale("sr@latin"), Some("sr".to_string()));
        assert_eq!(language_from_locale("C"), None);
        assert_eq!(language_from_locale("POSIX"), None);
        assert_eq!(language_from_locale(""), None);
    }
}
