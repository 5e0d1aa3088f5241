//! Read-only access to persisted user preferences.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::model::MapTheme;

/// Key holding the general settings blob.
pub const SETTINGS_KEY: &str = "opsdeck_settings";

/// Key/value source of persisted preferences. Values are raw strings.
pub trait PreferenceStore: Send {
    fn read(&self, key: &str) -> Option<String>;
}

/// One JSON file per key under a directory: `<dir>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PreferenceStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "preference not readable");
                None
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl PreferenceStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[derive(Deserialize)]
struct SettingsBlob {
    #[serde(default, rename = "mapTheme")]
    map_theme: Option<serde_json::Value>,
}

/// Map theme from the settings blob. Anything other than an explicit
/// `"animus"` falls back to the default theme.
pub fn load_map_theme(store: &dyn PreferenceStore) -> MapTheme {
    let Some(raw) = store.read(SETTINGS_KEY) else {
        return MapTheme::Division;
    };
    match serde_json::from_str::<SettingsBlob>(&raw) {
        Ok(SettingsBlob {
            map_theme: Some(serde_json::Value::String(theme)),
        }) if theme == "animus" => MapTheme::Animus,
        Ok(_) => MapTheme::Division,
        Err(e) => {
            debug!(error = %e, "malformed settings blob");
            MapTheme::Division
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme(raw: &str) -> MapTheme {
        load_map_theme(&MemoryStore::new().with(SETTINGS_KEY, raw))
    }

    #[test]
    fn test_animus_is_selected() {
        assert_eq!(theme(r#"{"mapTheme":"animus","units":"imperial"}"#), MapTheme::Animus);
    }

    #[test]
    fn test_everything_else_is_division() {
        assert_eq!(load_map_theme(&MemoryStore::new()), MapTheme::Division);
        assert_eq!(theme(r#"{"mapTheme":"division"}"#), MapTheme::Division);
        assert_eq!(theme(r#"{"mapTheme":"ANIMUS"}"#), MapTheme::Division);
        assert_eq!(theme(r#"{"mapTheme":7}"#), MapTheme::Division);
        assert_eq!(theme(r#"{}"#), MapTheme::Division);
        assert_eq!(theme("[1, 2]"), MapTheme::Division);
        assert_eq!(theme("{not json"), MapTheme::Division);
    }

    #[test]
    fn test_file_store_reads_key_file() {
        let dir = std::env::temp_dir().join(format!("opsdeck-prefs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = FileStore::new(&dir);
        assert_eq!(load_map_theme(&store), MapTheme::Division);

        std::fs::write(store.path_for(SETTINGS_KEY), r#"{"mapTheme":"animus"}"#).unwrap();
        assert_eq!(load_map_theme(&store), MapTheme::Animus);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
