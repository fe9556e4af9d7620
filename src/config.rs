use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const THEME: &str = "theme";
pub const VIBRANCY: &str = "vibrancy";
pub const SIDEBAR: &str = "sidebar";
pub const EMOJI_STYLE: &str = "emojiStyle";
pub const USE_WORK_CHAT: &str = "useWorkChat";
pub const ALWAYS_ON_TOP: &str = "alwaysOnTop";
pub const SHOW_ALWAYS_ON_TOP_PROMPT: &str = "showAlwaysOnTopPrompt";
pub const PRIVATE_MODE: &str = "privateMode";
pub const SHOW_PRIVATE_MODE_PROMPT: &str = "showPrivateModePrompt";
pub const SPELL_CHECKER: &str = "isSpellCheckerEnabled";
pub const SHOW_TRAY_ICON: &str = "showTrayIcon";
pub const LAUNCH_MINIMIZED: &str = "launchMinimized";
pub const AUTO_HIDE_MENU_BAR: &str = "autoHideMenuBar";

/// Defaults for every boolean key the menu reads. A key that is absent or
/// holds a non-boolean value reads as its entry here.
pub const DEFAULT_FLAGS: &[(&str, bool)] = &[
    (USE_WORK_CHAT, false),
    ("block.chatSeen", false),
    ("block.typingIndicator", false),
    ("block.deliveryReceipt", false),
    ("bounceDockOnMessage", false),
    ("autoplayVideos", true),
    ("notificationMessagePreview", true),
    ("notificationsMuted", false),
    ("callRingtoneMuted", false),
    ("showUnreadBadge", true),
    (SPELL_CHECKER, true),
    ("hardwareAcceleration", true),
    ("menuBarMode", false),
    (ALWAYS_ON_TOP, false),
    (SHOW_ALWAYS_ON_TOP_PROMPT, true),
    (PRIVATE_MODE, false),
    (SHOW_PRIVATE_MODE_PROMPT, true),
    (AUTO_HIDE_MENU_BAR, false),
    ("autoUpdate", true),
    ("flashWindowOnMessage", true),
    (SHOW_TRAY_ICON, true),
    (LAUNCH_MINIMIZED, false),
    ("quitOnWindowClose", false),
    ("showMessageButtons", true),
];

pub fn default_flag(key: &str) -> bool {
    DEFAULT_FLAGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable key-value settings read on every rebuild and written by click
/// handlers.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError>;
    fn clear(&mut self) -> Result<(), ConfigError>;
    fn entries(&self) -> BTreeMap<String, Value>;

    /// Backing file, created empty if missing. `None` for stores without one.
    fn backing_file(&self) -> Result<Option<PathBuf>, ConfigError> {
        Ok(None)
    }

    fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            _ => default_flag(key),
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), ConfigError> {
        self.set(key, Value::Bool(value))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ConfigError> {
        self.values.clear();
        Ok(())
    }

    fn entries(&self) -> BTreeMap<String, Value> {
        self.values.clone()
    }
}

/// A flat JSON object on disk, rewritten on every mutation.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_object_or_empty(&path);
        debug!(path = %path.display(), keys = values.len(), "config loaded");
        Self { path, values }
    }

    /// Writes `{}` when the file does not exist yet so it can be opened in an
    /// editor.
    pub fn ensure_exists(&self) -> Result<&Path, ConfigError> {
        if !self.path.exists() {
            write_object(&self.path, &self.values)?;
        }
        Ok(&self.path)
    }

    /// Writes `values` to disk and adopts them only once the write succeeded.
    fn commit(&mut self, values: Map<String, Value>) -> Result<(), ConfigError> {
        write_object(&self.path, &values)?;
        self.values = values;
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut next = self.values.clone();
        next.insert(key.to_string(), value);
        self.commit(next)
    }

    fn clear(&mut self) -> Result<(), ConfigError> {
        self.commit(Map::new())
    }

    fn entries(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn backing_file(&self) -> Result<Option<PathBuf>, ConfigError> {
        self.ensure_exists().map(|p| Some(p.to_path_buf()))
    }
}

fn write_object(path: &Path, values: &Map<String, Value>) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut s = serde_json::to_string_pretty(values)?;
    s.push('\n');
    fs::write(path, s.as_bytes()).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_object_or_empty(path: &Path) -> Map<String, Value> {
    if !path.exists() {
        return Map::new();
    }

    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "reading config failed, using defaults");
            return Map::new();
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!(path = %path.display(), "config root is not a JSON object, using defaults");
            Map::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "parsing config failed, using defaults");
            Map::new()
        }
    }
}

pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = env::var("CAPRINE_CONFIG") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    if let Some(appdata) = env::var_os("APPDATA") {
        return Some(PathBuf::from(appdata).join("Caprine").join("config.json"));
    }

    if let Some(home) = env::var_os("HOME") {
        return Some(
            PathBuf::from(home)
                .join(".config")
                .join("Caprine")
                .join("config.json"),
        );
    }

    None
}

/// Directory holding the config file, custom stylesheet and other app data.
pub fn user_data_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_reads_default() {
        let store = MemoryStore::new();
        assert!(store.get_bool("autoUpdate"));
        assert!(!store.get_bool(ALWAYS_ON_TOP));
        assert!(!store.get_bool("not.a.known.key"));
    }

    #[test]
    fn test_wrong_type_reads_default() {
        let store = MemoryStore::with([(SHOW_ALWAYS_ON_TOP_PROMPT, json!("yes"))]);
        assert!(store.get_bool(SHOW_ALWAYS_ON_TOP_PROMPT));
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let mut store = JsonFileStore::open(blocker.join("config.json"));
        assert!(store.set(THEME, json!("dark")).is_err());
        assert_eq!(store.get(THEME), None);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut store = JsonFileStore::open(&path);
        store.set_bool(ALWAYS_ON_TOP, true).unwrap();
        store.set(THEME, json!("dark")).unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get(ALWAYS_ON_TOP), Some(json!(true)));
        assert_eq!(reopened.get(THEME), Some(json!("dark")));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_file_store_clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut store = JsonFileStore::open(&path);
        store.set_bool(PRIVATE_MODE, true).unwrap();
        store.clear().unwrap();

        assert!(JsonFileStore::open(&path).entries().is_empty());
    }

    #[test]
    fn test_malformed_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::open(&path);
        assert!(store.entries().is_empty());

        fs::write(&path, "[1, 2]").unwrap();
        let store = JsonFileStore::open(&path);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_ensure_exists_writes_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = JsonFileStore::open(&path);
        store.ensure_exists().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_user_data_dir_is_parent() {
        let dir = user_data_dir(Path::new("/tmp/Caprine/config.json"));
        assert_eq!(dir, PathBuf::from("/tmp/Caprine"));
    }
}
