//! Point-in-time read view of the configuration used for one menu build.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::config::{self, ConfigStore};
use crate::menu::commands::{ChoiceGroup, GROUPS};

/// What a key reads as when the store has no value for it: the group default
/// for choice keys, the boolean default for everything else.
pub fn default_value(key: &str) -> Value {
    match GROUPS.iter().find(|g| g.key == key) {
        Some(group) => Value::String(group.default.to_string()),
        None => Value::Bool(config::default_flag(key)),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSnapshot {
    values: BTreeMap<String, Value>,
    open_at_login: bool,
}

impl ConfigSnapshot {
    pub fn capture(store: &dyn ConfigStore, open_at_login: bool) -> Self {
        Self {
            values: store.entries(),
            open_at_login,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                debug!(key, value = %other, "non-boolean config value, using default");
                config::default_flag(key)
            }
            None => config::default_flag(key),
        }
    }

    /// The stored value of the group's key when it names one of the group's
    /// entries, otherwise the group default.
    pub fn choice(&self, group: &ChoiceGroup) -> &'static str {
        let stored = self.values.get(group.key).and_then(Value::as_str);
        match stored.and_then(|s| group.entry(s)) {
            Some(entry) => entry.value,
            None => {
                if let Some(s) = stored {
                    debug!(key = group.key, value = s, "unknown choice, using default");
                }
                group.default
            }
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn open_at_login(&self) -> bool {
        self.open_at_login
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::menu::commands::{SIDEBAR_GROUP, THEME_GROUP, VIBRANCY_GROUP};
    use serde_json::json;

    #[test]
    fn test_default_value_for_choice_and_flag_keys() {
        assert_eq!(default_value("theme"), json!("system"));
        assert_eq!(default_value("vibrancy"), json!(VIBRANCY_GROUP.default));
        assert_eq!(default_value("sidebar"), json!("default"));
        assert_eq!(default_value("autoUpdate"), json!(true));
        assert_eq!(default_value("alwaysOnTop"), json!(false));
    }

    #[test]
    fn test_choice_falls_back_to_default() {
        let store = MemoryStore::with([("theme", json!("sepia")), ("sidebar", json!(3))]);
        let snap = ConfigSnapshot::capture(&store, false);
        assert_eq!(snap.choice(&THEME_GROUP), "system");
        assert_eq!(snap.choice(&SIDEBAR_GROUP), "default");
    }

    #[test]
    fn test_choice_reads_stored_value() {
        let store = MemoryStore::with([("theme", json!("dark"))]);
        let snap = ConfigSnapshot::capture(&store, true);
        assert_eq!(snap.choice(&THEME_GROUP), "dark");
        assert!(snap.open_at_login());
    }

    #[test]
    fn test_snapshot_is_detached_from_store() {
        let mut store = MemoryStore::new();
        let snap = ConfigSnapshot::capture(&store, false);
        store.set_bool("alwaysOnTop", true).unwrap();
        assert!(!snap.flag("alwaysOnTop"));
    }
}
