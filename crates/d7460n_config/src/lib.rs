//! Configuration for the d7460n engine
//!
//! Two kinds of configuration live here. Engine settings (`deriver.*`, `inject.*`) are typed values
//! kept in the process-wide [`ConfigStore`], with defaults embedded from `settings.json`. The layout
//! [`manifest::Manifest`] declares which slots the data layer may fill and which visibility gates
//! apply to which regions.
mod errors;
pub mod manifest;
pub mod settings;
pub mod storage;

pub use crate::errors::Error;
use crate::settings::Setting;
use crate::storage::MemoryStorageAdapter;
use d7460n_shared::types::Result;
use lazy_static::lazy_static;
use log::warn;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// Default settings, embedded so the binary works without any file on disk.
const SETTINGS_JSON: &str = include_str!("./settings.json");

/// `StorageAdapter` is the interface for storing and retrieving settings. It must be `Send + Sync`
/// as the config store is shared between threads.
pub trait StorageAdapter: Send + Sync {
    /// Retrieves a setting from the storage
    fn get(&self, key: &str) -> Option<Setting>;

    /// Stores a given setting to the storage
    fn set(&self, key: &str, value: Setting);

    /// Retrieves all the settings in the storage in one go. Used for preloading the settings into
    /// the `ConfigStore`.
    fn all(&self) -> Result<HashMap<String, Setting>>;
}

lazy_static! {
    // Starts on a memory storage: values set during the session are not persisted
    static ref CONFIG_STORE: RwLock<ConfigStore> = RwLock::new(ConfigStore::default());
}

/// Returns a read guard on the process-wide config store
pub fn config_store() -> RwLockReadGuard<'static, ConfigStore> {
    CONFIG_STORE.read()
}

pub fn config_store_write() -> RwLockWriteGuard<'static, ConfigStore> {
    CONFIG_STORE.write()
}

/// Reads an engine setting from the process-wide store:
///
/// let exempt = config!(bool "deriver.details_exempt");
/// let limit = config!(uint "inject.max_items");
/// let keys = config!(map "inject.hidden_keys");
///
/// Unknown keys read as `false`, `0` or an empty list.
#[macro_export]
macro_rules! config {
    (bool $key:expr) => {
        match $crate::config_store().get($key) {
            Some(setting) => setting.to_bool(),
            None => false,
        }
    };
    (uint $key:expr) => {
        match $crate::config_store().get($key) {
            Some(setting) => setting.to_uint(),
            None => 0,
        }
    };
    (map $key:expr) => {
        match $crate::config_store().get($key) {
            Some(setting) => setting.to_map(),
            None => Vec::new(),
        }
    };
}

/// One entry of a section in settings.json
#[derive(Debug, Deserialize)]
struct JsonEntry {
    key: String,
    #[serde(rename = "type")]
    entry_type: String,
    default: String,
}

/// Holds the engine settings. Only keys declared in settings.json exist, and each keeps the type
/// of its default.
pub struct ConfigStore {
    /// Current values. The mutex allows `set()` through a shared reference.
    values: Mutex<HashMap<String, Setting>>,
    defaults: HashMap<String, Setting>,
    /// The storage adapter used for persisting and loading keys
    storage: Box<dyn StorageAdapter>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        let mut store = Self {
            values: Mutex::new(HashMap::new()),
            defaults: HashMap::new(),
            storage: Box::new(MemoryStorageAdapter::new()),
        };

        if let Err(err) = store.populate_default_settings() {
            warn!("config: could not load default settings: {err}");
        }
        store
    }
}

impl ConfigStore {
    /// Sets a new storage engine. Stored values of known keys replace the current ones; unknown
    /// keys and values of the wrong type are skipped with a warning.
    pub fn set_storage(&mut self, storage: Box<dyn StorageAdapter>) {
        self.storage = storage;

        let stored = match self.storage.all() {
            Ok(stored) => stored,
            Err(err) => {
                warn!("config: could not read settings storage: {err}");
                return;
            }
        };

        let mut values = self.values.lock();
        for (key, value) in stored {
            match self.check(&key, &value) {
                Ok(()) => {
                    values.insert(key, value);
                }
                Err(err) => warn!("config: ignoring stored value: {err}"),
            }
        }
    }

    /// Returns the current value of the setting. Unknown keys return `None`.
    pub fn get(&self, key: &str) -> Option<Setting> {
        let value = self.values.lock().get(key).cloned();
        if value.is_none() {
            warn!("config: Setting {key} is not known");
        }
        value
    }

    /// Sets the given setting and persists it to the storage. Unknown keys and values of another
    /// type than the default are refused.
    pub fn set(&self, key: &str, value: Setting) -> std::result::Result<(), Error> {
        self.check(key, &value)?;

        self.values.lock().insert(key.to_owned(), value.clone());
        self.storage.set(key, value);
        Ok(())
    }

    fn check(&self, key: &str, value: &Setting) -> std::result::Result<(), Error> {
        let Some(default) = self.defaults.get(key) else {
            return Err(Error::Config(format!("unknown setting {key}")));
        };
        if !default.same_type(value) {
            return Err(Error::Config(format!(
                "setting {key} expects a {}: value, got {value}",
                default.type_prefix()
            )));
        }
        Ok(())
    }

    /// Populates the defaults from the embedded settings.json file
    fn populate_default_settings(&mut self) -> Result<()> {
        let json_data: Value = serde_json::from_str(SETTINGS_JSON).map_err(Error::JsonSerde)?;

        let Value::Object(data) = json_data else {
            return Err(Error::Config("settings.json does not hold sections".into()).into());
        };

        let mut values = self.values.lock();
        for (section_prefix, section_entries) in data {
            let section_entries: Vec<JsonEntry> = serde_json::from_value(section_entries).map_err(Error::JsonSerde)?;

            for entry in section_entries {
                let key = format!("{}.{}", section_prefix, entry.key);
                let default = Setting::from_str(&entry.default)?;
                if default.type_prefix() != entry.entry_type {
                    return Err(Error::Config(format!("default of {key} is not of type {}", entry.entry_type)).into());
                }

                values.insert(key.clone(), default.clone());
                self.defaults.insert(key, default);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_loaded() {
        let store = ConfigStore::default();
        assert_eq!(store.get("deriver.gate_on_form_validity"), Some(Setting::Bool(true)));
        assert_eq!(store.get("deriver.details_exempt"), Some(Setting::Bool(true)));
        assert_eq!(store.get("inject.hidden_keys"), Some(Setting::Map(vec!["id".into()])));
        assert_eq!(store.get("inject.max_items"), Some(Setting::UInt(0)));
    }

    #[test]
    fn set_persists_to_the_storage() {
        let mut store = ConfigStore::default();
        store.set_storage(Box::new(MemoryStorageAdapter::new()));

        store.set("inject.max_items", Setting::UInt(25)).unwrap();
        assert_eq!(store.get("inject.max_items"), Some(Setting::UInt(25)));
        assert_eq!(store.storage.get("inject.max_items"), Some(Setting::UInt(25)));
        assert_eq!(ConfigStore::default().get("inject.max_items"), Some(Setting::UInt(0)));
    }

    #[test]
    fn set_refuses_unknown_keys_and_other_types() {
        let store = ConfigStore::default();

        assert!(matches!(store.set("inject.max_rows", Setting::UInt(1)), Err(Error::Config(_))));
        assert!(matches!(
            store.set("deriver.details_exempt", Setting::UInt(0)),
            Err(Error::Config(_))
        ));
        assert_eq!(store.get("deriver.details_exempt"), Some(Setting::Bool(true)));
    }

    #[test]
    fn storage_values_override_defaults() {
        let storage = MemoryStorageAdapter::new();
        storage.set("inject.max_items", Setting::UInt(7));
        storage.set("inject.hidden_keys", Setting::Map(vec!["id".into(), "sku".into()]));

        let mut store = ConfigStore::default();
        store.set_storage(Box::new(storage));
        assert_eq!(store.get("inject.max_items"), Some(Setting::UInt(7)));
        assert_eq!(store.get("inject.hidden_keys"), Some(Setting::Map(vec!["id".into(), "sku".into()])));
    }

    #[test]
    fn mistyped_stored_values_are_skipped_with_a_warning() {
        let storage = MemoryStorageAdapter::new();
        storage.set("deriver.gate_on_form_validity", Setting::UInt(0));

        let mut store = ConfigStore::default();
        testing_logger::setup();
        store.set_storage(Box::new(storage));

        testing_logger::validate(|captured_logs| {
            assert_eq!(captured_logs.len(), 1);
            assert_eq!(captured_logs[0].level, log::Level::Warn);
        });
        assert_eq!(store.get("deriver.gate_on_form_validity"), Some(Setting::Bool(true)));
    }

    #[test]
    fn unknown_key_is_none() {
        let store = ConfigStore::default();
        assert_eq!(store.get("this.key.doesnt.exist"), None);
    }

    #[test]
    fn macro_usage() {
        assert!(config!(bool "deriver.gate_on_form_validity"));
        assert_eq!(config!(uint "inject.max_items"), 0);
        assert_eq!(config!(map "inject.hidden_keys"), vec!["id".to_string()]);
        assert!(!config!(bool "this.key.doesnt.exist"));
    }
}
