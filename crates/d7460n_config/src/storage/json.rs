use crate::errors::Error;
use crate::settings::Setting;
use crate::StorageAdapter;
use d7460n_shared::types::Result;
use log::warn;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores settings as a flat json object (`{"inject.max_items": "u:50"}`) on disk. Every `set()`
/// rewrites the file.
pub struct JsonStorageAdapter {
    path: PathBuf,
    elements: Mutex<HashMap<String, Setting>>,
}

impl TryFrom<&Path> for JsonStorageAdapter {
    type Error = anyhow::Error;

    fn try_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            fs::write(path, "{}")?;
        }

        let adapter = JsonStorageAdapter {
            path: path.to_path_buf(),
            elements: Mutex::new(HashMap::new()),
        };
        adapter.read_file()?;

        Ok(adapter)
    }
}

impl StorageAdapter for JsonStorageAdapter {
    fn get(&self, key: &str) -> Option<Setting> {
        self.elements.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Setting) {
        self.elements.lock().insert(key.to_owned(), value);

        if let Err(err) = self.write_file() {
            warn!("could not persist setting {key}: {err}");
        }
    }

    fn all(&self) -> Result<HashMap<String, Setting>> {
        Ok(self.elements.lock().clone())
    }
}

impl JsonStorageAdapter {
    /// Read whole json file and stores the data into self.elements
    fn read_file(&self) -> Result<()> {
        let buf = fs::read_to_string(&self.path).map_err(Error::IO)?;
        let parsed_json: Value = serde_json::from_str(&buf).map_err(Error::JsonSerde)?;

        let Value::Object(settings) = parsed_json else {
            return Err(Error::Config(format!("{} does not hold a json object", self.path.display())).into());
        };

        let mut lock = self.elements.lock();
        lock.clear();
        for (key, value) in settings {
            match serde_json::from_value::<Setting>(value) {
                Ok(setting) => {
                    lock.insert(key, setting);
                }
                Err(err) => {
                    warn!("problem reading setting {key} from json: {err}");
                }
            }
        }

        Ok(())
    }

    /// Truncates the file and writes all elements back
    fn write_file(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.elements.lock()).map_err(Error::JsonSerde)?;
        fs::write(&self.path, json).map_err(Error::IO)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let adapter = JsonStorageAdapter::try_from(path.as_path()).unwrap();
        assert!(adapter.all().unwrap().is_empty());
        adapter.set("inject.max_items", Setting::UInt(50));

        let reloaded = JsonStorageAdapter::try_from(path.as_path()).unwrap();
        assert_eq!(reloaded.get("inject.max_items"), Some(Setting::UInt(50)));
    }

    #[test]
    fn rejects_non_object_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2]").unwrap();

        assert!(JsonStorageAdapter::try_from(path.as_path()).is_err());
    }
}
