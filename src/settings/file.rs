use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::traits::SettingsStore;
use crate::error::SettingsError;

/// JSON-object file store. The whole object is rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl FileSettings {
    /// Open `path`, treating a missing file as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Map::new()
            } else {
                match serde_json::from_str::<Value>(&contents)
                    .map_err(|e| SettingsError::Read(format!("{}: {e}", path.display())))?
                {
                    Value::Object(map) => map,
                    _ => {
                        return Err(SettingsError::Read(format!(
                            "{}: expected a JSON object",
                            path.display()
                        )));
                    }
                }
            }
        } else {
            Map::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| SettingsError::Write(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        self.persist()
    }
}
