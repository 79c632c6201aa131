use std::collections::HashMap;

use serde_json::Value;

use crate::error::SettingsError;

/// Settings key for the debug-mode flag.
pub const DEBUG_MODE_KEY: &str = "bd_debug_mode";

/// Key-value pass-through to wherever the host keeps extension settings.
pub trait SettingsStore: Send + Sync {
    /// Store name
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// Debug mode is off unless the store holds a literal `true`. Read failures
/// are logged and treated as off.
pub fn load_debug_mode(store: &dyn SettingsStore) -> bool {
    match store.get(DEBUG_MODE_KEY) {
        Ok(value) => matches!(value, Some(Value::Bool(true))),
        Err(e) => {
            tracing::warn!(store = store.name(), error = %e, "could not read debug mode");
            false
        }
    }
}

pub fn save_debug_mode(store: &mut dyn SettingsStore, enabled: bool) -> Result<(), SettingsError> {
    store.set(DEBUG_MODE_KEY, Value::Bool(enabled))
}

/// Process-local store; nothing survives the session.
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: HashMap<String, Value>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
