use std::{collections::HashMap, sync::RwLock};

use serde::{de::DeserializeOwned, Serialize};

use crate::CoreError;

/// Key holding the JSON array of subscription records.
pub const SUBSCRIPTIONS_KEY: &str = "subscriptions";
/// Key holding the selected display currency code.
pub const DISPLAY_CURRENCY_KEY: &str = "selected_currency";
/// Key holding the cached exchange-rate table and its fetch timestamp.
pub const EXCHANGE_RATES_KEY: &str = "exchange_rates_cache";
/// Key holding per-service icon URLs.
pub const SERVICE_ICONS_KEY: &str = "service_icons_cache";

/// Durable string key-value storage. Each value is written as a whole.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

/// Reads and decodes a JSON value stored under `key`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, CoreError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON and stores it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), CoreError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// Volatile store used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}
