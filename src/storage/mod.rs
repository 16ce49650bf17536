//! Key/value session storage.
//!
//! Values are opaque strings, the way browser local storage holds them.
//! Typed access goes through the JSON helpers below, which treat an
//! unparsable slot as an empty one.

pub mod json_file;
pub mod memory;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::AppResult;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Slot holding the serialized player session.
pub const PLAYER_STATE_KEY: &str = "playerState";
/// Slot holding the cached user.
pub const USER_KEY: &str = "user";
/// Slot holding the auth token.
pub const TOKEN_KEY: &str = "token";

/// Trait for string key/value storage.
pub trait KeyValueStorage: Send + Sync {
    /// Read a slot.
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Write a slot, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove a slot. Removing a missing slot is not an error.
    fn remove(&self, key: &str) -> AppResult<()>;

    /// Check if a slot holds a value.
    fn contains(&self, key: &str) -> AppResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Thread-safe handle to a storage backend.
pub type SharedStorage = Arc<dyn KeyValueStorage>;

/// Read and parse a JSON slot.
///
/// Missing slots, storage failures and parse failures all yield `None`.
pub fn load_json<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read storage slot");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring unparsable storage slot");
            None
        }
    }
}

/// Serialize `value` and write it to a slot.
pub fn save_json<T: Serialize + ?Sized>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> AppResult<()> {
    let content = serde_json::to_string(value)?;
    storage.set(key, &content)
}

/// Read-merge-write a JSON object slot.
///
/// Fields of `patch` overwrite those already stored; other stored fields are
/// kept. Anything stored that is not an object is discarded. This is not
/// atomic across writers sharing the same backend: the last write wins.
pub fn merge_json(storage: &dyn KeyValueStorage, key: &str, patch: Value) -> AppResult<()> {
    let mut merged = match load_json::<Value>(storage, key) {
        Some(Value::Object(existing)) => existing,
        _ => serde_json::Map::new(),
    };

    match patch {
        Value::Object(fields) => {
            for (field, value) in fields {
                merged.insert(field, value);
            }
        }
        other => return save_json(storage, key, &other),
    }

    save_json(storage, key, &Value::Object(merged))
}
