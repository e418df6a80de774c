//! Preference Storage
//!
//! The sound toggle is the only state that outlives the process. It lives
//! in an external key-value store; whatever that store does, the round
//! engine never sees the failure.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde_json::Value;
use tracing::warn;

/// Key under which the sound flag is stored.
pub const SOUND_ENABLED_KEY: &str = "soundEnabled";

/// Preference store errors.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    /// Backing file could not be read or written.
    #[error("Preference I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not valid JSON.
    #[error("Preference data corrupt: {0}")]
    Json(#[from] serde_json::Error),

    /// Store is not available at all.
    #[error("Preference store unavailable: {0}")]
    Unavailable(String),
}

/// External key-value store for JSON values.
pub trait PreferenceStore: Send {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<Value>, PreferenceError>;

    /// Write a value.
    fn set(&mut self, key: &str, value: Value) -> Result<(), PreferenceError>;
}

/// In-process store; forgets everything on exit.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use `path`; the file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>, PreferenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PreferenceError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PreferenceError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// The sound toggle, with its store failures contained.
pub struct SoundSetting {
    enabled: bool,
    store: Box<dyn PreferenceStore>,
}

impl SoundSetting {
    /// Load the flag; defaults to enabled when missing or unreadable.
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let enabled = match store.get(SOUND_ENABLED_KEY) {
            Ok(Some(Value::Bool(enabled))) => enabled,
            Ok(Some(other)) => {
                warn!("Ignoring non-boolean {} preference: {}", SOUND_ENABLED_KEY, other);
                true
            }
            Ok(None) => true,
            Err(e) => {
                warn!("Sound preference unavailable, defaulting to on: {}", e);
                true
            }
        };
        Self { enabled, store }
    }

    /// Current flag.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Update the flag and try to persist it.
    ///
    /// The in-memory value changes even when the store refuses the write.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if let Err(e) = self.store.set(SOUND_ENABLED_KEY, Value::Bool(enabled)) {
            warn!("Failed to persist sound preference: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<Value>, PreferenceError> {
            Err(PreferenceError::Unavailable("no storage".into()))
        }

        fn set(&mut self, _key: &str, _value: Value) -> Result<(), PreferenceError> {
            Err(PreferenceError::Unavailable("no storage".into()))
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("crash-engine-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_defaults_to_enabled() {
        let setting = SoundSetting::load(Box::new(MemoryStore::new()));
        assert!(setting.enabled());
    }

    #[test]
    fn test_memory_round_trip() {
        let mut store = MemoryStore::new();
        store.set(SOUND_ENABLED_KEY, Value::Bool(false)).unwrap();
        let setting = SoundSetting::load(Box::new(store));
        assert!(!setting.enabled());
    }

    #[test]
    fn test_broken_store_is_contained() {
        let mut setting = SoundSetting::load(Box::new(BrokenStore));
        assert!(setting.enabled());
        setting.set_enabled(false);
        assert!(!setting.enabled());
    }

    #[test]
    fn test_json_file_store_persists() {
        let path = temp_path("sound");
        {
            let mut setting = SoundSetting::load(Box::new(JsonFileStore::new(&path)));
            assert!(setting.enabled());
            setting.set_enabled(false);
        }
        let reloaded = SoundSetting::load(Box::new(JsonFileStore::new(&path)));
        assert!(!reloaded.enabled());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get(SOUND_ENABLED_KEY), Err(PreferenceError::Json(_))));
        assert!(SoundSetting::load(Box::new(store)).enabled());
        let _ = std::fs::remove_file(&path);
    }
}
