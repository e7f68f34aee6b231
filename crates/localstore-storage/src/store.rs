//! The local store engine: cache lifecycle, typed accessors, and the
//! save/load/reload protocol.
//!
//! A [`LocalStore`] owns one storage file. It starts **uninitialized**
//! (no cache in memory) and becomes **loaded** on the first operation
//! that touches the cache, which reads the file once. From then on the
//! cache is the source of truth until [`reload`](LocalStore::reload)
//! replaces it.
//!
//! Every operation takes `&mut self`; the engine does no locking of its
//! own. Share a store across threads by wrapping it in a `Mutex`.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use localstore_crypto::CipherCodec;
use localstore_types::config::StoreConfig;
use localstore_types::{LocalStoreError, Result, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::Cache;
use crate::storage_file::StorageFile;

// ---------------------------------------------------------------------------
// LocalStore
// ---------------------------------------------------------------------------

/// Encrypted, file-backed key-value store with a write-through cache.
///
/// Setters only touch memory; nothing reaches disk until
/// [`save`](Self::save). Keys set through
/// [`set_volatile_value`](Self::set_volatile_value) are readable
/// immediately but never written.
pub struct LocalStore {
    config: StoreConfig,
    file: StorageFile,
    /// `None` until the first access loads the file.
    cache: Option<Cache>,
}

impl LocalStore {
    /// Creates a store for `config` without touching the disk.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::ConfigError`] if the configuration is invalid.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        if config.uses_default_passphrase() {
            tracing::warn!(
                path = %config.storage_path().display(),
                "storage file is encrypted with the placeholder passphrase; set encryption_passphrase"
            );
        }
        let codec = CipherCodec::new(config.kdf.into());
        let file = StorageFile::new(config.storage_path(), codec);
        Ok(Self {
            config,
            file,
            cache: None,
        })
    }

    /// Creates a store and loads the storage file immediately.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let mut store = Self::new(config)?;
        store.ensure_loaded()?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether the cache has been materialised.
    pub fn is_loaded(&self) -> bool {
        self.cache.is_some()
    }

    /// Loads the storage file into the cache if that has not happened yet.
    ///
    /// If loading fails the store stays uninitialized and the next access
    /// retries.
    pub fn ensure_loaded(&mut self) -> Result<&mut Cache> {
        let cache = match self.cache.take() {
            Some(cache) => cache,
            None => Cache::from_entries(self.load()?),
        };
        Ok(self.cache.insert(cache))
    }

    // -- Setters ---------------------------------------------------------

    /// Inserts or overwrites `key`. A volatile key becomes persistent.
    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        check_key(key)?;
        self.ensure_loaded()?.insert(key, value.into());
        Ok(())
    }

    /// Inserts or overwrites `key` and excludes it from the next save.
    pub fn set_volatile_value(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        check_key(key)?;
        self.ensure_loaded()?.insert_volatile(key, value.into());
        Ok(())
    }

    /// Stores any serializable value in its structured form.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::SerializationError`] if `value` cannot be
    /// represented as JSON (e.g. a map with non-string keys).
    pub fn set_object<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = to_value(value)?;
        self.set_value(key, value)
    }

    /// Volatile variant of [`set_object`](Self::set_object).
    pub fn set_volatile_object<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let value = to_value(value)?;
        self.set_volatile_value(key, value)
    }

    // -- Introspection ---------------------------------------------------

    /// Checks the cache only; the file is irrelevant once loaded.
    pub fn has_key(&mut self, key: &str) -> Result<bool> {
        Ok(self.ensure_loaded()?.contains_key(key))
    }

    pub fn is_volatile(&mut self, key: &str) -> Result<bool> {
        Ok(self.ensure_loaded()?.is_volatile(key))
    }

    /// Cached keys in lexicographic order.
    pub fn keys(&mut self) -> Result<Vec<String>> {
        Ok(self.ensure_loaded()?.keys())
    }

    pub fn len(&mut self) -> Result<usize> {
        Ok(self.ensure_loaded()?.len())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.ensure_loaded()?.is_empty())
    }

    /// Returns a copy of the raw stored value.
    pub fn get_value(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.ensure_loaded()?.get(key).cloned())
    }

    // -- Typed getters ---------------------------------------------------
    //
    // Absent keys yield the default. Present keys are coerced; a value
    // that cannot be coerced is a `TypeMismatch`, never the default.

    pub fn get_string(&mut self, key: &str, default: &str) -> Result<String> {
        self.read_with(key, default.to_owned(), Value::to_text)
    }

    pub fn get_int(&mut self, key: &str, default: i32) -> Result<i32> {
        self.read_with(key, default, Value::to_i32)
    }

    pub fn get_long(&mut self, key: &str, default: i64) -> Result<i64> {
        self.read_with(key, default, Value::to_i64)
    }

    /// Reads as `f32`. A value stored as `f64` is narrowed and generally
    /// does not compare equal to the original.
    pub fn get_float(&mut self, key: &str, default: f32) -> Result<f32> {
        self.read_with(key, default, Value::to_f32)
    }

    pub fn get_double(&mut self, key: &str, default: f64) -> Result<f64> {
        self.read_with(key, default, Value::to_f64)
    }

    pub fn get_boolean(&mut self, key: &str, default: bool) -> Result<bool> {
        self.read_with(key, default, Value::to_bool)
    }

    pub fn get_datetime(&mut self, key: &str, default: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.read_with(key, default, Value::to_datetime)
    }

    /// Re-interprets the stored value as `T`.
    ///
    /// Values set with [`set_object`](Self::set_object) and values decoded
    /// from disk both go through their JSON form, so the result is the
    /// same before and after a save/reload.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::DeserializationError`] if the stored shape does
    /// not fit `T`.
    pub fn get_generic_object<T: DeserializeOwned>(&mut self, key: &str, default: T) -> Result<T> {
        self.read_with(key, default, |value| {
            serde_json::from_value(value.to_json()).map_err(|e| {
                LocalStoreError::DeserializationError {
                    reason: format!("stored {} does not match requested type: {e}", value.kind()),
                }
            })
        })
    }

    fn read_with<T>(
        &mut self,
        key: &str,
        default: T,
        coerce: impl FnOnce(&Value) -> Result<T>,
    ) -> Result<T> {
        match self.ensure_loaded()?.get(key) {
            Some(value) => coerce(value).map_err(|e| with_key(e, key)),
            None => Ok(default),
        }
    }

    // -- Removal ---------------------------------------------------------

    /// Removes `key` from memory. Absent keys are a no-op.
    pub fn delete_key(&mut self, key: &str) -> Result<()> {
        self.ensure_loaded()?.remove(key);
        Ok(())
    }

    /// Makes every volatile key persistent.
    pub fn clear_volatile_keys(&mut self) -> Result<()> {
        self.ensure_loaded()?.clear_volatile();
        Ok(())
    }

    /// Empties the cache and the volatile set. The file is untouched until
    /// the next [`save`](Self::save).
    pub fn clear_values(&mut self) -> Result<()> {
        self.ensure_loaded()?.clear();
        Ok(())
    }

    /// Alias of [`clear_values`](Self::clear_values).
    pub fn clear(&mut self) -> Result<()> {
        self.clear_values()
    }

    /// Clears memory and persists the empty state.
    pub fn delete_all(&mut self) -> Result<()> {
        self.clear_values()?;
        self.save()
    }

    // -- Persistence -----------------------------------------------------

    /// Writes the non-volatile subset of the cache to the storage file,
    /// replacing its previous content atomically.
    ///
    /// # Errors
    ///
    /// - [`LocalStoreError::SerializationError`] if the snapshot cannot be
    ///   encoded.
    /// - [`LocalStoreError::CryptoError`] if encryption fails.
    /// - [`LocalStoreError::IoError`] if the file cannot be written; the
    ///   previous file is left intact.
    pub fn save(&mut self) -> Result<()> {
        let (json, count) = {
            let cache = self.ensure_loaded()?;
            let snapshot = cache.snapshot();
            let json = encode(&snapshot)?;
            (json, snapshot.len())
        };

        if self.config.log_enabled {
            tracing::debug!(json = %json, "saving local storage data");
        }

        self.file
            .write(json.as_bytes(), &self.config.encryption_passphrase)?;

        tracing::info!(path = %self.file.path().display(), keys = count, "local storage saved");
        Ok(())
    }

    /// Reads and decodes the storage file without touching the cache.
    ///
    /// A missing or empty file decodes to an empty mapping. A file that
    /// exists but cannot be decrypted or decoded is an error, never an
    /// empty mapping.
    pub fn load(&self) -> Result<HashMap<String, Value>> {
        let plaintext = self.file.read(&self.config.encryption_passphrase)?;

        if self.config.log_enabled {
            tracing::debug!(json = %String::from_utf8_lossy(&plaintext), "loaded local storage data");
        }

        if plaintext.iter().all(u8::is_ascii_whitespace) {
            return Ok(HashMap::new());
        }

        serde_json::from_slice(&plaintext).map_err(|e| LocalStoreError::DeserializationError {
            reason: format!("storage file is not a key-value object: {e}"),
        })
    }

    /// Replaces the cache with the file's content and clears the volatile
    /// set.
    ///
    /// On error the current cache is kept as it was.
    pub fn reload(&mut self) -> Result<()> {
        let entries = self.load()?;
        tracing::debug!(keys = entries.len(), "local storage reloaded");
        self.cache = Some(Cache::from_entries(entries));
        Ok(())
    }

    // -- Diagnostics -----------------------------------------------------

    /// Returns the whole cache as JSON, logging it when logging is
    /// enabled.
    pub fn dump_cache(&mut self) -> Result<String> {
        let json = encode(&self.ensure_loaded()?.entries())?;
        if self.config.log_enabled {
            tracing::info!(json = %json, "local storage cache");
        }
        Ok(json)
    }

    /// Returns the JSON the next [`save`](Self::save) would write.
    pub fn dump_snapshot(&mut self) -> Result<String> {
        let json = encode(&self.ensure_loaded()?.snapshot())?;
        if self.config.log_enabled {
            tracing::info!(json = %json, "local storage snapshot");
        }
        Ok(json)
    }

    // -- Storage file ----------------------------------------------------

    pub fn data_dir(&self) -> &Path {
        self.file.path().parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn storage_path(&self) -> &Path {
        self.file.path()
    }

    pub fn storage_file_exists(&self) -> bool {
        self.file.exists()
    }

    /// Deletes the storage file. The cache is not touched, so a later
    /// [`save`](Self::save) recreates the file from memory.
    pub fn delete_storage_file(&self) -> Result<bool> {
        let removed = self.file.remove()?;
        if removed {
            tracing::info!(path = %self.file.path().display(), "storage file deleted");
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(LocalStoreError::InvalidKey {
            reason: "key must not be empty".into(),
        });
    }
    Ok(())
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map(Value::from_json)
        .map_err(|e| LocalStoreError::SerializationError {
            reason: format!("value cannot be stored: {e}"),
        })
}

fn encode<T: Serialize>(entries: &T) -> Result<String> {
    serde_json::to_string(entries).map_err(|e| LocalStoreError::SerializationError {
        reason: format!("failed to encode local storage data: {e}"),
    })
}

fn with_key(err: LocalStoreError, key: &str) -> LocalStoreError {
    match err {
        LocalStoreError::TypeMismatch { reason } => LocalStoreError::TypeMismatch {
            reason: format!("key {key:?}: {reason}"),
        },
        LocalStoreError::DeserializationError { reason } => {
            LocalStoreError::DeserializationError {
                reason: format!("key {key:?}: {reason}"),
            }
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use localstore_types::config::KdfConfig;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn test_config() -> StoreConfig {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir: PathBuf = std::env::temp_dir().join(format!(
            "localstore-unit-{}-{}",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_dir_all(&dir);
        StoreConfig {
            data_dir: Some(dir),
            kdf: KdfConfig {
                m_cost: 256,
                t_cost: 1,
                p_cost: 1,
            },
            ..StoreConfig::default()
        }
    }

    #[test]
    fn new_does_not_load() -> Result<()> {
        let mut store = LocalStore::new(test_config())?;
        assert!(!store.is_loaded());
        assert!(!store.has_key("anything")?);
        assert!(store.is_loaded());
        Ok(())
    }

    #[test]
    fn placeholder_passphrase_still_opens() -> Result<()> {
        let config = test_config();
        assert!(config.uses_default_passphrase());
        let mut store = LocalStore::new(config)?;
        store.set_value("hp", 101)?;
        store.save()?;
        store.reload()?;
        assert_eq!(store.get_int("hp", 0)?, 101);
        Ok(())
    }

    #[test]
    fn invalid_config_rejected() {
        let config = StoreConfig {
            encryption_passphrase: String::new(),
            ..test_config()
        };
        assert!(matches!(
            LocalStore::new(config),
            Err(LocalStoreError::ConfigError { .. })
        ));
    }

    #[test]
    fn empty_key_rejected() -> Result<()> {
        let mut store = LocalStore::new(test_config())?;
        assert!(matches!(
            store.set_value("", 1),
            Err(LocalStoreError::InvalidKey { .. })
        ));
        Ok(())
    }

    #[test]
    fn absent_key_returns_default() -> Result<()> {
        let mut store = LocalStore::new(test_config())?;
        assert_eq!(store.get_int("hp", 1010)?, 1010);
        assert_eq!(store.get_long("hp", i64::MAX)?, i64::MAX);
        assert_eq!(store.get_string("hp", "")?, "");
        assert_eq!(store.get_string("hp", "fuga")?, "fuga");
        assert!(store.get_boolean("hp", true)?);
        Ok(())
    }

    #[test]
    fn mismatch_names_the_key() -> Result<()> {
        let mut store = LocalStore::new(test_config())?;
        store.set_value("obj", json!({"a": 1}))?;
        match store.get_boolean("obj", false) {
            Err(LocalStoreError::TypeMismatch { reason }) => assert!(reason.contains("\"obj\"")),
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn generic_object_shape_mismatch() -> Result<()> {
        let mut store = LocalStore::new(test_config())?;
        store.set_value("name", "hoge")?;
        let result: Result<Vec<i32>> = store.get_generic_object("name", Vec::new());
        assert!(matches!(
            result,
            Err(LocalStoreError::DeserializationError { .. })
        ));
        Ok(())
    }

    #[test]
    fn dump_snapshot_excludes_volatile() -> Result<()> {
        let mut store = LocalStore::new(test_config())?;
        store.set_value("a", 1)?;
        store.set_volatile_value("b", 2)?;
        assert_eq!(store.dump_cache()?, r#"{"a":1,"b":2}"#);
        assert_eq!(store.dump_snapshot()?, r#"{"a":1}"#);
        Ok(())
    }

    #[test]
    fn storage_path_follows_config() -> Result<()> {
        let config = test_config();
        let expected = config.storage_path();
        let store = LocalStore::new(config)?;
        assert_eq!(store.storage_path(), expected.as_path());
        assert_eq!(Some(store.data_dir()), expected.parent());
        assert!(!store.storage_file_exists());
        Ok(())
    }
}
