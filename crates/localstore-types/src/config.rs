//! Store configuration with sensible defaults.
//!
//! A [`StoreConfig`] is supplied once by the embedding application before
//! the store is first used. It can be built in code or loaded from a JSON
//! file; every field is optional in the file and falls back to its
//! default.
//!
//! Example `localstore.json`:
//!
//! ```json
//! {
//!   "log_enabled": true,
//!   "encryption_passphrase": "aqdai6*--8~7Tex(R*|pVARVI0OJeOF>",
//!   "storage_file_name": "settings.dat",
//!   "data_dir": "/home/me/.local/share/myapp",
//!   "kdf": { "m_cost": 19456, "t_cost": 2, "p_cost": 1 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{LocalStoreError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Placeholder passphrase. Real deployments must override it.
pub const DEFAULT_PASSPHRASE: &str = "password";

/// Default storage file name inside the data directory.
pub const DEFAULT_STORAGE_FILE_NAME: &str = "localstorage";

/// Directory name appended to the platform data directory.
const APP_DIR_NAME: &str = "localstore";

// ---------------------------------------------------------------------------
// KdfConfig
// ---------------------------------------------------------------------------

/// Argon2id cost parameters used when encrypting the storage file.
///
/// Decryption reads the parameters back from the file, so changing these
/// only affects files written afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            m_cost: 65_536, // 64 MiB
            t_cost: 3,
            p_cost: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Configuration for a single store file.
///
/// Configure before first use: the store takes ownership of its config,
/// so the passphrase and path cannot change under a loaded cache.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Emit the saved/loaded JSON through `tracing` at debug level.
    pub log_enabled: bool,

    /// Passphrase the storage file is encrypted under.
    pub encryption_passphrase: String,

    /// File name (not a path) of the storage file.
    pub storage_file_name: String,

    /// Directory holding the storage file. `None` selects the platform
    /// data directory.
    pub data_dir: Option<PathBuf>,

    /// Key derivation cost for newly written files.
    pub kdf: KdfConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_enabled: false,
            encryption_passphrase: DEFAULT_PASSPHRASE.to_owned(),
            storage_file_name: DEFAULT_STORAGE_FILE_NAME.to_owned(),
            data_dir: None,
            kdf: KdfConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`LocalStoreError::IoError`] if the file cannot be read.
    /// - [`LocalStoreError::ConfigError`] if it is not valid JSON for
    ///   this shape, or fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LocalStoreError::IoError {
            reason: format!("failed to read config file {}: {e}", path.display()),
        })?;

        let config: Self =
            serde_json::from_str(&text).map_err(|e| LocalStoreError::ConfigError {
                reason: format!("invalid config JSON: {e}"),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.encryption_passphrase.is_empty() {
            return Err(LocalStoreError::ConfigError {
                reason: "encryption_passphrase must not be empty".into(),
            });
        }

        let name = self.storage_file_name.as_str();
        if name.is_empty() || name == "." || name == ".." {
            return Err(LocalStoreError::ConfigError {
                reason: format!("storage_file_name {name:?} is not a file name"),
            });
        }
        if name.contains('/') || name.contains('\\') {
            return Err(LocalStoreError::ConfigError {
                reason: format!("storage_file_name {name:?} must not contain path separators"),
            });
        }

        if self.kdf.m_cost == 0 || self.kdf.t_cost == 0 || self.kdf.p_cost == 0 {
            return Err(LocalStoreError::ConfigError {
                reason: "kdf costs must be greater than 0".into(),
            });
        }

        Ok(())
    }

    /// Whether the passphrase is still the shipped placeholder.
    pub fn uses_default_passphrase(&self) -> bool {
        self.encryption_passphrase == DEFAULT_PASSPHRASE
    }

    /// Directory holding the storage file.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Full path of the storage file: `<data_dir>/<storage_file_name>`.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage_file_name)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Platform-specific application-private data directory.
pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        return data.join(APP_DIR_NAME);
    }
    PathBuf::from("localstore-data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(StoreConfig::default().validate().is_ok());
    }

    #[test]
    fn default_values() {
        let config = StoreConfig::default();
        assert!(!config.log_enabled);
        assert_eq!(config.encryption_passphrase, "password");
        assert_eq!(config.storage_file_name, "localstorage");
        assert!(config.data_dir.is_none());
        assert_eq!(config.kdf.m_cost, 65_536);
    }

    #[test]
    fn storage_path_joins_dir_and_name() {
        let config = StoreConfig {
            data_dir: Some(PathBuf::from("/tmp/app")),
            storage_file_name: "prefs".into(),
            ..StoreConfig::default()
        };
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/app/prefs"));
    }

    #[test]
    fn empty_passphrase_rejected() {
        let config = StoreConfig {
            encryption_passphrase: String::new(),
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn path_like_file_name_rejected() {
        for name in ["", ".", "..", "a/b", "a\\b"] {
            let config = StoreConfig {
                storage_file_name: name.into(),
                ..StoreConfig::default()
            };
            assert!(config.validate().is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn zero_kdf_cost_rejected() {
        let config = StoreConfig {
            kdf: KdfConfig {
                t_cost: 0,
                ..KdfConfig::default()
            },
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_takes_defaults() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config: StoreConfig =
            serde_json::from_str(r#"{ "storage_file_name": "x.dat", "kdf": { "t_cost": 1 } }"#)?;
        assert_eq!(config.storage_file_name, "x.dat");
        assert_eq!(config.encryption_passphrase, DEFAULT_PASSPHRASE);
        assert_eq!(config.kdf.t_cost, 1);
        assert_eq!(config.kdf.m_cost, 65_536);
        Ok(())
    }

    #[test]
    fn placeholder_passphrase_is_detected() {
        assert!(StoreConfig::default().uses_default_passphrase());
        let config = StoreConfig {
            encryption_passphrase: "aqdai6*--8~7Tex(R*|pVARVI0OJeOF>".into(),
            ..StoreConfig::default()
        };
        assert!(!config.uses_default_passphrase());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("localstore-config-does-not-exist.json");
        let result = StoreConfig::load(&path);
        assert!(matches!(result, Err(LocalStoreError::IoError { .. })));
    }
}
