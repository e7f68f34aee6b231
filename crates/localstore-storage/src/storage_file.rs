//! Encrypted single-file persistence.
//!
//! The whole snapshot is stored as one codec envelope. Writes are atomic:
//! encrypt → write tmp → fsync → rename → fsync the directory. A reader
//! never observes a partially written file, and a failed write leaves the
//! previous file untouched.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use localstore_crypto::CipherCodec;
use localstore_types::{LocalStoreError, Result};

/// Encrypted file I/O for the storage file at a fixed path.
#[derive(Clone, Debug)]
pub struct StorageFile {
    path: PathBuf,
    codec: CipherCodec,
}

impl StorageFile {
    pub fn new(path: PathBuf, codec: CipherCodec) -> Self {
        Self { path, codec }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and decrypts the file.
    ///
    /// A missing or empty file yields an empty plaintext.
    ///
    /// # Errors
    ///
    /// - [`LocalStoreError::IoError`] if the file exists but cannot be read.
    /// - [`LocalStoreError::CryptoError`] if decryption fails.
    pub fn read(&self, passphrase: &str) -> Result<Vec<u8>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LocalStoreError::IoError {
                    reason: format!("failed to read {}: {e}", self.path.display()),
                })
            }
        };

        if raw.is_empty() {
            return Ok(Vec::new());
        }

        self.codec.decrypt(&raw, passphrase)
    }

    /// Encrypts `plaintext` and atomically replaces the file.
    ///
    /// The parent directory is created if missing.
    pub fn write(&self, plaintext: &[u8], passphrase: &str) -> Result<()> {
        let envelope = self.codec.encrypt(plaintext, passphrase)?;
        let tmp_path = self.tmp_path()?;

        if let Err(e) = write_synced(&tmp_path, &envelope) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            LocalStoreError::IoError {
                reason: format!("failed to replace {}: {e}", self.path.display()),
            }
        })?;

        // The new file is already in place; a failed directory sync is
        // only logged.
        if let Err(e) = sync_dir(self.parent_dir()) {
            tracing::warn!(error = %e, "storage directory not synced");
        }

        tracing::debug!(path = %self.path.display(), bytes = envelope.len(), "storage file written");
        Ok(())
    }

    /// Deletes the file. Returns `Ok(false)` if it did not exist.
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LocalStoreError::IoError {
                reason: format!("failed to remove {}: {e}", self.path.display()),
            }),
        }
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Temporary file next to the target, so the rename stays on one
    /// file system.
    fn tmp_path(&self) -> Result<PathBuf> {
        let parent = self.parent_dir();

        fs::create_dir_all(parent).map_err(|e| LocalStoreError::IoError {
            reason: format!("failed to create directory {}: {e}", parent.display()),
        })?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("localstorage");

        Ok(parent.join(format!(".{file_name}.tmp")))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |what: &str, e: std::io::Error| LocalStoreError::IoError {
        reason: format!("failed to {what} {}: {e}", path.display()),
    };

    let mut file = fs::File::create(path).map_err(|e| io_err("create", e))?;
    file.write_all(bytes).map_err(|e| io_err("write", e))?;
    file.sync_all().map_err(|e| io_err("fsync", e))?;
    Ok(())
}

/// Flushes a directory so a rename inside it survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| LocalStoreError::IoError {
            reason: format!("failed to fsync directory {}: {e}", dir.display()),
        })
}

/// Directory handles cannot be fsynced portably outside Unix.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
