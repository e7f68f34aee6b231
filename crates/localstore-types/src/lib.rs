//! Core shared types for the localstore workspace.
//!
//! This crate defines the types every other crate builds on: the
//! dynamically-typed [`Value`] cell held by the cache, the unified
//! [`LocalStoreError`], and the [`config::StoreConfig`] supplied by the
//! embedding application.

pub mod config;
pub mod value;

use thiserror::Error;

pub use value::Value;

// ---------------------------------------------------------------------------
// LocalStoreError
// ---------------------------------------------------------------------------

/// Central error type for the localstore system.
///
/// All crates in the workspace convert their internal errors into variants
/// of this enum, so callers match on a single error surface.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// A stored value cannot be coerced to the requested scalar kind.
    #[error("type mismatch: {reason}")]
    TypeMismatch {
        /// Human-readable description of the stored and requested kinds.
        reason: String,
    },

    /// A structured payload does not match the requested shape.
    #[error("deserialization error: {reason}")]
    DeserializationError {
        /// Human-readable description of the decode failure.
        reason: String,
    },

    /// A value could not be encoded into its structured form.
    #[error("serialization error: {reason}")]
    SerializationError {
        /// Human-readable description of the encode failure.
        reason: String,
    },

    /// A cryptographic operation failed (key derivation, encryption,
    /// decryption, or envelope parsing).
    #[error("crypto error: {reason}")]
    CryptoError {
        /// Human-readable description of the cryptographic failure.
        reason: String,
    },

    /// The storage file could not be read or written.
    #[error("io error: {reason}")]
    IoError {
        /// Human-readable description of the I/O failure.
        reason: String,
    },

    /// A configuration value is invalid or missing.
    #[error("config error: {reason}")]
    ConfigError {
        /// Human-readable description of the configuration problem.
        reason: String,
    },

    /// A key is not acceptable (empty).
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Human-readable description of why the key was rejected.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`LocalStoreError`].
pub type Result<T> = std::result::Result<T, LocalStoreError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = LocalStoreError::TypeMismatch {
            reason: "object requested as bool".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("type mismatch"));
        assert!(msg.contains("object requested as bool"));
    }

    #[test]
    fn crypto_error_display() {
        let err = LocalStoreError::CryptoError {
            reason: "authentication failed".into(),
        };
        assert_eq!(err.to_string(), "crypto error: authentication failed");
    }
}
