//! XChaCha20-Poly1305 authenticated encryption.
//!
//! The 192-bit nonce is large enough to be drawn at random for every
//! encryption without tracking counters. A nonce **must never be reused**
//! with the same key.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use localstore_types::{LocalStoreError, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Length of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

// ---------------------------------------------------------------------------
// AeadNonce
// ---------------------------------------------------------------------------

/// 192-bit (24-byte) XChaCha20-Poly1305 nonce.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AeadNonce([u8; 24]);

impl AeadNonce {
    /// Fixed byte length of the nonce.
    pub const LEN: usize = 24;

    /// Draws a fresh nonce from OS entropy.
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wraps raw bytes read back from an envelope.
    pub fn from_bytes(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Seal / Open
// ---------------------------------------------------------------------------

/// Encrypts `plaintext` and appends the 16-byte tag.
///
/// `aad` is authenticated but not encrypted; pass `&[]` if unused.
pub fn seal(key: &[u8; 32], nonce: &AeadNonce, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let payload = Payload {
        msg: plaintext,
        aad,
    };

    cipher
        .encrypt(XNonce::from_slice(&nonce.0), payload)
        .map_err(|e| LocalStoreError::CryptoError {
            reason: format!("XChaCha20-Poly1305 encryption failed: {e}"),
        })
}

/// Verifies the tag and decrypts `ciphertext`.
///
/// # Errors
///
/// Returns [`LocalStoreError::CryptoError`] when authentication fails:
/// wrong key, wrong nonce, modified ciphertext, or different AAD.
pub fn open(key: &[u8; 32], nonce: &AeadNonce, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(XNonce::from_slice(&nonce.0), payload)
        .map_err(|_| LocalStoreError::CryptoError {
            reason: "authentication failed: wrong passphrase or corrupted data".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() -> Result<()> {
        let key = [0x42u8; 32];
        let nonce = AeadNonce::generate();

        let sealed = seal(&key, &nonce, b"hello localstore", b"header")?;
        assert_eq!(sealed.len(), b"hello localstore".len() + TAG_LEN);

        let opened = open(&key, &nonce, &sealed, b"header")?;
        assert_eq!(opened, b"hello localstore");
        Ok(())
    }

    #[test]
    fn empty_plaintext_is_tag_only() -> Result<()> {
        let key = [0x01u8; 32];
        let nonce = AeadNonce::generate();
        let sealed = seal(&key, &nonce, b"", b"")?;
        assert_eq!(sealed.len(), TAG_LEN);
        assert!(open(&key, &nonce, &sealed, b"")?.is_empty());
        Ok(())
    }

    #[test]
    fn wrong_key_fails() -> Result<()> {
        let nonce = AeadNonce::generate();
        let sealed = seal(&[0x42u8; 32], &nonce, b"secret", b"")?;
        let result = open(&[0x43u8; 32], &nonce, &sealed, b"");
        assert!(matches!(result, Err(LocalStoreError::CryptoError { .. })));
        Ok(())
    }

    #[test]
    fn changed_aad_fails() -> Result<()> {
        let key = [0x42u8; 32];
        let nonce = AeadNonce::generate();
        let sealed = seal(&key, &nonce, b"secret", b"v1")?;
        assert!(open(&key, &nonce, &sealed, b"v2").is_err());
        Ok(())
    }

    #[test]
    fn fixed_nonce_is_deterministic() -> Result<()> {
        let key = [0xAA; 32];
        let nonce = AeadNonce::from_bytes([0xBB; 24]);
        let a = seal(&key, &nonce, b"same", b"")?;
        let b = seal(&key, &nonce, b"same", b"")?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn generated_nonces_differ() {
        assert_ne!(AeadNonce::generate(), AeadNonce::generate());
    }
}
