//! Integration tests for the passphrase envelope codec.
//!
//! Most tests use light Argon2 parameters; one exercises the default
//! cost through the free functions.

use localstore_crypto::codec::MIN_ENVELOPE_LEN;
use localstore_crypto::kdf::Argon2Params;
use localstore_crypto::{decrypt, encrypt, CipherCodec};
use localstore_types::LocalStoreError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn codec() -> CipherCodec {
    CipherCodec::new(Argon2Params {
        m_cost: 256,
        t_cost: 1,
        p_cost: 1,
    })
}

const PASSPHRASE: &str = "aqdai6*--8~7Tex(R*|pVARVI0OJeOF>";

fn is_crypto_error<T>(result: &Result<T, LocalStoreError>) -> bool {
    matches!(result, Err(LocalStoreError::CryptoError { .. }))
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_recovers_plaintext() -> Result<(), LocalStoreError> {
    let plaintext = br#"{"hp":101,"name":"hoge"}"#;
    let envelope = codec().encrypt(plaintext, PASSPHRASE)?;
    assert_ne!(&envelope[..], &plaintext[..]);
    assert_eq!(codec().decrypt(&envelope, PASSPHRASE)?, plaintext);
    Ok(())
}

#[test]
fn default_cost_free_functions_roundtrip() -> Result<(), LocalStoreError> {
    let envelope = encrypt(b"settings", "password")?;
    assert_eq!(decrypt(&envelope, "password")?, b"settings");
    Ok(())
}

#[test]
fn decrypt_reads_cost_from_envelope() -> Result<(), LocalStoreError> {
    let heavier = CipherCodec::new(Argon2Params {
        m_cost: 512,
        t_cost: 2,
        p_cost: 1,
    });
    let envelope = heavier.encrypt(b"payload", PASSPHRASE)?;
    // A codec configured with different costs still opens it.
    assert_eq!(codec().decrypt(&envelope, PASSPHRASE)?, b"payload");
    Ok(())
}

#[test]
fn repeated_encryption_differs() -> Result<(), LocalStoreError> {
    let a = codec().encrypt(b"same plaintext", PASSPHRASE)?;
    let b = codec().encrypt(b"same plaintext", PASSPHRASE)?;
    assert_ne!(a, b);
    assert_eq!(decrypt(&a, PASSPHRASE)?, decrypt(&b, PASSPHRASE)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn wrong_passphrase_is_crypto_error() -> Result<(), LocalStoreError> {
    let envelope = codec().encrypt(b"secret", PASSPHRASE)?;
    assert!(is_crypto_error(&decrypt(&envelope, "not the passphrase")));
    Ok(())
}

#[test]
fn flipped_payload_byte_is_crypto_error() -> Result<(), LocalStoreError> {
    let mut envelope = codec().encrypt(b"secret", PASSPHRASE)?;
    if let Some(last) = envelope.last_mut() {
        *last ^= 0x01;
    }
    assert!(is_crypto_error(&decrypt(&envelope, PASSPHRASE)));
    Ok(())
}

#[test]
fn flipped_salt_byte_is_crypto_error() -> Result<(), LocalStoreError> {
    let mut envelope = codec().encrypt(b"secret", PASSPHRASE)?;
    envelope[13] ^= 0xFF;
    assert!(is_crypto_error(&decrypt(&envelope, PASSPHRASE)));
    Ok(())
}

#[test]
fn altered_header_cost_is_crypto_error() -> Result<(), LocalStoreError> {
    let mut envelope = codec().encrypt(b"secret", PASSPHRASE)?;
    // Bump m_cost from 256 to 257 KiB: in bounds, but authenticated.
    envelope[1..5].copy_from_slice(&257u32.to_le_bytes());
    assert!(is_crypto_error(&decrypt(&envelope, PASSPHRASE)));
    Ok(())
}

#[test]
fn oversized_header_cost_is_rejected_early() -> Result<(), LocalStoreError> {
    let mut envelope = codec().encrypt(b"secret", PASSPHRASE)?;
    envelope[1..5].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(is_crypto_error(&decrypt(&envelope, PASSPHRASE)));
    Ok(())
}

#[test]
fn truncated_envelope_is_crypto_error() -> Result<(), LocalStoreError> {
    let envelope = codec().encrypt(b"secret", PASSPHRASE)?;
    assert!(is_crypto_error(&decrypt(&envelope[..MIN_ENVELOPE_LEN - 1], PASSPHRASE)));
    assert!(is_crypto_error(&decrypt(&envelope[..envelope.len() - 1], PASSPHRASE)));
    assert!(is_crypto_error(&decrypt(&[], PASSPHRASE)));
    Ok(())
}

#[test]
fn garbage_is_crypto_error() {
    let garbage = vec![0x5Au8; 200];
    assert!(is_crypto_error(&decrypt(&garbage, PASSPHRASE)));
}
