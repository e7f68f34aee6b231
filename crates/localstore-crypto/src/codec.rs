//! Passphrase-level envelope encryption.
//!
//! [`encrypt`] derives a key from the passphrase with a fresh salt, seals
//! the plaintext under a fresh nonce, and emits a self-describing
//! envelope; [`decrypt`] needs nothing but that envelope and the
//! passphrase.
//!
//! # Envelope Format
//!
//! ```text
//! [version 1B][m_cost 4B LE][t_cost 4B LE][p_cost 4B LE][salt 16B][nonce 24B][ciphertext + tag 16B]
//! ```
//!
//! The 13-byte header (version and KDF costs) is bound to the ciphertext
//! as AEAD associated data.

use localstore_types::{LocalStoreError, Result};

use crate::aead::{open, seal, AeadNonce, TAG_LEN};
use crate::kdf::{derive_key, generate_salt, Argon2Params, SALT_LEN};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current envelope version.
const VERSION: u8 = 1;

/// Version byte plus three little-endian `u32` costs.
const HEADER_LEN: usize = 1 + 3 * 4;

/// Offset of the salt inside the envelope.
const SALT_OFFSET: usize = HEADER_LEN;

/// Offset of the nonce inside the envelope.
const NONCE_OFFSET: usize = SALT_OFFSET + SALT_LEN;

/// Offset of the sealed payload inside the envelope.
const PAYLOAD_OFFSET: usize = NONCE_OFFSET + AeadNonce::LEN;

/// Smallest valid envelope: empty plaintext.
pub const MIN_ENVELOPE_LEN: usize = PAYLOAD_OFFSET + TAG_LEN;

// ---------------------------------------------------------------------------
// CipherCodec
// ---------------------------------------------------------------------------

/// Symmetric codec carrying the key-derivation cost for new envelopes.
///
/// Stateless apart from its parameters; every call draws new randomness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CipherCodec {
    params: Argon2Params,
}

impl CipherCodec {
    /// Creates a codec that writes envelopes with the given KDF cost.
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    /// KDF parameters used by [`encrypt`](Self::encrypt).
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    /// Encrypts `plaintext` under `passphrase`.
    ///
    /// Two calls with identical input produce different output because
    /// salt and nonce are fresh each time.
    pub fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        let header = encode_header(&self.params);
        let salt = generate_salt();
        let nonce = AeadNonce::generate();

        let key = derive_key(passphrase.as_bytes(), &salt, &self.params)?;
        let sealed = seal(key.as_bytes(), &nonce, plaintext, &header)?;

        let mut output = Vec::with_capacity(PAYLOAD_OFFSET + sealed.len());
        output.extend_from_slice(&header);
        output.extend_from_slice(&salt);
        output.extend_from_slice(nonce.as_bytes());
        output.extend_from_slice(&sealed);
        Ok(output)
    }

    /// Decrypts an envelope. The KDF cost is read from the envelope, not
    /// from this codec.
    pub fn decrypt(&self, envelope: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        decrypt(envelope, passphrase)
    }
}

/// Encrypts with [`Argon2Params::default`].
pub fn encrypt(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    CipherCodec::default().encrypt(plaintext, passphrase)
}

/// Decrypts an envelope produced by [`encrypt`] or
/// [`CipherCodec::encrypt`].
///
/// # Errors
///
/// [`LocalStoreError::CryptoError`] if the envelope is truncated, has an
/// unknown version, carries out-of-bounds KDF parameters, or fails
/// authentication (wrong passphrase or modified bytes).
pub fn decrypt(envelope: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    if envelope.len() < MIN_ENVELOPE_LEN {
        return Err(LocalStoreError::CryptoError {
            reason: format!(
                "envelope too short: expected at least {MIN_ENVELOPE_LEN} bytes, got {}",
                envelope.len()
            ),
        });
    }

    let header = &envelope[..HEADER_LEN];
    let params = decode_header(header)?;
    params.check_bounds()?;

    let salt = &envelope[SALT_OFFSET..NONCE_OFFSET];

    let mut nonce_bytes = [0u8; AeadNonce::LEN];
    nonce_bytes.copy_from_slice(&envelope[NONCE_OFFSET..PAYLOAD_OFFSET]);
    let nonce = AeadNonce::from_bytes(nonce_bytes);

    let key = derive_key(passphrase.as_bytes(), salt, &params).map_err(|e| match e {
        // A header that passed the bounds check but is still rejected by
        // Argon2 is corrupt data, not a configuration mistake.
        LocalStoreError::ConfigError { reason } => LocalStoreError::CryptoError { reason },
        other => other,
    })?;

    open(key.as_bytes(), &nonce, &envelope[PAYLOAD_OFFSET..], header)
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn encode_header(params: &Argon2Params) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = VERSION;
    header[1..5].copy_from_slice(&params.m_cost.to_le_bytes());
    header[5..9].copy_from_slice(&params.t_cost.to_le_bytes());
    header[9..13].copy_from_slice(&params.p_cost.to_le_bytes());
    header
}

fn decode_header(header: &[u8]) -> Result<Argon2Params> {
    if header[0] != VERSION {
        return Err(LocalStoreError::CryptoError {
            reason: format!("unsupported envelope version {}", header[0]),
        });
    }
    Ok(Argon2Params {
        m_cost: read_u32(header, 1),
        t_cost: read_u32(header, 5),
        p_cost: read_u32(header, 9),
    })
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}
