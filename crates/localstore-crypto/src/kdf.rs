//! Argon2id key derivation.
//!
//! Turns the configured passphrase plus a per-file random salt into the
//! 256-bit XChaCha20 key. Invalid parameters return
//! [`LocalStoreError::ConfigError`].

use localstore_types::config::KdfConfig;
use localstore_types::{LocalStoreError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Salt length written into every envelope.
pub const SALT_LEN: usize = 16;

/// Minimum salt length accepted by [`derive_key`].
const MIN_SALT_LEN: usize = 8;

/// Upper bounds applied to parameters read back from an envelope.
const MAX_M_COST: u32 = 1_048_576; // 1 GiB
const MAX_T_COST: u32 = 64;
const MAX_P_COST: u32 = 16;

// ---------------------------------------------------------------------------
// Argon2Params
// ---------------------------------------------------------------------------

/// Argon2id tuning parameters.
///
/// | Parameter | Default | Meaning |
/// |-----------|---------|---------|
/// | `m_cost`  | 65 536  | Memory usage in KiB (64 MiB) |
/// | `t_cost`  | 3       | Number of passes |
/// | `p_cost`  | 1       | Degree of parallelism |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB. Must be ≥ 8 × `p_cost`.
    pub m_cost: u32,
    /// Time cost. Must be ≥ 1.
    pub t_cost: u32,
    /// Parallelism. Must be ≥ 1.
    pub p_cost: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        KdfConfig::default().into()
    }
}

impl From<KdfConfig> for Argon2Params {
    fn from(cfg: KdfConfig) -> Self {
        Self {
            m_cost: cfg.m_cost,
            t_cost: cfg.t_cost,
            p_cost: cfg.p_cost,
        }
    }
}

impl Argon2Params {
    /// Rejects parameters too expensive to honour when they come from an
    /// untrusted file header.
    pub fn check_bounds(&self) -> Result<()> {
        if self.m_cost > MAX_M_COST || self.t_cost > MAX_T_COST || self.p_cost > MAX_P_COST {
            return Err(LocalStoreError::CryptoError {
                reason: format!(
                    "key derivation parameters out of bounds (m={}, t={}, p={})",
                    self.m_cost, self.t_cost, self.p_cost
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DerivedKey
// ---------------------------------------------------------------------------

/// 256-bit key derived by Argon2id, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    /// Returns the raw key material.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Draws a fresh random salt from OS entropy.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derives a 256-bit key from `passphrase` and `salt`.
///
/// # Errors
///
/// - [`LocalStoreError::ConfigError`] if the salt is shorter than 8 bytes
///   or the parameters are rejected by Argon2 (e.g. `t_cost = 0`).
/// - [`LocalStoreError::CryptoError`] if the computation itself fails.
pub fn derive_key(passphrase: &[u8], salt: &[u8], params: &Argon2Params) -> Result<DerivedKey> {
    if salt.len() < MIN_SALT_LEN {
        return Err(LocalStoreError::ConfigError {
            reason: format!("salt must be at least {MIN_SALT_LEN} bytes, got {}", salt.len()),
        });
    }

    let argon2_params = argon2::Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| LocalStoreError::ConfigError {
            reason: format!("invalid Argon2 parameters: {e}"),
        })?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| LocalStoreError::CryptoError {
            reason: format!("Argon2id derivation failed: {e}"),
        })?;

    let key = DerivedKey(output);
    output.zeroize();
    Ok(key)
}
