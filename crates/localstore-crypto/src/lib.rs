//! Cryptographic primitives for the localstore workspace.
//!
//! This crate is the only place that touches raw crypto. The storage
//! engine sees just the passphrase-level [`codec`] API.
//!
//! # Modules
//!
//! - [`aead`]: XChaCha20-Poly1305 sealing and opening
//! - [`kdf`]: Argon2id passphrase-to-key derivation
//! - [`codec`]: self-describing envelope: `encrypt(plaintext, passphrase)`
//!   and `decrypt(ciphertext, passphrase)`

pub mod aead;
pub mod codec;
pub mod kdf;

pub use codec::{decrypt, encrypt, CipherCodec};
