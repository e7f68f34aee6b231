//! Encrypted, file-backed key-value store.
//!
//! [`LocalStore`] keeps every value in an in-memory cache and persists
//! the non-volatile subset as a single encrypted JSON file. Subsystems:
//! the cache with its volatile-key set, the atomic storage file, and the
//! engine tying them together.

pub mod cache;
pub mod storage_file;
pub mod store;

pub use store::LocalStore;
