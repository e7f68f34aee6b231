//! Command handlers. Read-only commands live in [`inspect`], commands
//! that change the storage file in [`edit`].

pub mod edit;
pub mod inspect;
