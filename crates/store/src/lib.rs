//! # Aanya Store
//!
//! Persistent mapping from user identity to personalization attributes and
//! raw chat transcripts, on an embedded SQLite database.
//!
//! The store exclusively owns persisted state. Request handling holds
//! transient copies for the duration of one request/response cycle; writes
//! to the same user's profile or the same session's transcript serialize
//! through row-level transactions here.

mod sqlite;

pub use sqlite::{MESSAGE_RETENTION_CAP, ProfileStore};
