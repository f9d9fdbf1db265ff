//! Logical collection labels carried in [`RepositoryError`](super::RepositoryError).
//!
//! Error payloads name the logical collection, never the configured table or
//! partition name, so every backend reports the same label.

pub const PENDING: &str = "pending";
pub const COMPLETED: &str = "completed";
pub const BACKUP: &str = "backup";
