//! Lifecycle operations.
//!
//! Each operation acquires the cached store from the [`ConnectionCache`],
//! performs one logical step against Pending, Completed or Backup, and
//! returns a typed result. No state is kept between calls.
//!
//! [`ConnectionCache`]: crate::connection::ConnectionCache

mod completed;
mod error;
mod pending;

pub use completed::{export, find_completed, list_completed, stats};
pub use error::LifecycleError;
pub use pending::{fetch_all, fetch_one, reset, seed, submit, SeedSummary};
