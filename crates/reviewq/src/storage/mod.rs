//! Storage backend implementations.
//!
//! This module provides concrete implementations of the repository traits
//! defined in `reviewq_core::storage`. The implementations are selected
//! at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): process-local store, nothing persisted
//! - `sqlite`: SQLite storage backend using `rusqlite` and `tokio-rusqlite`
//! - `dynamodb`: AWS DynamoDB storage backend using `aws-sdk-dynamodb`
//!
//! These features are mutually exclusive - only one storage backend can be
//! enabled at a time.
//!
//! # Examples
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p reviewq --no-default-features --features sqlite
//! ```
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p reviewq --no-default-features --features dynamodb
//! ```

// Compile-time checks for mutual exclusivity
#[cfg(any(
    all(feature = "inmemory", feature = "sqlite"),
    all(feature = "inmemory", feature = "dynamodb"),
    all(feature = "sqlite", feature = "dynamodb"),
))]
compile_error!(
    "Features 'inmemory', 'sqlite' and 'dynamodb' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "sqlite", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory', 'sqlite' or 'dynamodb' feature. \
    Example: cargo build -p reviewq --no-default-features --features sqlite"
);

// Tests run against the in-memory store whatever backend is selected.
#[cfg(any(test, feature = "inmemory"))]
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
