use std::{env, time::Duration};

use thiserror::Error;

/// Problems found by [`Config::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid collection name {0:?}: only ASCII letters, digits and '_' are allowed")]
    InvalidCollectionName(String),
    #[error("Collection names must be distinct, {0:?} is used twice")]
    DuplicateCollectionName(String),
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Names of the three collections inside the logical database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub pending: String,
    pub completed: String,
    pub backup: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            pending: "pending_reviews".to_string(),
            completed: "completed_reviews".to_string(),
            backup: "pending_reviews_backup".to_string(),
        }
    }
}

/// Bounded timeouts applied when opening and using the database connection,
/// plus the overall bound on one HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub server_selection: Duration,
    pub socket: Duration,
    /// Requests running longer are answered with 408.
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(10_000),
            server_selection: Duration::from_millis(5_000),
            socket: Duration::from_millis(10_000),
            request: Duration::from_millis(10_000),
        }
    }
}

/// Application configuration loaded once from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string: SQLite path or DynamoDB endpoint override.
    pub database_url: Option<String>,
    /// Logical database name (DynamoDB table name, default SQLite file stem).
    pub database_name: String,
    pub collections: Collections,
    pub timeouts: Timeouts,
    /// Upper bound on Fetch-All results (default: 500).
    pub fetch_all_limit: usize,
    /// List-Completed bound when the caller gives none (default: 100).
    pub completed_default_limit: usize,
    /// Hard List-Completed bound (default: 1,000).
    pub completed_max_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_name: "llm_reviews".to_string(),
            collections: Collections::default(),
            timeouts: Timeouts::default(),
            fetch_all_limit: 500,
            completed_default_limit: 100,
            completed_max_limit: 1_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite path or DynamoDB endpoint (default: unset)
    /// - `DATABASE_NAME` - Logical database name (default: "llm_reviews")
    /// - `PENDING_COLLECTION` - (default: "pending_reviews")
    /// - `COMPLETED_COLLECTION` - (default: "completed_reviews")
    /// - `BACKUP_COLLECTION` - (default: "pending_reviews_backup")
    /// - `CONNECT_TIMEOUT_MS` - (default: 10,000)
    /// - `SERVER_SELECTION_TIMEOUT_MS` - (default: 5,000)
    /// - `SOCKET_TIMEOUT_MS` - (default: 10,000)
    /// - `REQUEST_TIMEOUT_MS` - HTTP request bound (default: 10,000)
    /// - `FETCH_ALL_LIMIT` - (default: 500)
    /// - `COMPLETED_DEFAULT_LIMIT` - (default: 100)
    /// - `COMPLETED_MAX_LIMIT` - (default: 1,000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Missing or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            database_name: string("DATABASE_NAME", &defaults.database_name),
            collections: Collections {
                pending: string("PENDING_COLLECTION", &defaults.collections.pending),
                completed: string("COMPLETED_COLLECTION", &defaults.collections.completed),
                backup: string("BACKUP_COLLECTION", &defaults.collections.backup),
            },
            timeouts: Timeouts {
                connect: millis("CONNECT_TIMEOUT_MS", defaults.timeouts.connect),
                server_selection: millis(
                    "SERVER_SELECTION_TIMEOUT_MS",
                    defaults.timeouts.server_selection,
                ),
                socket: millis("SOCKET_TIMEOUT_MS", defaults.timeouts.socket),
                request: millis("REQUEST_TIMEOUT_MS", defaults.timeouts.request),
            },
            fetch_all_limit: number("FETCH_ALL_LIMIT", defaults.fetch_all_limit),
            completed_default_limit: number(
                "COMPLETED_DEFAULT_LIMIT",
                defaults.completed_default_limit,
            ),
            completed_max_limit: number("COMPLETED_MAX_LIMIT", defaults.completed_max_limit),
        }
    }

    /// Rejects configurations that would produce unsafe identifiers or
    /// unusable bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            &self.collections.pending,
            &self.collections.completed,
            &self.collections.backup,
        ];
        for name in names {
            if !is_valid_identifier(name) {
                return Err(ConfigError::InvalidCollectionName(name.clone()));
            }
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ConfigError::DuplicateCollectionName((*name).clone()));
            }
        }

        let bounds = [
            ("FETCH_ALL_LIMIT", self.fetch_all_limit),
            ("COMPLETED_DEFAULT_LIMIT", self.completed_default_limit),
            ("COMPLETED_MAX_LIMIT", self.completed_max_limit),
        ];
        for (name, value) in bounds {
            if value == 0 {
                return Err(ConfigError::ZeroValue(name));
            }
        }
        if self.timeouts.connect.is_zero() {
            return Err(ConfigError::ZeroValue("CONNECT_TIMEOUT_MS"));
        }
        if self.timeouts.request.is_zero() {
            return Err(ConfigError::ZeroValue("REQUEST_TIMEOUT_MS"));
        }
        Ok(())
    }

    /// Path of the SQLite database file.
    #[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
    pub fn sqlite_path(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("{}.db", self.database_name))
    }
}

fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = from_map(&[]);

        assert_eq!(config.database_url, None);
        assert_eq!(config.database_name, "llm_reviews");
        assert_eq!(config.collections.pending, "pending_reviews");
        assert_eq!(config.collections.completed, "completed_reviews");
        assert_eq!(config.collections.backup, "pending_reviews_backup");
        assert_eq!(config.timeouts.connect, Duration::from_secs(10));
        assert_eq!(config.timeouts.server_selection, Duration::from_secs(5));
        assert_eq!(config.timeouts.socket, Duration::from_secs(10));
        assert_eq!(config.timeouts.request, Duration::from_secs(10));
        assert_eq!(config.fetch_all_limit, 500);
        assert_eq!(config.completed_default_limit, 100);
        assert_eq!(config.completed_max_limit, 1_000);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let config = from_map(&[
            ("DATABASE_URL", "/tmp/reviews.db"),
            ("PENDING_COLLECTION", "queue"),
            ("CONNECT_TIMEOUT_MS", "2500"),
            ("REQUEST_TIMEOUT_MS", "30000"),
            ("FETCH_ALL_LIMIT", "not-a-number"),
        ]);

        assert_eq!(config.database_url.as_deref(), Some("/tmp/reviews.db"));
        assert_eq!(config.collections.pending, "queue");
        assert_eq!(config.timeouts.connect, Duration::from_millis(2500));
        assert_eq!(config.timeouts.request, Duration::from_secs(30));
        assert_eq!(config.fetch_all_limit, 500);
    }

    #[test]
    fn test_blank_database_url_is_unset() {
        let config = from_map(&[("DATABASE_URL", "  ")]);
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn test_sqlite_path() {
        assert_eq!(from_map(&[]).sqlite_path(), "llm_reviews.db");
        assert_eq!(
            from_map(&[("DATABASE_URL", "data/r.db")]).sqlite_path(),
            "data/r.db"
        );
    }

    #[test]
    fn test_validate_rejects_unsafe_names() {
        let config = from_map(&[("COMPLETED_COLLECTION", "done; DROP TABLE x")]);

        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCollectionName(
                "done; DROP TABLE x".to_string()
            ))
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let config = from_map(&[("BACKUP_COLLECTION", "pending_reviews")]);

        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateCollectionName(
                "pending_reviews".to_string()
            ))
        );
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let config = from_map(&[("COMPLETED_MAX_LIMIT", "0")]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroValue("COMPLETED_MAX_LIMIT"))
        );
    }
}
