//! SQLite schema definitions and SQL statements.
//!
//! Table names come from validated configuration, so every statement is built
//! once per repository instead of living in a `const`. Pure data, no I/O.

use crate::config::Collections;

/// Every SQL statement the repository runs, rendered for one set of tables.
#[derive(Debug, Clone)]
pub struct Statements {
    pub create_tables: String,

    pub select_pending: String,
    pub count_pending: String,
    pub insert_pending: String,
    pub delete_pending: String,
    pub clear_pending: String,

    pub insert_completed: String,
    pub select_completed: String,
    pub select_completed_by_review: String,
    pub count_completed: String,

    pub select_backup: String,
    pub insert_backup: String,
    pub clear_backup: String,
}

impl Statements {
    pub fn new(collections: &Collections) -> Self {
        let Collections {
            pending,
            completed,
            backup,
        } = collections;

        Self {
            create_tables: format!(
                r#"
-- Pending queue, seq keeps insertion order
CREATE TABLE IF NOT EXISTS {pending} (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    doc TEXT NOT NULL
);

-- Completed reviews, append-only
CREATE TABLE IF NOT EXISTS {completed} (
    doc_id TEXT PRIMARY KEY,
    review_id TEXT,
    submitted_at TEXT NOT NULL,
    doc TEXT NOT NULL
);

-- Snapshot of the last seeded queue
CREATE TABLE IF NOT EXISTS {backup} (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    doc TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_{completed}_order ON {completed}(submitted_at DESC, doc_id DESC);
CREATE INDEX IF NOT EXISTS idx_{completed}_review_id ON {completed}(review_id);
"#
            ),

            select_pending: format!("SELECT doc FROM {pending} ORDER BY seq LIMIT ?1"),
            count_pending: format!("SELECT COUNT(*) FROM {pending}"),
            insert_pending: format!("INSERT INTO {pending} (id, doc) VALUES (?1, ?2)"),
            delete_pending: format!("DELETE FROM {pending} WHERE id = ?1"),
            clear_pending: format!("DELETE FROM {pending}"),

            insert_completed: format!(
                "INSERT INTO {completed} (doc_id, review_id, submitted_at, doc) VALUES (?1, ?2, ?3, ?4)"
            ),
            // LIMIT -1 means unbounded in SQLite.
            select_completed: format!(
                "SELECT doc FROM {completed} ORDER BY submitted_at DESC, doc_id DESC LIMIT ?1"
            ),
            select_completed_by_review: format!(
                "SELECT doc FROM {completed} WHERE review_id = ?1 \
                 ORDER BY submitted_at DESC, doc_id DESC LIMIT 1"
            ),
            count_completed: format!("SELECT COUNT(*) FROM {completed}"),

            select_backup: format!("SELECT doc FROM {backup} ORDER BY seq"),
            insert_backup: format!("INSERT INTO {backup} (doc) VALUES (?1)"),
            clear_backup: format!("DELETE FROM {backup}"),
        }
    }
}
