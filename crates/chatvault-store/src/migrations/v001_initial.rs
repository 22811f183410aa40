//! v001 -- Initial schema creation.
//!
//! One table holds every archived document; collections are a naming
//! convention, not a schema concern, so new conversation scopes need no
//! migration.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Documents
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,              -- e.g. 'UserID-user', 'Message-group-<id>'
    doc_id     TEXT NOT NULL,              -- platform-issued user/message id
    body       TEXT NOT NULL,              -- JSON object
    updated_at TEXT NOT NULL,              -- ISO-8601 / RFC-3339

    PRIMARY KEY (collection, doc_id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
"#;

/// Apply the migration.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
