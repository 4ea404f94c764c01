//! SQL migration definitions for the legisharvest database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: settings, documents, FTS5",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Small integer settings (harvest checkpoints)
CREATE TABLE IF NOT EXISTS settings (
    document   TEXT NOT NULL,
    key        TEXT NOT NULL,
    value      INTEGER NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (document, key)
);

-- Indexed documents, addressed by (index_name, doc_id)
CREATE TABLE IF NOT EXISTS documents (
    index_name  TEXT NOT NULL,
    doc_id      TEXT NOT NULL,
    body        TEXT NOT NULL,
    search_text TEXT NOT NULL,
    indexed_at  TEXT NOT NULL,
    UNIQUE(index_name, doc_id)
);

CREATE INDEX IF NOT EXISTS idx_documents_index ON documents(index_name);

-- Full-text search on documents
CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
    search_text,
    content=documents,
    content_rowid=rowid
);

-- Triggers to keep FTS in sync with documents table
CREATE TRIGGER IF NOT EXISTS documents_fts_insert AFTER INSERT ON documents BEGIN
    INSERT INTO documents_fts(rowid, search_text)
    VALUES (new.rowid, new.search_text);
END;

CREATE TRIGGER IF NOT EXISTS documents_fts_delete AFTER DELETE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, search_text)
    VALUES ('delete', old.rowid, old.search_text);
END;

CREATE TRIGGER IF NOT EXISTS documents_fts_update AFTER UPDATE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, search_text)
    VALUES ('delete', old.rowid, old.search_text);
    INSERT INTO documents_fts(rowid, search_text)
    VALUES (new.rowid, new.search_text);
END;

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
