//! libSQL storage layer: harvest checkpoints and the searchable document index.
//!
//! The [`Storage`] struct wraps a local libSQL database holding:
//! - `settings`: small integer cursors, exposed through [`CheckpointStore`]
//! - `documents`: upserted records keyed by `(index_name, doc_id)`, exposed
//!   through [`BulkIndexer`] and mirrored into an FTS5 table for [`Storage::search`]
//!
//! **Access rules:** one writer at a time. Nothing here locks across
//! processes; overlapping harvest runs race on the checkpoint and the last
//! write wins.

mod migrations;

use std::future::Future;
use std::path::Path;

use chrono::Utc;
use legisharvest_shared::{CHECKPOINT_DOCUMENT, HarvestError, IndexBatch, RecordId, Result};
use libsql::{Connection, Database, params};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Durable integer cursor store.
pub trait CheckpointStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if it was never written.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<i64>>> + Send;

    /// Overwrite the value stored under `key`.
    fn write(&self, key: &str, value: i64) -> impl Future<Output = Result<()>> + Send;
}

/// Outcome of one bulk flush.
#[derive(Debug, Clone, Default)]
pub struct BulkResponse {
    /// Number of documents written.
    pub indexed: usize,
    /// Documents that could not be written, with the reason.
    pub failed: Vec<(RecordId, String)>,
}

/// Bulk upsert sink for index batches.
///
/// Re-indexing an id replaces the previous document entirely. Per-item
/// failures are reported in [`BulkResponse::failed`]; `Err` is reserved for
/// the index being unusable as a whole.
pub trait BulkIndexer: Send + Sync {
    fn flush(&self, batch: &IndexBatch) -> impl Future<Output = Result<BulkResponse>> + Send;
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HarvestError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| HarvestError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode (search, checkpoint show).
    ///
    /// Never creates the file: a missing database is an error.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HarvestError::Storage(format!(
                "no database at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| HarvestError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        HarvestError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(HarvestError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    /// Read an integer setting.
    pub async fn get_setting(&self, document: &str, key: &str) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM settings WHERE document = ?1 AND key = ?2",
                params![document, key],
            )
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<i64>(0)
                    .map_err(|e| HarvestError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(HarvestError::Storage(e.to_string())),
        }
    }

    /// Write an integer setting (last writer wins).
    pub async fn set_setting(&self, document: &str, key: &str, value: i64) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO settings (document, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(document, key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![document, key, value, now.as_str()],
            )
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Upsert one document, replacing any previous body under the same id.
    pub async fn upsert_document(
        &self,
        index: &str,
        id: &RecordId,
        document: &serde_json::Value,
    ) -> Result<()> {
        self.check_writable()?;
        let body = serde_json::to_string(document)
            .map_err(|e| HarvestError::validation(format!("{id}: {e}")))?;
        let search_text = search_text(document);
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO documents (index_name, doc_id, body, search_text, indexed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(index_name, doc_id) DO UPDATE SET
                   body = excluded.body,
                   search_text = excluded.search_text,
                   indexed_at = excluded.indexed_at",
                params![index, id.as_str(), body, search_text, now.as_str()],
            )
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Fetch a document body by index and id.
    pub async fn get_document(&self, index: &str, id: &str) -> Result<Option<serde_json::Value>> {
        let mut rows = self
            .conn
            .query(
                "SELECT body FROM documents WHERE index_name = ?1 AND doc_id = ?2",
                params![index, id],
            )
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let body: String = row
                    .get(0)
                    .map_err(|e| HarvestError::Storage(e.to_string()))?;
                let value = serde_json::from_str(&body)
                    .map_err(|e| HarvestError::Storage(format!("corrupt document {id}: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(HarvestError::Storage(e.to_string())),
        }
    }

    /// Number of documents in an index.
    pub async fn count_documents(&self, index: &str) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM documents WHERE index_name = ?1",
                params![index],
            )
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0).max(0) as u64),
            Ok(None) => Ok(0),
            Err(e) => Err(HarvestError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // FTS search
    // -----------------------------------------------------------------------

    /// Full-text search across documents of one index.
    pub async fn search(&self, index: &str, query: &str, limit: u32) -> Result<Vec<SearchHit>> {
        let mut rows = self
            .conn
            .query(
                "SELECT d.doc_id, d.body, rank
                 FROM documents_fts fts
                 JOIN documents d ON d.rowid = fts.rowid
                 WHERE documents_fts MATCH ?1 AND d.index_name = ?2
                 ORDER BY rank
                 LIMIT ?3",
                params![query, index, limit],
            )
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| HarvestError::Storage(e.to_string()))?
        {
            let id: String = row
                .get(0)
                .map_err(|e| HarvestError::Storage(e.to_string()))?;
            let body: String = row
                .get(1)
                .map_err(|e| HarvestError::Storage(e.to_string()))?;
            let score: f64 = row.get(2).unwrap_or(0.0);
            results.push(SearchHit {
                document: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
                id,
                score,
            });
        }
        Ok(results)
    }
}

impl CheckpointStore for Storage {
    async fn read(&self, key: &str) -> Result<Option<i64>> {
        self.get_setting(CHECKPOINT_DOCUMENT, key).await
    }

    async fn write(&self, key: &str, value: i64) -> Result<()> {
        self.set_setting(CHECKPOINT_DOCUMENT, key, value).await
    }
}

impl BulkIndexer for Storage {
    async fn flush(&self, batch: &IndexBatch) -> Result<BulkResponse> {
        self.check_writable()?;

        let mut response = BulkResponse::default();
        for op in &batch.ops {
            match self.upsert_document(&batch.index, &op.id, &op.document).await {
                Ok(()) => response.indexed += 1,
                Err(e) => {
                    warn!(index = %batch.index, id = %op.id, error = %e, "failed to index document");
                    response.failed.push((op.id.clone(), e.to_string()));
                }
            }
        }

        if response.indexed == 0 && !response.failed.is_empty() {
            let (_, first) = &response.failed[0];
            return Err(HarvestError::Storage(format!(
                "bulk flush to {} failed for all {} documents: {first}",
                batch.index,
                response.failed.len()
            )));
        }

        debug!(
            index = %batch.index,
            indexed = response.indexed,
            failed = response.failed.len(),
            "bulk flush"
        );
        Ok(response)
    }
}

/// A search result from FTS5.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Document id within the index.
    pub id: String,
    /// Stored document body.
    pub document: serde_json::Value,
    /// FTS5 rank score (lower is better).
    pub score: f64,
}

/// Flatten every string and number in a document into one searchable line.
fn search_text(value: &serde_json::Value) -> String {
    fn walk(value: &serde_json::Value, out: &mut Vec<String>) {
        match value {
            serde_json::Value::String(s) => out.push(s.clone()),
            serde_json::Value::Number(n) => out.push(n.to_string()),
            serde_json::Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            serde_json::Value::Object(map) => map.values().for_each(|v| walk(v, out)),
            serde_json::Value::Bool(_) | serde_json::Value::Null => {}
        }
    }

    let mut parts = Vec::new();
    walk(value, &mut parts);
    parts.join(" ")
}
