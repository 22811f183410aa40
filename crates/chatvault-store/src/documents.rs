//! Generic CRUD over JSON documents.
//!
//! This is the complete surface the handlers consume: create-or-replace,
//! point read, existence check, delete, and top-level partial update.

use chrono::Utc;
use rusqlite::params;
use serde_json::Value;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    // ------------------------------------------------------------------
    // Create / replace
    // ------------------------------------------------------------------

    /// Write a document, replacing any previous body under the same key.
    pub fn upsert(&self, collection: &str, doc_id: &str, body: &Value) -> Result<()> {
        self.conn().execute(
            "INSERT INTO documents (collection, doc_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (collection, doc_id)
             DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![
                collection,
                doc_id,
                body.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single document body.
    pub fn get(&self, collection: &str, doc_id: &str) -> Result<Value> {
        let body: String = self
            .conn()
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection, doc_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        Ok(serde_json::from_str(&body)?)
    }

    /// Whether a document exists under the given key.
    pub fn exists(&self, collection: &str, doc_id: &str) -> Result<bool> {
        let found: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = ?1 AND doc_id = ?2)",
            params![collection, doc_id],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// List all document ids in a collection, ordered by id.
    pub fn list_ids(&self, collection: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT doc_id FROM documents WHERE collection = ?1 ORDER BY doc_id ASC",
        )?;

        let rows = stmt.query_map(params![collection], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    // ------------------------------------------------------------------
    // Update / delete
    // ------------------------------------------------------------------

    /// Merge `patch`'s top-level keys into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document is absent,
    /// matching partial-update semantics of the hosted document stores this
    /// layer stands in for.
    pub fn patch(&self, collection: &str, doc_id: &str, patch: &Value) -> Result<()> {
        let mut body = self.get(collection, doc_id)?;

        if let (Some(target), Some(fields)) = (body.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }

        self.upsert(collection, doc_id, &body)
    }

    /// Delete a document. Returns whether a document was removed.
    pub fn delete(&self, collection: &str, doc_id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
            params![collection, doc_id],
        )?;
        Ok(affected > 0)
    }
}
