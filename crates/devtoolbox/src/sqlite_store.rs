//! SQLite-backed [`DocumentStore`].
//!
//! Every collection shares the `documents` table, keyed by
//! `(collection, id)`. Bodies are stored as JSON text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use devtoolbox_core::store::{DocumentStore, StoredDocument};
use sqlx::{Row, SqlitePool};

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn put(&self, collection: &str, id: &str, body: &serde_json::Value) -> Result<()> {
        let text = serde_json::to_string(body)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&text)
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write {}/{}", collection, id))?;

        tracing::debug!(collection, id, "document stored");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete {}/{}", collection, id))?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            "SELECT id, body FROM documents WHERE collection = ? ORDER BY updated_at DESC, id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to list {}", collection))?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let body: String = row.get("body");
            match serde_json::from_str(&body) {
                Ok(body) => docs.push(StoredDocument { id, body }),
                Err(e) => tracing::warn!(collection, id, error = %e, "skipping unreadable document"),
            }
        }
        Ok(docs)
    }
}
