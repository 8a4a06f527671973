use anyhow::Result;
use sqlx::SqlitePool;

/// Create the `documents` and `tool_state` tables. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Document store collections (bookmarks, feedback, tool requests)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Per-tool form state
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tool_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
        .execute(pool)
        .await?;

    tracing::debug!("migrations complete");
    Ok(())
}
