//! Persisted per-tool form state.
//!
//! Each tool that remembers its inputs declares a [`ToolState`] type with a
//! storage scope and a serde schema. [`ToolStateStore`] reads and writes
//! those types through a raw [`KvBackend`]. Missing or undecodable stored
//! state loads as the type's default.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use devtoolbox_core::json::Indent;
use devtoolbox_core::lorem::GenerationRequest;
use devtoolbox_core::regex_eval::RegexFlags;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Raw string storage keyed by scope.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| anyhow!("kv lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| anyhow!("kv lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| anyhow!("kv lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// `tool_state` table backend.
pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KvBackend for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM tool_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read tool state '{}'", key))?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tool_state (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write tool state '{}'", key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM tool_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// A typed piece of remembered tool input.
pub trait ToolState: Serialize + DeserializeOwned + Default {
    /// Storage key, unique per tool.
    const SCOPE: &'static str;
}

/// Last lorem generator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoremState {
    pub request: GenerationRequest,
}

impl ToolState for LoremState {
    const SCOPE: &'static str = "lorem";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexState {
    pub pattern: String,
    pub flags: RegexFlags,
}

impl ToolState for RegexState {
    const SCOPE: &'static str = "regex";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Base64State {
    pub url_safe: bool,
}

impl ToolState for Base64State {
    const SCOPE: &'static str = "base64";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonState {
    pub indent: Indent,
}

impl ToolState for JsonState {
    const SCOPE: &'static str = "json";
}

#[derive(Clone)]
pub struct ToolStateStore {
    backend: Arc<dyn KvBackend>,
}

impl ToolStateStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKv::new()))
    }

    /// Stored `S`, or `None` when nothing usable is stored.
    pub async fn find<S: ToolState>(&self) -> Option<S> {
        let raw = match self.backend.get(S::SCOPE).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(scope = S::SCOPE, error = %e, "tool state unavailable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(scope = S::SCOPE, error = %e, "discarding undecodable tool state");
                None
            }
        }
    }

    /// Load `S`, or `S::default()` when nothing usable is stored.
    pub async fn load<S: ToolState>(&self) -> S {
        self.find().await.unwrap_or_default()
    }

    pub async fn save<S: ToolState>(&self, state: &S) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.backend.put(S::SCOPE, &raw).await
    }

    pub async fn clear<S: ToolState>(&self) -> Result<()> {
        self.backend.remove(S::SCOPE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devtoolbox_core::lorem::Unit;

    #[tokio::test]
    async fn test_missing_state_is_default() {
        let store = ToolStateStore::in_memory();
        assert_eq!(store.load::<RegexState>().await, RegexState::default());
        assert!(store.find::<RegexState>().await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = ToolStateStore::in_memory();
        let mut state = LoremState::default();
        state.request.unit = Unit::Words;
        state.request.count = 40;
        store.save(&state).await.unwrap();

        assert_eq!(store.load::<LoremState>().await, state);
        // Scopes are independent.
        assert_eq!(store.load::<JsonState>().await, JsonState::default());
    }

    #[tokio::test]
    async fn test_corrupt_state_falls_back() {
        let kv = Arc::new(MemoryKv::new());
        kv.put(JsonState::SCOPE, "{not json").await.unwrap();
        kv.put(Base64State::SCOPE, r#"{"url_safe": "yes"}"#).await.unwrap();
        let store = ToolStateStore::new(kv);

        assert_eq!(store.load::<JsonState>().await, JsonState::default());
        assert_eq!(store.load::<Base64State>().await, Base64State::default());
    }

    #[tokio::test]
    async fn test_regex_state_keeps_pattern_and_flags_only() {
        let kv = Arc::new(MemoryKv::new());
        let store = ToolStateStore::new(kv.clone());
        let state = RegexState {
            pattern: r"\d+".to_string(),
            flags: RegexFlags {
                global: true,
                ..Default::default()
            },
        };
        store.save(&state).await.unwrap();
        let raw = kv.get(RegexState::SCOPE).await.unwrap().unwrap();
        assert!(!raw.contains("test_string"));

        // Rows written with the input text still load.
        kv.put(
            RegexState::SCOPE,
            r#"{"pattern": "a", "flags": {"global": true}, "test_string": "aaa"}"#,
        )
        .await
        .unwrap();
        let loaded = store.load::<RegexState>().await;
        assert_eq!(loaded.pattern, "a");
        assert!(loaded.flags.global);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = ToolStateStore::in_memory();
        store.save(&Base64State { url_safe: true }).await.unwrap();
        store.clear::<Base64State>().await.unwrap();
        assert!(!store.load::<Base64State>().await.url_safe);
    }
}
