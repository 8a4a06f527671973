//! In-memory [`DocumentStore`] for tests, the CLI's offline mode, and WASM
//! targets.
//!
//! Uses nested `BTreeMap`s behind a `std::sync::RwLock`.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{DocumentStore, StoredDocument};

type Collections = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put(&self, collection: &str, id: &str, body: &serde_json::Value) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("document store lock poisoned"))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), body.clone());
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("document store lock poisoned"))?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| anyhow!("document store lock poisoned"))?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, body)| StoredDocument {
                        id: id.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
