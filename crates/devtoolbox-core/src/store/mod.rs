//! Document store collaborator.
//!
//! The [`DocumentStore`] trait is the narrow interface the bookmark and
//! feedback services need from a managed document database: create-or-replace
//! by id, delete by id, and list a collection. Documents are opaque JSON.
//!
//! Collections are slash-separated paths. Per-user data lives under
//! `users/{uid}/...` (see [`user_collection`]).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

pub const BOOKMARKS: &str = "bookmarks";
pub const FEEDBACK: &str = "feedback";
pub const TOOL_REQUESTS: &str = "toolRequests";

/// A document as returned by [`DocumentStore::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub id: String,
    pub body: serde_json::Value,
}

/// Abstract document database.
///
/// # Operations
///
/// | Method | Semantics |
/// |--------|-----------|
/// | [`put`](DocumentStore::put) | Create or replace the document `id` in `collection` |
/// | [`delete`](DocumentStore::delete) | Remove `id`; deleting a missing id is not an error |
/// | [`list`](DocumentStore::list) | All documents in `collection`, in no guaranteed order |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, collection: &str, id: &str, body: &serde_json::Value) -> Result<()>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>>;
}

/// `users/{uid}/{name}`
pub fn user_collection(uid: &str, name: &str) -> String {
    format!("users/{}/{}", uid, name)
}
