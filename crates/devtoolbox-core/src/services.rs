//! Account-backed features: bookmarks, feedback, and tool requests.
//!
//! Both services take their [`DocumentStore`] at construction; nothing here
//! reaches for a global client. Required fields are checked before any
//! store call. Store failures are logged and surfaced as
//! [`ServiceError::CollaboratorUnavailable`]; nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::base64_codec;
use crate::error::ServiceError;
use crate::models::{Bookmark, Feedback, ToolRequest};
use crate::store::{user_collection, DocumentStore, BOOKMARKS, FEEDBACK, TOOL_REQUESTS};

fn unavailable(op: &str, err: anyhow::Error) -> ServiceError {
    tracing::warn!(operation = op, error = %err, "document store call failed");
    ServiceError::CollaboratorUnavailable(format!("{}: {}", op, err))
}

fn require(field: &'static str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        Err(ServiceError::UserInputMissing(field))
    } else {
        Ok(())
    }
}

fn to_body<T: Serialize>(op: &str, record: &T) -> Result<serde_json::Value, ServiceError> {
    serde_json::to_value(record).map_err(|e| unavailable(op, e.into()))
}

fn from_body<T: DeserializeOwned>(id: &str, body: serde_json::Value) -> Option<T> {
    match serde_json::from_value(body) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(id, error = %e, "skipping malformed document");
            None
        }
    }
}

/// Input for [`BookmarkService::add`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBookmark {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub href: String,
}

/// Document id for a bookmark: the trimmed link in URL-safe Base64.
///
/// Bookmarking the same page twice replaces the earlier entry, while two
/// different links never share an id.
pub fn bookmark_id(href: &str) -> String {
    base64_codec::encode(href.trim(), true)
}

pub struct BookmarkService {
    store: Arc<dyn DocumentStore>,
}

impl BookmarkService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn add(&self, uid: &str, new: NewBookmark) -> Result<Bookmark, ServiceError> {
        require("user id", uid)?;
        require("title", &new.title)?;
        require("href", &new.href)?;

        let bookmark = Bookmark {
            id: bookmark_id(&new.href),
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            href: new.href.trim().to_string(),
            created_at: Utc::now(),
        };
        let body = to_body("add bookmark", &bookmark)?;
        self.store
            .put(&user_collection(uid, BOOKMARKS), &bookmark.id, &body)
            .await
            .map_err(|e| unavailable("add bookmark", e))?;
        Ok(bookmark)
    }

    pub async fn remove(&self, uid: &str, id: &str) -> Result<(), ServiceError> {
        require("user id", uid)?;
        require("bookmark id", id)?;
        self.store
            .delete(&user_collection(uid, BOOKMARKS), id)
            .await
            .map_err(|e| unavailable("remove bookmark", e))
    }

    /// All bookmarks for `uid`, newest first.
    pub async fn list(&self, uid: &str) -> Result<Vec<Bookmark>, ServiceError> {
        require("user id", uid)?;
        let docs = self
            .store
            .list(&user_collection(uid, BOOKMARKS))
            .await
            .map_err(|e| unavailable("list bookmarks", e))?;
        let mut bookmarks: Vec<Bookmark> = docs
            .into_iter()
            .filter_map(|d| from_body(&d.id, d.body))
            .collect();
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(bookmarks)
    }

    pub async fn is_bookmarked(&self, uid: &str, href: &str) -> Result<bool, ServiceError> {
        let id = bookmark_id(href);
        Ok(self.list(uid).await?.iter().any(|b| b.id == id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFeedback {
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToolRequest {
    pub tool_name: String,
    pub description: String,
    #[serde(default)]
    pub email: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct FeedbackService {
    store: Arc<dyn DocumentStore>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn submit_feedback(&self, new: NewFeedback) -> Result<Feedback, ServiceError> {
        require("message", &new.message)?;
        let feedback = Feedback {
            id: Uuid::new_v4().to_string(),
            message: new.message.trim().to_string(),
            email: non_empty(new.email),
            page: non_empty(new.page),
            created_at: Utc::now(),
        };
        let body = to_body("submit feedback", &feedback)?;
        self.store
            .put(FEEDBACK, &feedback.id, &body)
            .await
            .map_err(|e| unavailable("submit feedback", e))?;
        Ok(feedback)
    }

    pub async fn submit_tool_request(&self, new: NewToolRequest) -> Result<ToolRequest, ServiceError> {
        require("tool name", &new.tool_name)?;
        require("description", &new.description)?;
        let request = ToolRequest {
            id: Uuid::new_v4().to_string(),
            tool_name: new.tool_name.trim().to_string(),
            description: new.description.trim().to_string(),
            email: non_empty(new.email),
            created_at: Utc::now(),
        };
        let body = to_body("submit tool request", &request)?;
        self.store
            .put(TOOL_REQUESTS, &request.id, &body)
            .await
            .map_err(|e| unavailable("submit tool request", e))?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryDocumentStore;
    use crate::store::StoredDocument;
    use anyhow::bail;
    use async_trait::async_trait;

    struct OfflineStore;

    #[async_trait]
    impl DocumentStore for OfflineStore {
        async fn put(&self, _: &str, _: &str, _: &serde_json::Value) -> anyhow::Result<()> {
            bail!("network unreachable")
        }
        async fn delete(&self, _: &str, _: &str) -> anyhow::Result<()> {
            bail!("network unreachable")
        }
        async fn list(&self, _: &str) -> anyhow::Result<Vec<StoredDocument>> {
            bail!("network unreachable")
        }
    }

    fn memory() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::new())
    }

    fn base64_bookmark() -> NewBookmark {
        NewBookmark {
            title: "Base64".to_string(),
            description: "Encode and decode".to_string(),
            href: "/tools/base64".to_string(),
        }
    }

    #[test]
    fn test_bookmark_id_is_path_safe_and_distinct() {
        assert_eq!(bookmark_id(" /tools/base64 "), "L3Rvb2xzL2Jhc2U2NA");
        for (a, b) in [
            ("/tools/json-formatter", "/tools/json_formatter"),
            ("/a?b", "/a/b"),
            ("/Tools/Regex", "/tools/regex"),
        ] {
            assert_ne!(bookmark_id(a), bookmark_id(b), "{} vs {}", a, b);
        }
        assert!(!bookmark_id("/a/b?c=d&e").contains(|c| matches!(c, '/' | '?' | '&' | '=')));
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let svc = BookmarkService::new(memory());
        let added = svc.add("u1", base64_bookmark()).await.unwrap();
        assert_eq!(added.id, bookmark_id("/tools/base64"));

        let listed = svc.list("u1").await.unwrap();
        assert_eq!(listed, vec![added.clone()]);
        assert!(svc.is_bookmarked("u1", "/tools/base64").await.unwrap());
        assert!(svc.list("u2").await.unwrap().is_empty());

        svc.remove("u1", &added.id).await.unwrap();
        assert!(svc.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_href_replaces() {
        let svc = BookmarkService::new(memory());
        svc.add("u1", base64_bookmark()).await.unwrap();
        let mut again = base64_bookmark();
        again.title = "Base64 codec".to_string();
        svc.add("u1", again).await.unwrap();
        let listed = svc.list("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Base64 codec");
    }

    #[tokio::test]
    async fn test_similar_hrefs_are_kept_apart() {
        let svc = BookmarkService::new(memory());
        for href in ["/tools/json-formatter", "/tools/json_formatter"] {
            let new = NewBookmark {
                title: "JSON".to_string(),
                href: href.to_string(),
                ..Default::default()
            };
            svc.add("u1", new).await.unwrap();
        }
        assert_eq!(svc.list("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_input_checked_before_store() {
        let svc = BookmarkService::new(Arc::new(OfflineStore));
        let mut bad = base64_bookmark();
        bad.title = "  ".to_string();
        assert_eq!(
            svc.add("u1", bad).await.unwrap_err(),
            ServiceError::UserInputMissing("title")
        );
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let svc = BookmarkService::new(Arc::new(OfflineStore));
        let err = svc.add("u1", base64_bookmark()).await.unwrap_err();
        assert!(matches!(err, ServiceError::CollaboratorUnavailable(_)));
        assert!(matches!(
            svc.list("u1").await.unwrap_err(),
            ServiceError::CollaboratorUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_feedback_and_tool_request() {
        let store = memory();
        let svc = FeedbackService::new(store.clone());
        let fb = svc
            .submit_feedback(NewFeedback {
                message: "Love the regex tool".to_string(),
                email: Some("  ".to_string()),
                page: Some("/tools/regex".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(fb.email, None);
        assert_eq!(store.list(FEEDBACK).await.unwrap().len(), 1);

        let req = svc
            .submit_tool_request(NewToolRequest {
                tool_name: "UUID generator".to_string(),
                description: "v4 and v7".to_string(),
                email: None,
            })
            .await
            .unwrap();
        let docs = store.list(TOOL_REQUESTS).await.unwrap();
        assert_eq!(docs[0].id, req.id);
        assert_eq!(docs[0].body["toolName"], "UUID generator");

        assert_eq!(
            svc.submit_feedback(NewFeedback::default()).await.unwrap_err(),
            ServiceError::UserInputMissing("message")
        );
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let store = memory();
        store
            .put(&user_collection("u1", BOOKMARKS), "junk", &serde_json::json!({"nope": true}))
            .await
            .unwrap();
        let svc = BookmarkService::new(store);
        svc.add("u1", base64_bookmark()).await.unwrap();
        assert_eq!(svc.list("u1").await.unwrap().len(), 1);
    }
}
