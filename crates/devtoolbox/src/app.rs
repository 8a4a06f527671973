//! Application root.
//!
//! [`AppContext`] owns every collaborator the CLI and server use. It is built
//! once in `main` (or by a test) and passed down; nothing reaches for a
//! global.

use anyhow::Result;
use devtoolbox_core::auth::{AuthProvider, LocalAuth};
use devtoolbox_core::services::{BookmarkService, FeedbackService};
use devtoolbox_core::store::memory::InMemoryDocumentStore;
use devtoolbox_core::store::DocumentStore;
use std::sync::Arc;

use crate::config::Config;
use crate::sqlite_store::SqliteDocumentStore;
use crate::tool_state::{SqliteKv, ToolStateStore};
use crate::traits::{ToolContext, ToolRegistry};
use crate::{db, migrate};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub state: ToolStateStore,
    pub tools: Arc<ToolRegistry>,
}

impl AppContext {
    /// Open the SQLite database from `[db] path`, migrating it if needed.
    pub async fn open(config: Config) -> Result<Self> {
        let pool = db::connect(&config).await?;
        migrate::run_migrations(&pool).await?;

        let auth = LocalAuth::signed_in(config.auth.user());
        Ok(Self {
            store: Arc::new(SqliteDocumentStore::new(pool.clone())),
            state: ToolStateStore::new(Arc::new(SqliteKv::new(pool))),
            auth: Arc::new(auth),
            tools: Arc::new(ToolRegistry::with_builtins()),
            config: Arc::new(config),
        })
    }

    /// Everything in memory. Nothing survives the process.
    pub fn in_memory(config: Config) -> Self {
        let auth = LocalAuth::signed_in(config.auth.user());
        Self {
            store: Arc::new(InMemoryDocumentStore::new()),
            state: ToolStateStore::in_memory(),
            auth: Arc::new(auth),
            tools: Arc::new(ToolRegistry::with_builtins()),
            config: Arc::new(config),
        }
    }

    /// Replace the tool registry, e.g. to add custom tools.
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    pub fn bookmarks(&self) -> BookmarkService {
        BookmarkService::new(self.store.clone())
    }

    pub fn feedback(&self) -> FeedbackService {
        FeedbackService::new(self.store.clone())
    }

    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(self.config.clone())
    }
}
