use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use warrant_application::ActionCatalog;
use warrant_core::AppResult;
use warrant_domain::ContentRef;

/// In-memory catalog of installed actions keyed by `pack.name`.
#[derive(Debug, Default)]
pub struct InMemoryActionCatalog {
    actions: RwLock<HashMap<String, ContentRef>>,
}

impl InMemoryActionCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an installed action.
    pub async fn register(&self, action: ContentRef) {
        self.actions
            .write()
            .await
            .insert(action.reference(), action);
    }
}

#[async_trait]
impl ActionCatalog for InMemoryActionCatalog {
    async fn find_action_by_ref(&self, action_ref: &str) -> AppResult<Option<ContentRef>> {
        Ok(self.actions.read().await.get(action_ref).cloned())
    }
}
