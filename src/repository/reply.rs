//! Reply listings and votes

use serde_json::{Value, json};
use std::sync::Arc;

use crate::config::ForumConfig;
use crate::core::entity::EntityId;
use crate::core::error::ForumResult;
use crate::core::include::IncludeRegistry;
use crate::core::query::{Page, QueryParams};
use crate::core::service::ForumStore;
use crate::core::vote::SubjectRef;
use crate::entities::{Entity, Reply};
use crate::repository::{include_user, present_page};
use crate::votes::VoteLedger;

/// Reply access for request handlers
pub struct ReplyRepository<S: ForumStore + ?Sized> {
    store: Arc<S>,
    ledger: VoteLedger<S>,
    config: Arc<ForumConfig>,
}

impl<S: ForumStore + ?Sized> Clone for ReplyRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ledger: self.ledger.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: ForumStore + ?Sized> ReplyRepository<S> {
    pub fn new(store: Arc<S>, config: Arc<ForumConfig>) -> Self {
        let ledger = VoteLedger::new(store.clone(), &config.votes);
        Self::with_ledger(ledger, config)
    }

    pub fn with_ledger(ledger: VoteLedger<S>, config: Arc<ForumConfig>) -> Self {
        Self {
            store: ledger.store().clone(),
            ledger,
            config,
        }
    }

    pub fn registry(&self) -> IncludeRegistry {
        IncludeRegistry::with_max_depth(self.config.includes.max_depth)
    }

    pub fn include_user(&self, registry: &mut IncludeRegistry, default_columns: &[&str]) -> ForumResult<()> {
        include_user(registry, "user", default_columns)
    }

    /// Replies of a topic in posting order
    pub async fn index_by_topic(
        &self,
        registry: &IncludeRegistry,
        topic_id: EntityId,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        self.index_by("topic_id", topic_id, registry, params, columns).await
    }

    /// Replies written by a user
    pub async fn index_by_user(
        &self,
        registry: &IncludeRegistry,
        user_id: EntityId,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        self.index_by("user_id", user_id, registry, params, columns).await
    }

    pub async fn vote_up(&self, user_id: EntityId, reply_id: EntityId) -> ForumResult<bool> {
        self.ledger.cast_up(user_id, SubjectRef::reply(reply_id)).await
    }

    pub async fn vote_down(&self, user_id: EntityId, reply_id: EntityId) -> ForumResult<bool> {
        self.ledger.cast_down(user_id, SubjectRef::reply(reply_id)).await
    }

    async fn index_by(
        &self,
        column: &str,
        id: EntityId,
        registry: &IncludeRegistry,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        let query = params
            .to_list_query(&self.config.pagination)
            .with_filter(column, json!(id));
        let page = self.store.fetch_primary(Reply::RESOURCE_TYPE, &query).await?;

        present_page(self.store.as_ref(), registry, columns, page, &params.includes()).await
    }
}
