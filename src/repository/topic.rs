//! Topic listings, includes and votes

use serde_json::{Value, json};
use std::sync::Arc;

use crate::config::ForumConfig;
use crate::core::entity::EntityId;
use crate::core::error::{EntityError, ForumResult};
use crate::core::include::{IncludableSpec, IncludeRegistry, IncludeRequest};
use crate::core::merge::merge_page;
use crate::core::query::{ListQuery, Page, QueryParams};
use crate::core::service::ForumStore;
use crate::core::vote::SubjectRef;
use crate::entities::{Entity, Node, Reply, Topic};
use crate::repository::{include_user, present_one, present_page};
use crate::storage::{ATTENTIONS, FAVORITES};
use crate::votes::VoteLedger;

/// Topic access for request handlers
pub struct TopicRepository<S: ForumStore + ?Sized> {
    store: Arc<S>,
    ledger: VoteLedger<S>,
    config: Arc<ForumConfig>,
}

impl<S: ForumStore + ?Sized> Clone for TopicRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ledger: self.ledger.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: ForumStore + ?Sized> TopicRepository<S> {
    pub fn new(store: Arc<S>, config: Arc<ForumConfig>) -> Self {
        let ledger = VoteLedger::new(store.clone(), &config.votes);
        Self::with_ledger(ledger, config)
    }

    /// Build on an existing ledger so its lock table is shared
    pub fn with_ledger(ledger: VoteLedger<S>, config: Arc<ForumConfig>) -> Self {
        Self {
            store: ledger.store().clone(),
            ledger,
            config,
        }
    }

    pub fn ledger(&self) -> &VoteLedger<S> {
        &self.ledger
    }

    /// A fresh registry honouring the configured include depth
    pub fn registry(&self) -> IncludeRegistry {
        IncludeRegistry::with_max_depth(self.config.includes.max_depth)
    }

    pub fn include_node(&self, registry: &mut IncludeRegistry, default_columns: &[&str]) -> ForumResult<()> {
        registry.add(
            IncludableSpec::make("node")
                .default_columns(default_columns)
                .allow_columns(Node::INCLUDABLE)
                .foreign_key("node_id")
                .target(Node::RESOURCE_TYPE),
        )?;
        Ok(())
    }

    pub fn include_user(&self, registry: &mut IncludeRegistry, default_columns: &[&str]) -> ForumResult<()> {
        include_user(registry, "user", default_columns)
    }

    pub fn include_last_reply_user(
        &self,
        registry: &mut IncludeRegistry,
        default_columns: &[&str],
    ) -> ForumResult<()> {
        include_user(registry, "last_reply_user", default_columns)
    }

    /// Embedded replies are capped at one page
    pub fn include_replies(&self, registry: &mut IncludeRegistry, default_columns: &[&str]) -> ForumResult<()> {
        registry.add(
            IncludableSpec::make("replies")
                .default_columns(default_columns)
                .allow_columns(Reply::INCLUDABLE)
                .owner_key("topic_id")
                .target(Reply::RESOURCE_TYPE)
                .limit(self.config.pagination.per_page),
        )?;
        Ok(())
    }

    /// Must come after [`Self::include_replies`]
    pub fn include_replies_user(
        &self,
        registry: &mut IncludeRegistry,
        default_columns: &[&str],
    ) -> ForumResult<()> {
        include_user(registry, "replies.user", default_columns)
    }

    pub async fn vote_up(&self, user_id: EntityId, topic_id: EntityId) -> ForumResult<bool> {
        self.ledger.cast_up(user_id, SubjectRef::topic(topic_id)).await
    }

    pub async fn vote_down(&self, user_id: EntityId, topic_id: EntityId) -> ForumResult<bool> {
        self.ledger.cast_down(user_id, SubjectRef::topic(topic_id)).await
    }

    /// Topics a user favorited, most recently favorited first
    pub async fn favorite_topics(
        &self,
        registry: &IncludeRegistry,
        user_id: EntityId,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        self.topics_by_reference(FAVORITES, registry, user_id, params, columns)
            .await
    }

    /// Topics a user follows, most recently followed first
    pub async fn attention_topics(
        &self,
        registry: &IncludeRegistry,
        user_id: EntityId,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        self.topics_by_reference(ATTENTIONS, registry, user_id, params, columns)
            .await
    }

    /// Page through a join table and swap its keys for composed topics
    ///
    /// The page metadata describes the join table; topics deleted since they
    /// were referenced are dropped from the page without renumbering.
    pub async fn topics_by_reference(
        &self,
        table: &str,
        registry: &IncludeRegistry,
        user_id: EntityId,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        let reference = self
            .store
            .reference_page(
                table,
                user_id,
                params.page(),
                params.page_size(&self.config.pagination),
            )
            .await?;

        let store = &self.store;
        let topics = merge_page(reference, |keys: Vec<EntityId>| async move {
            store.fetch_by_keys(Topic::RESOURCE_TYPE, &keys).await
        })
        .await?;

        tracing::debug!(table, user_id, total = topics.total, found = topics.len(), "merged referenced topics");

        present_page(self.store.as_ref(), registry, columns, topics, &params.includes()).await
    }

    /// Topics filed under a node
    pub async fn by_node(
        &self,
        registry: &IncludeRegistry,
        node_id: EntityId,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        let query = params
            .to_list_query(&self.config.pagination)
            .with_filter("node_id", json!(node_id));
        self.list_with(registry, query, &params.includes(), columns).await
    }

    /// Topics started by a user
    pub async fn by_user(
        &self,
        registry: &IncludeRegistry,
        user_id: EntityId,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        let query = params
            .to_list_query(&self.config.pagination)
            .with_filter("user_id", json!(user_id));
        self.list_with(registry, query, &params.includes(), columns).await
    }

    /// All topics, filtered and sorted as the params ask
    pub async fn list(
        &self,
        registry: &IncludeRegistry,
        params: &QueryParams,
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        let query = params.to_list_query(&self.config.pagination);
        self.list_with(registry, query, &params.includes(), columns).await
    }

    /// A single composed topic
    pub async fn show(
        &self,
        registry: &IncludeRegistry,
        topic_id: EntityId,
        requested: &[IncludeRequest],
        columns: &[&str],
    ) -> ForumResult<Value> {
        let topic = self
            .store
            .fetch_one(Topic::RESOURCE_TYPE, topic_id)
            .await?
            .ok_or_else(|| EntityError::NotFound {
                resource_type: Topic::RESOURCE_TYPE.to_string(),
                id: topic_id,
            })?;

        present_one(self.store.as_ref(), registry, columns, topic, requested).await
    }

    async fn list_with(
        &self,
        registry: &IncludeRegistry,
        query: ListQuery,
        requested: &[IncludeRequest],
        columns: &[&str],
    ) -> ForumResult<Page<Value>> {
        let page = self
            .store
            .fetch_primary(Topic::RESOURCE_TYPE, &query)
            .await?;
        present_page(self.store.as_ref(), registry, columns, page, requested).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ForumError;
    use crate::core::service::EntityFetcher;
    use crate::entities::User;
    use crate::storage::InMemoryForumStore;
    use chrono::{Duration, Utc};

    fn seeded() -> (Arc<InMemoryForumStore>, TopicRepository<InMemoryForumStore>) {
        let store = Arc::new(InMemoryForumStore::new());
        store.insert(&User::new(1, "ana")).unwrap();
        store.insert(&User::new(2, "bo")).unwrap();
        store.insert(&Node::new(1, "Rust")).unwrap();
        for id in 1..=3 {
            let mut topic = Topic::new(id, 1, 1, format!("topic {}", id), "body");
            topic.last_reply_user_id = (id == 1).then_some(2);
            store.insert(&topic).unwrap();
        }
        for id in 1..=3 {
            store.insert(&Reply::new(10 + id, 1, 2, format!("reply {}", id))).unwrap();
        }

        let config = ForumConfig {
            pagination: crate::config::PaginationConfig {
                per_page: 2,
                max_per_page: 10,
            },
            ..ForumConfig::default()
        };
        let repository = TopicRepository::new(store.clone(), Arc::new(config));
        (store, repository)
    }

    fn full_registry(repository: &TopicRepository<InMemoryForumStore>) -> IncludeRegistry {
        let mut registry = repository.registry();
        repository.include_node(&mut registry, &["name"]).unwrap();
        repository.include_user(&mut registry, &["name"]).unwrap();
        repository.include_last_reply_user(&mut registry, &["name"]).unwrap();
        repository.include_replies(&mut registry, &["id", "body"]).unwrap();
        repository.include_replies_user(&mut registry, &["name"]).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_show_composes_requested_includes() {
        let (_, repository) = seeded();
        let registry = full_registry(&repository);

        let topic = repository
            .show(
                &registry,
                1,
                &IncludeRequest::parse_list("node,last_reply_user,replies,replies.user"),
                &["id", "title"],
            )
            .await
            .unwrap();

        assert_eq!(topic["title"], "topic 1");
        assert_eq!(topic["node"], json!({ "name": "Rust" }));
        assert_eq!(topic["last_reply_user"], json!({ "name": "bo" }));
        let replies = topic["replies"].as_array().unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], json!({ "id": 11, "body": "reply 1", "user": { "name": "bo" } }));
    }

    #[tokio::test]
    async fn test_show_missing_topic_is_not_found() {
        let (_, repository) = seeded();
        let registry = repository.registry();

        let err = repository.show(&registry, 99, &[], &[]).await.unwrap_err();
        assert!(matches!(err, ForumError::Entity(EntityError::NotFound { id: 99, .. })));
    }

    #[tokio::test]
    async fn test_null_last_reply_user() {
        let (_, repository) = seeded();
        let registry = full_registry(&repository);

        let topic = repository
            .show(&registry, 2, &["last_reply_user".into()], &["id"])
            .await
            .unwrap();
        assert_eq!(topic, json!({ "id": 2, "last_reply_user": null }));
    }

    #[tokio::test]
    async fn test_favorite_topics_follow_favorite_order() {
        let (store, repository) = seeded();
        let registry = full_registry(&repository);
        let now = Utc::now();
        store.add_reference(FAVORITES, 1, 2, now - Duration::minutes(5)).unwrap();
        store.add_reference(FAVORITES, 1, 3, now - Duration::minutes(1)).unwrap();
        store.add_reference(FAVORITES, 1, 1, now - Duration::minutes(9)).unwrap();

        let params = QueryParams {
            include: Some("node".to_string()),
            ..QueryParams::default()
        };
        let page = repository
            .favorite_topics(&registry, 1, &params, &["id"])
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.items, vec![
            json!({ "id": 3, "node": { "name": "Rust" } }),
            json!({ "id": 2, "node": { "name": "Rust" } }),
        ]);
    }

    #[tokio::test]
    async fn test_attention_topics_empty() {
        let (_, repository) = seeded();
        let registry = repository.registry();

        let page = repository
            .attention_topics(&registry, 1, &QueryParams::default(), &[])
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_by_user_filters() {
        let (store, repository) = seeded();
        store.insert(&Topic::new(4, 2, 1, "by bo", "body")).unwrap();
        let registry = repository.registry();

        let params = QueryParams {
            limit: Some(10),
            ..QueryParams::default()
        };
        let page = repository.by_user(&registry, 2, &params, &["id"]).await.unwrap();
        assert_eq!(page.items, vec![json!({ "id": 4 })]);
    }

    #[tokio::test]
    async fn test_votes_toggle() {
        let (store, repository) = seeded();

        assert!(repository.vote_up(2, 1).await.unwrap());
        assert!(repository.vote_down(2, 1).await.unwrap());
        assert!(!repository.vote_down(2, 1).await.unwrap());

        let topic = store.fetch_one("topics", 1).await.unwrap().unwrap();
        assert_eq!(topic.field("vote_count"), Some(&json!(0)));
    }
}
