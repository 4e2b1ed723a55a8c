//! Shared test harness for forum integration tests
//!
//! Provides the standard fixture (users, nodes, topics, replies and join
//! table rows), a [`CountingFetcher`] that records collaborator calls, and
//! the `forum_store_tests!` contract suite.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod forum_harness;
//! use forum_harness::*;
//! ```
//!
//! # Fixture
//!
//! | table    | rows |
//! |----------|------|
//! | users    | 1 ana (avatar), 2 bo, 3 cy |
//! | nodes    | 1 Rust, 2 Async (child of 1) |
//! | topics   | 1 by ana in Rust (last reply by cy, 5 votes), 2 by bo in Async, 3 by ana in Rust |
//! | replies  | 10, 11, 12 on topic 1 (by bo, cy, bo), 13 on topic 2 (by ana) |
//! | favorites | ana: topic 1 (3h ago), topic 2 (2h ago), topic 3 (1h ago) |
//! | attentions | bo: topic 1 |

#![allow(dead_code)]

#[macro_use]
mod store_contract;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use agora::config::{ForumConfig, PaginationConfig};
use agora::core::entity::{EntityId, Resource};
use agora::core::query::{ListQuery, Page};
use agora::core::service::EntityFetcher;
use agora::entities::{Node, Reply, Topic, User};
use agora::repository::TopicRepository;
use agora::storage::{ATTENTIONS, FAVORITES, InMemoryForumStore};
use agora::core::IncludeRegistry;

/// Populate any in-memory store with the standard fixture
pub fn seed(store: &InMemoryForumStore) -> Result<()> {
    store.insert(&User::new(1, "ana").with_avatar("ana.png"))?;
    store.insert(&User::new(2, "bo"))?;
    store.insert(&User::new(3, "cy"))?;

    store.insert(&Node::new(1, "Rust"))?;
    store.insert(&Node::new(2, "Async").with_parent(1))?;

    let mut first = Topic::new(1, 1, 1, "Ownership", "Moves and borrows");
    first.last_reply_user_id = Some(3);
    first.vote_count = 5;
    store.insert(&first)?;
    store.insert(&Topic::new(2, 2, 2, "Pinning", "Self-referential futures"))?;
    store.insert(&Topic::new(3, 1, 1, "Lifetimes", "Elision rules"))?;

    store.insert(&Reply::new(10, 1, 2, "first!"))?;
    store.insert(&Reply::new(11, 1, 3, "nice"))?;
    store.insert(&Reply::new(12, 1, 2, "agreed"))?;
    store.insert(&Reply::new(13, 2, 1, "Pin<Box<T>>"))?;

    let now = Utc::now();
    store.add_reference(FAVORITES, 1, 1, now - Duration::hours(3))?;
    store.add_reference(FAVORITES, 1, 2, now - Duration::hours(2))?;
    store.add_reference(FAVORITES, 1, 3, now - Duration::hours(1))?;
    store.add_reference(ATTENTIONS, 2, 1, now)?;

    Ok(())
}

/// A fresh store holding the standard fixture
pub fn seeded_store() -> Arc<InMemoryForumStore> {
    let store = InMemoryForumStore::new();
    seed(&store).expect("fixture should seed");
    Arc::new(store)
}

/// Configuration with small pages so limits are easy to hit
pub fn small_page_config() -> Arc<ForumConfig> {
    Arc::new(ForumConfig {
        pagination: PaginationConfig {
            per_page: 2,
            max_per_page: 10,
        },
        ..ForumConfig::default()
    })
}

/// A registry with every topic include declared
pub fn topic_registry(repository: &TopicRepository<InMemoryForumStore>) -> IncludeRegistry {
    let mut registry = repository.registry();
    repository.include_node(&mut registry, &["name"]).unwrap();
    repository.include_user(&mut registry, &["name", "avatar"]).unwrap();
    repository.include_last_reply_user(&mut registry, &["name"]).unwrap();
    repository.include_replies(&mut registry, &["id", "body"]).unwrap();
    repository.include_replies_user(&mut registry, &["name"]).unwrap();
    registry
}

/// Ids of a slice of resources, in order
pub fn ids(resources: &[Resource]) -> Vec<EntityId> {
    resources.iter().filter_map(Resource::id).collect()
}

// ---------------------------------------------------------------------------
// CountingFetcher: wraps a fetcher and counts bulk calls
// ---------------------------------------------------------------------------

/// Delegates to an inner fetcher while counting bulk fetches
pub struct CountingFetcher<F> {
    inner: F,
    by_keys: AtomicUsize,
    by_owners: AtomicUsize,
}

impl<F> CountingFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            by_keys: AtomicUsize::new(0),
            by_owners: AtomicUsize::new(0),
        }
    }

    pub fn key_fetches(&self) -> usize {
        self.by_keys.load(Ordering::SeqCst)
    }

    pub fn owner_fetches(&self) -> usize {
        self.by_owners.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F: EntityFetcher> EntityFetcher for CountingFetcher<F> {
    async fn fetch_primary(&self, resource_type: &str, query: &ListQuery) -> Result<Page<Resource>> {
        self.inner.fetch_primary(resource_type, query).await
    }

    async fn fetch_one(&self, resource_type: &str, id: EntityId) -> Result<Option<Resource>> {
        self.inner.fetch_one(resource_type, id).await
    }

    async fn fetch_by_keys(&self, resource_type: &str, keys: &[EntityId]) -> Result<Vec<Resource>> {
        self.by_keys.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_by_keys(resource_type, keys).await
    }

    async fn fetch_by_owners(
        &self,
        resource_type: &str,
        owner_key: &str,
        owners: &[EntityId],
        limit: Option<usize>,
    ) -> Result<Vec<Resource>> {
        self.by_owners.fetch_add(1, Ordering::SeqCst);
        self.inner
            .fetch_by_owners(resource_type, owner_key, owners, limit)
            .await
    }
}
