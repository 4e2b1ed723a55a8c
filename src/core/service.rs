//! Collaborator traits implemented by the persistence layer
//!
//! The engine never talks to a database directly. Repositories hand it
//! implementations of these traits; [`crate::storage::InMemoryForumStore`]
//! implements all of them for tests and development.

use crate::core::entity::{EntityId, Resource};
use crate::core::query::{ListQuery, Page};
use crate::core::vote::{SubjectRef, VoteDirection, VoteKey};
use anyhow::Result;
use async_trait::async_trait;

/// Loads entities as [`Resource`]s
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    /// Load one page of base entities, without relations
    async fn fetch_primary(&self, resource_type: &str, query: &ListQuery)
    -> Result<Page<Resource>>;

    /// Load a single entity by id
    async fn fetch_one(&self, resource_type: &str, id: EntityId) -> Result<Option<Resource>>;

    /// Bulk-load entities by primary key
    ///
    /// Order of the result is not guaranteed; missing keys are simply absent.
    async fn fetch_by_keys(&self, resource_type: &str, keys: &[EntityId])
    -> Result<Vec<Resource>>;

    /// Bulk-load collection rows whose `owner_key` column is one of `owners`
    ///
    /// Rows come back in their natural order, at most `limit` per owner.
    async fn fetch_by_owners(
        &self,
        resource_type: &str,
        owner_key: &str,
        owners: &[EntityId],
        limit: Option<usize>,
    ) -> Result<Vec<Resource>>;
}

/// Source of reference-key pages (join tables such as `favorites`)
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Page of topic ids recorded in `table` for `user_id`, newest first
    async fn reference_page(
        &self,
        table: &str,
        user_id: EntityId,
        page: usize,
        page_size: usize,
    ) -> Result<Page<EntityId>>;
}

/// Vote rows and the denormalized `vote_count` they feed
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Direction of the live vote for `key`, if any
    async fn current_vote(&self, key: &VoteKey) -> Result<Option<VoteDirection>>;

    /// Replace the vote row for `key` and adjust the subject's counter
    ///
    /// `expected` is the live vote the transition was computed from. If the
    /// stored row no longer matches it, nothing is written and the call fails
    /// with [`VoteError::Conflict`](crate::core::error::VoteError::Conflict).
    /// Otherwise removes any existing row, inserts a row for `next` when it is
    /// `Some`, and adds `delta` to the subject's `vote_count`, all as one unit.
    /// Returns the new `vote_count`.
    async fn commit(
        &self,
        key: &VoteKey,
        expected: Option<VoteDirection>,
        next: Option<VoteDirection>,
        delta: i64,
    ) -> Result<i64>;

    /// Current `vote_count` of a subject
    async fn vote_count(&self, subject: &SubjectRef) -> Result<i64>;
}

/// Everything the repositories need from persistence
pub trait ForumStore: EntityFetcher + ReferenceSource + VoteStore {}

impl<T: EntityFetcher + ReferenceSource + VoteStore + ?Sized> ForumStore for T {}
