//! # Agora
//!
//! Resource composition engine for forum backends.
//!
//! ## Features
//!
//! - **Include Registry**: repositories declare which relations a response may embed
//! - **Composition**: nested, column-filtered JSON built from a bulk-loaded graph
//! - **Paginated Merge**: join-table pages swapped for entities, metadata untouched
//! - **Vote Ledger**: up/down toggles serialized per voter and subject
//! - **Configuration-Based**: pagination, include depth and lock timeout from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agora::prelude::*;
//!
//! let store = Arc::new(InMemoryForumStore::new());
//! let topics = TopicRepository::new(store.clone(), Arc::new(ForumConfig::default()));
//!
//! // Request-scoped registry
//! let mut registry = topics.registry();
//! topics.include_node(&mut registry, &["name"])?;
//! topics.include_replies(&mut registry, &["id", "body"])?;
//! topics.include_replies_user(&mut registry, &["name"])?;
//!
//! // GET /users/1/favorites?include=node,replies,replies.user
//! let page = topics
//!     .favorite_topics(&registry, 1, &params, &["id", "title", "vote_count"])
//!     .await?;
//!
//! // Toggle an up vote
//! let upvoted = topics.vote_up(2, 1).await?;
//! ```

pub mod compose;
pub mod config;
pub mod core;
pub mod entities;
pub mod repository;
pub mod storage;
pub mod votes;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::{EntityId, HasKey, Related, Resource},
        error::{ForumError, ForumResult},
        include::{IncludableSpec, IncludeRegistry, IncludeRequest, ResolvedInclude},
        merge::merge_page,
        query::{ListQuery, Page, PaginatedResponse, PaginationMeta, QueryParams},
        service::{EntityFetcher, ForumStore, ReferenceSource, VoteStore},
        store::QueryableStore,
        vote::{SubjectRef, SubjectType, VoteDirection, VoteKey, VoteOutcome, VoteState},
    };

    // === Entities ===
    pub use crate::entities::{Entity, Node, Reply, Topic, User};
    pub use crate::impl_forum_entity;

    // === Composition ===
    pub use crate::compose::{Composer, RelationLoader};

    // === Votes ===
    pub use crate::votes::VoteLedger;

    // === Repositories ===
    pub use crate::repository::{ReplyRepository, TopicRepository, include_user};

    // === Storage ===
    pub use crate::storage::InMemoryForumStore;

    // === Config ===
    pub use crate::config::{ForumConfig, IncludeConfig, PaginationConfig, VoteConfig};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
