//! Core module containing the fundamental types and traits of the engine

pub mod entity;
pub mod error;
pub mod include;
pub mod merge;
pub mod query;
pub mod service;
pub mod store;
pub mod vote;

pub use entity::{EntityId, HasKey, Related, Resource};
pub use error::{ForumError, ForumResult};
pub use include::{IncludableSpec, IncludeRegistry, IncludeRequest, ResolvedInclude};
pub use merge::merge_page;
pub use query::{ListQuery, Page, PaginatedResponse, PaginationMeta, QueryParams};
pub use service::{EntityFetcher, ForumStore, ReferenceSource, VoteStore};
pub use store::QueryableStore;
pub use vote::{SubjectRef, SubjectType, Vote, VoteDirection, VoteKey, VoteOutcome, VoteState};
