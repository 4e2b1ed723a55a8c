//! In-memory forum store for testing and development

use crate::core::entity::{EntityId, Resource};
use crate::core::error::{EntityError, ForumResult, StorageError, VoteError};
use crate::core::query::{ListQuery, Page};
use crate::core::service::{EntityFetcher, ReferenceSource, VoteStore};
use crate::core::store::QueryableStore;
use crate::core::vote::{SubjectRef, Vote, VoteDirection, VoteKey};
use crate::entities::Entity;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Join table listing the topics a user favorited
pub const FAVORITES: &str = "favorites";

/// Join table listing the topics a user follows
pub const ATTENTIONS: &str = "attentions";

#[derive(Debug, Clone)]
struct ReferenceRow {
    user_id: EntityId,
    topic_id: EntityId,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    resources: HashMap<String, IndexMap<EntityId, Resource>>,
    votes: HashMap<VoteKey, Vote>,
    references: HashMap<String, Vec<ReferenceRow>>,
}

/// Forum store kept entirely in memory
///
/// Rows keep their insertion order, which is the "natural order" reported to
/// the relation loader. Uses RwLock for thread-safe access; clones share the
/// same tables.
#[derive(Clone, Default)]
pub struct InMemoryForumStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryForumStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a typed entity
    pub fn insert<E: Entity>(&self, entity: &E) -> ForumResult<()> {
        self.insert_resource(entity.to_resource()?)
    }

    /// Insert or replace a resource; it must carry an integral `id`
    pub fn insert_resource(&self, resource: Resource) -> ForumResult<()> {
        let Some(id) = resource.id() else {
            return Err(EntityError::SerializationError {
                resource_type: resource.resource_type,
                message: "missing integral id".to_string(),
            }
            .into());
        };

        let mut tables = self.write()?;
        tables
            .resources
            .entry(resource.resource_type.clone())
            .or_default()
            .insert(id, resource);
        Ok(())
    }

    /// Delete a row; true if it existed
    pub fn delete(&self, resource_type: &str, id: EntityId) -> ForumResult<bool> {
        let mut tables = self.write()?;
        Ok(tables
            .resources
            .get_mut(resource_type)
            .and_then(|rows| rows.shift_remove(&id))
            .is_some())
    }

    /// Number of rows of a resource type
    pub fn count(&self, resource_type: &str) -> ForumResult<usize> {
        let tables = self.read()?;
        Ok(tables.resources.get(resource_type).map_or(0, IndexMap::len))
    }

    pub fn add_favorite(&self, user_id: EntityId, topic_id: EntityId) -> ForumResult<()> {
        self.add_reference(FAVORITES, user_id, topic_id, Utc::now())
    }

    pub fn add_attention(&self, user_id: EntityId, topic_id: EntityId) -> ForumResult<()> {
        self.add_reference(ATTENTIONS, user_id, topic_id, Utc::now())
    }

    /// Record a reference row with an explicit creation time
    pub fn add_reference(
        &self,
        table: &str,
        user_id: EntityId,
        topic_id: EntityId,
        created_at: DateTime<Utc>,
    ) -> ForumResult<()> {
        let mut tables = self.write()?;
        tables
            .references
            .entry(table.to_string())
            .or_default()
            .push(ReferenceRow {
                user_id,
                topic_id,
                created_at,
            });
        Ok(())
    }

    /// The stored vote row for a pair, if any
    pub fn vote_row(&self, key: &VoteKey) -> ForumResult<Option<Vote>> {
        let tables = self.read()?;
        Ok(tables.votes.get(key).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables.read().map_err(|e| StorageError::LockPoisoned {
            kind: "read".to_string(),
            message: e.to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables.write().map_err(|e| StorageError::LockPoisoned {
            kind: "write".to_string(),
            message: e.to_string(),
        })
    }

    fn rows(&self, resource_type: &str) -> Result<Vec<Resource>, StorageError> {
        let tables = self.read()?;
        Ok(tables
            .resources
            .get(resource_type)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl EntityFetcher for InMemoryForumStore {
    async fn fetch_primary(&self, resource_type: &str, query: &ListQuery) -> Result<Page<Resource>> {
        let mut rows = self.rows(resource_type)?;

        if let Some(filter) = &query.filter {
            rows = self.apply_filters(rows, filter);
        }
        if let Some(sort) = &query.sort {
            rows = self.apply_sort(rows, sort);
        }

        Ok(Page::paginate(rows, query.page, query.page_size))
    }

    async fn fetch_one(&self, resource_type: &str, id: EntityId) -> Result<Option<Resource>> {
        let tables = self.read()?;
        Ok(tables
            .resources
            .get(resource_type)
            .and_then(|rows| rows.get(&id))
            .cloned())
    }

    async fn fetch_by_keys(&self, resource_type: &str, keys: &[EntityId]) -> Result<Vec<Resource>> {
        let wanted: HashSet<EntityId> = keys.iter().copied().collect();
        let tables = self.read()?;
        Ok(tables
            .resources
            .get(resource_type)
            .map(|rows| {
                rows.iter()
                    .filter(|(id, _)| wanted.contains(id))
                    .map(|(_, resource)| resource.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_by_owners(
        &self,
        resource_type: &str,
        owner_key: &str,
        owners: &[EntityId],
        limit: Option<usize>,
    ) -> Result<Vec<Resource>> {
        let wanted: HashSet<EntityId> = owners.iter().copied().collect();
        let limit = limit.unwrap_or(usize::MAX);
        let mut taken: HashMap<EntityId, usize> = HashMap::new();

        let tables = self.read()?;
        let Some(rows) = tables.resources.get(resource_type) else {
            return Ok(Vec::new());
        };

        Ok(rows
            .values()
            .filter(|row| {
                let Some(owner) = row.key_of(owner_key).filter(|owner| wanted.contains(owner))
                else {
                    return false;
                };
                let count = taken.entry(owner).or_default();
                *count += 1;
                *count <= limit
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReferenceSource for InMemoryForumStore {
    async fn reference_page(
        &self,
        table: &str,
        user_id: EntityId,
        page: usize,
        page_size: usize,
    ) -> Result<Page<EntityId>> {
        let tables = self.read()?;
        let mut rows: Vec<&ReferenceRow> = tables
            .references
            .get(table)
            .map(|rows| rows.iter().rev().filter(|row| row.user_id == user_id).collect())
            .unwrap_or_default();

        // newest first; rows created in the same instant keep latest-insert-first
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let keys = rows.into_iter().map(|row| row.topic_id).collect();
        Ok(Page::paginate(keys, page, page_size))
    }
}

#[async_trait]
impl VoteStore for InMemoryForumStore {
    async fn current_vote(&self, key: &VoteKey) -> Result<Option<VoteDirection>> {
        let tables = self.read()?;
        Ok(tables.votes.get(key).map(|vote| vote.direction))
    }

    async fn commit(
        &self,
        key: &VoteKey,
        expected: Option<VoteDirection>,
        next: Option<VoteDirection>,
        delta: i64,
    ) -> Result<i64> {
        let mut guard = self.write()?;
        let tables = &mut *guard;

        let subject = key.subject;
        if tables.votes.get(key).map(|vote| vote.direction) != expected {
            return Err(VoteError::Conflict {
                voter_id: key.voter_id,
                subject_type: subject.subject_type,
                subject_id: subject.subject_id,
            }
            .into());
        }

        let Some(resource) = tables
            .resources
            .get_mut(subject.subject_type.resource_type())
            .and_then(|rows| rows.get_mut(&subject.subject_id))
        else {
            return Err(EntityError::NotFound {
                resource_type: subject.subject_type.resource_type().to_string(),
                id: subject.subject_id,
            }
            .into());
        };

        let vote_count = resource.key_of("vote_count").unwrap_or(0) + delta;
        resource.set_field("vote_count", Value::from(vote_count));

        tables.votes.remove(key);
        if let Some(direction) = next {
            tables.votes.insert(*key, Vote::new(*key, direction));
        }

        Ok(vote_count)
    }

    async fn vote_count(&self, subject: &SubjectRef) -> Result<i64> {
        let tables = self.read()?;
        tables
            .resources
            .get(subject.subject_type.resource_type())
            .and_then(|rows| rows.get(&subject.subject_id))
            .map(|resource| resource.key_of("vote_count").unwrap_or(0))
            .ok_or_else(|| {
                EntityError::NotFound {
                    resource_type: subject.subject_type.resource_type().to_string(),
                    id: subject.subject_id,
                }
                .into()
            })
    }
}

impl QueryableStore<Resource> for InMemoryForumStore {
    fn apply_filters(&self, data: Vec<Resource>, filter: &Value) -> Vec<Resource> {
        let Some(conditions) = filter.as_object() else {
            return data;
        };

        data.into_iter()
            .filter(|resource| {
                conditions
                    .iter()
                    .all(|(field, expected)| resource.field(field) == Some(expected))
            })
            .collect()
    }

    fn apply_sort(&self, mut data: Vec<Resource>, sort: &str) -> Vec<Resource> {
        let (field, descending) = match sort.split_once(':') {
            Some((field, direction)) => (field, direction.eq_ignore_ascii_case("desc")),
            None => (sort, false),
        };

        data.sort_by(|a, b| {
            let ordering = compare_values(a.field(field), b.field(field));
            if descending { ordering.reverse() } else { ordering }
        });
        data
    }
}

// Missing and null sort first; mismatched types compare equal
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
