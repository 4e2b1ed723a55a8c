//! Resource graph nodes that composition runs over
//!
//! A [`Resource`] is an entity loaded as a JSON object plus whichever
//! relations the repository attached to it before composition. Composition
//! never fetches; whatever is attached here is all it will ever see.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::core::error::{EntityError, ForumResult};

/// Identifier type shared by every forum entity
pub type EntityId = i64;

/// Anything that can be matched back to a reference key
pub trait HasKey {
    type Key;

    /// The key this entity is referenced by, if it carries one
    fn key(&self) -> Option<Self::Key>;
}

/// A relation attached to a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// A to-one relation; `None` when the owner points at nothing
    One(Option<Box<Resource>>),

    /// A to-many relation in its natural order
    Many(Vec<Resource>),
}

/// A loaded entity and its attached relations
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Resource type the entity was loaded from (e.g. "topics")
    pub resource_type: String,

    /// Column values as loaded from storage
    pub fields: Map<String, Value>,

    /// Relations attached by the loader, keyed by relation name
    pub relations: IndexMap<String, Related>,
}

impl Resource {
    /// Create a resource without relations
    pub fn new(resource_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            resource_type: resource_type.into(),
            fields,
            relations: IndexMap::new(),
        }
    }

    /// Build a resource from a JSON value, which must be an object
    pub fn from_value(resource_type: impl Into<String>, value: Value) -> ForumResult<Self> {
        let resource_type = resource_type.into();
        match value {
            Value::Object(fields) => Ok(Self::new(resource_type, fields)),
            other => Err(EntityError::SerializationError {
                resource_type,
                message: format!("expected a JSON object, got {}", other),
            }
            .into()),
        }
    }

    /// The `id` column, when present and integral
    pub fn id(&self) -> Option<EntityId> {
        self.key_of("id")
    }

    /// Read an integral column, typically a foreign key
    pub fn key_of(&self, column: &str) -> Option<EntityId> {
        self.fields.get(column).and_then(Value::as_i64)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Get an attached relation
    pub fn relation(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    /// Attach (or replace) a relation
    pub fn attach(&mut self, name: impl Into<String>, related: Related) {
        self.relations.insert(name.into(), related);
    }

    /// Mutable access to every resource attached under `name`
    pub fn related_mut(&mut self, name: &str) -> Vec<&mut Resource> {
        match self.relations.get_mut(name) {
            Some(Related::One(Some(resource))) => vec![resource.as_mut()],
            Some(Related::Many(items)) => items.iter_mut().collect(),
            _ => Vec::new(),
        }
    }

    /// Project the fields onto `columns`, in column order
    ///
    /// Columns the resource does not carry are skipped.
    pub fn select(&self, columns: &[String]) -> Map<String, Value> {
        columns
            .iter()
            .filter_map(|column| {
                self.fields
                    .get(column)
                    .map(|value| (column.clone(), value.clone()))
            })
            .collect()
    }
}

impl HasKey for Resource {
    type Key = EntityId;

    fn key(&self) -> Option<EntityId> {
        self.id()
    }
}
