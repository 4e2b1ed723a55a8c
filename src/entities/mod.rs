//! Typed forum entities
//!
//! Storage keeps entities as [`Resource`]s so that composition can project
//! any column; these structs are the typed way to create them.

pub mod macros;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{EntityId, Resource};
use crate::core::error::ForumResult;
use crate::impl_forum_entity;

/// A typed entity that can be stored as a [`Resource`]
pub trait Entity: Serialize + Send + Sync {
    /// Resource type the entity is stored under (e.g. "topics")
    const RESOURCE_TYPE: &'static str;

    /// Columns a client may request when this entity is included
    const INCLUDABLE: &'static [&'static str];

    fn id(&self) -> EntityId;

    /// Convert into a relation-less resource
    fn to_resource(&self) -> ForumResult<Resource> {
        Resource::from_value(Self::RESOURCE_TYPE, serde_json::to_value(self)?)
    }
}

/// A forum member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub avatar: Option<String>,
    pub signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: None,
            signature: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

impl_forum_entity!(User, "users", ["id", "name", "avatar", "signature", "created_at"]);

/// A forum section topics are filed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: EntityId,
    pub name: String,
    pub parent_node: Option<EntityId>,
    pub description: Option<String>,
}

impl Node {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_node: None,
            description: None,
        }
    }

    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent_node = Some(parent);
        self
    }
}

impl_forum_entity!(Node, "nodes", ["id", "name", "parent_node", "description"]);

/// A discussion topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: EntityId,
    pub title: String,
    pub body: String,
    pub user_id: EntityId,
    pub node_id: EntityId,
    pub last_reply_user_id: Option<EntityId>,
    pub reply_count: i64,
    pub view_count: i64,
    pub vote_count: i64,
    pub favorite_count: i64,
    pub is_excellent: bool,
    pub is_wiki: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(
        id: EntityId,
        user_id: EntityId,
        node_id: EntityId,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
            user_id,
            node_id,
            last_reply_user_id: None,
            reply_count: 0,
            view_count: 0,
            vote_count: 0,
            favorite_count: 0,
            is_excellent: false,
            is_wiki: false,
            is_blocked: false,
            created_at: Utc::now(),
        }
    }
}

impl_forum_entity!(
    Topic,
    "topics",
    [
        "id",
        "title",
        "body",
        "user_id",
        "node_id",
        "last_reply_user_id",
        "reply_count",
        "view_count",
        "vote_count",
        "favorite_count",
        "is_excellent",
        "is_wiki",
        "created_at",
    ]
);

/// A reply to a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: EntityId,
    pub topic_id: EntityId,
    pub user_id: EntityId,
    pub body: String,
    pub vote_count: i64,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(id: EntityId, topic_id: EntityId, user_id: EntityId, body: impl Into<String>) -> Self {
        Self {
            id,
            topic_id,
            user_id,
            body: body.into(),
            vote_count: 0,
            is_blocked: false,
            created_at: Utc::now(),
        }
    }
}

impl_forum_entity!(
    Reply,
    "replies",
    ["id", "topic_id", "user_id", "body", "vote_count", "created_at"]
);
