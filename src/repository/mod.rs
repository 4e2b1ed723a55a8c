//! Forum repositories
//!
//! Repositories declare which relations a request may include, load the
//! requested ones in bulk and hand the graph to the [`Composer`]. The include
//! registry is created per request and only borrowed here.

pub mod reply;
pub mod topic;

pub use reply::ReplyRepository;
pub use topic::TopicRepository;

use serde_json::Value;

use crate::compose::{Composer, RelationLoader};
use crate::core::entity::Resource;
use crate::core::error::ForumResult;
use crate::core::include::{IncludableSpec, IncludeRegistry, IncludeRequest};
use crate::core::query::Page;
use crate::core::service::EntityFetcher;
use crate::entities::{Entity, User};

/// Register an include that resolves to a user through `{relation}_id`
///
/// A dotted `name` nests the include under everything before the last dot,
/// so `replies.user` reads `user_id` from each reply.
pub fn include_user(
    registry: &mut IncludeRegistry,
    name: &str,
    default_columns: &[&str],
) -> ForumResult<()> {
    let mut spec = IncludableSpec::make(name)
        .default_columns(default_columns)
        .allow_columns(User::INCLUDABLE)
        .target(User::RESOURCE_TYPE);

    let foreign_key = format!("{}_id", spec.relation_name());
    spec = spec.foreign_key(foreign_key);
    if let Some((parent, _)) = name.rsplit_once('.') {
        spec = spec.nested(parent);
    }

    registry.add(spec)?;
    Ok(())
}

/// Load the requested relations into a page and compose it
pub(crate) async fn present_page<F: EntityFetcher + ?Sized>(
    fetcher: &F,
    registry: &IncludeRegistry,
    root_columns: &[&str],
    mut page: Page<Resource>,
    requested: &[IncludeRequest],
) -> ForumResult<Page<Value>> {
    let resolved = registry.resolve(requested);
    RelationLoader::new(fetcher)
        .load(&resolved, &mut page.items)
        .await?;

    Ok(Composer::new(registry)
        .root_columns(root_columns)
        .compose_page(&page, requested))
}

/// Load the requested relations into one resource and compose it
pub(crate) async fn present_one<F: EntityFetcher + ?Sized>(
    fetcher: &F,
    registry: &IncludeRegistry,
    root_columns: &[&str],
    mut resource: Resource,
    requested: &[IncludeRequest],
) -> ForumResult<Value> {
    let resolved = registry.resolve(requested);
    RelationLoader::new(fetcher)
        .load_one(&resolved, &mut resource)
        .await?;

    Ok(Composer::new(registry)
        .root_columns(root_columns)
        .compose(&resource, requested))
}
