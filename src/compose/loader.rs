//! Bulk relation loading ahead of composition
//!
//! For every resolved include the loader issues a single fetch covering all
//! owners at that level, then descends into the freshly attached children
//! for nested includes. The number of fetches depends on the include tree,
//! never on the number of rows.

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;

use crate::core::entity::{EntityId, Related, Resource};
use crate::core::include::{IncludableSpec, ResolvedInclude};
use crate::core::service::EntityFetcher;

/// Attaches requested relations to already loaded resources
pub struct RelationLoader<'f, F: EntityFetcher + ?Sized> {
    fetcher: &'f F,
}

impl<'f, F: EntityFetcher + ?Sized> RelationLoader<'f, F> {
    pub fn new(fetcher: &'f F) -> Self {
        Self { fetcher }
    }

    /// Load every resolved include for `resources`
    pub async fn load(
        &self,
        resolved: &[ResolvedInclude<'_>],
        resources: &mut [Resource],
    ) -> Result<()> {
        if resolved.is_empty() || resources.is_empty() {
            return Ok(());
        }

        let owners: Vec<&mut Resource> = resources.iter_mut().collect();
        self.load_level(resolved, None, owners).await
    }

    /// Load every resolved include for a single resource
    pub async fn load_one(
        &self,
        resolved: &[ResolvedInclude<'_>],
        resource: &mut Resource,
    ) -> Result<()> {
        self.load(resolved, std::slice::from_mut(resource)).await
    }

    // Boxed because the nesting depth is only known at runtime
    fn load_level<'a>(
        &'a self,
        resolved: &'a [ResolvedInclude<'a>],
        parent: Option<&'a str>,
        mut owners: Vec<&'a mut Resource>,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            for include in resolved
                .iter()
                .filter(|include| include.spec.parent.as_deref() == parent)
            {
                let spec = include.spec;
                if spec.is_collection() {
                    self.attach_many(spec, &mut owners).await?;
                } else {
                    self.attach_one(spec, &mut owners).await?;
                }

                let relation = spec.relation_name();
                let children: Vec<&mut Resource> = owners
                    .iter_mut()
                    .flat_map(|owner| owner.related_mut(relation))
                    .collect();

                if !children.is_empty() {
                    self.load_level(resolved, Some(spec.name.as_str()), children)
                        .await?;
                }
            }

            Ok(())
        }
        .boxed()
    }

    async fn attach_one(&self, spec: &IncludableSpec, owners: &mut [&mut Resource]) -> Result<()> {
        let Some(foreign_key) = spec.foreign_key.as_deref() else {
            return Ok(());
        };

        let mut keys: Vec<EntityId> = owners
            .iter()
            .filter_map(|owner| owner.key_of(foreign_key))
            .collect();
        keys.sort_unstable();
        keys.dedup();

        let by_id: HashMap<EntityId, Resource> = if keys.is_empty() {
            HashMap::new()
        } else {
            self.fetcher
                .fetch_by_keys(spec.target_type(), &keys)
                .await?
                .into_iter()
                .filter_map(|target| target.id().map(|id| (id, target)))
                .collect()
        };

        tracing::debug!(
            include = %spec.name,
            target = spec.target_type(),
            keys = keys.len(),
            found = by_id.len(),
            "loaded to-one relation"
        );

        let relation = spec.relation_name();
        for owner in owners.iter_mut() {
            let target = owner
                .key_of(foreign_key)
                .and_then(|key| by_id.get(&key))
                .cloned()
                .map(Box::new);
            owner.attach(relation, Related::One(target));
        }

        Ok(())
    }

    async fn attach_many(&self, spec: &IncludableSpec, owners: &mut [&mut Resource]) -> Result<()> {
        let Some(owner_key) = spec.owner_key.as_deref() else {
            tracing::debug!(include = %spec.name, "collection include has no owner key, skipping");
            return Ok(());
        };

        let mut ids: Vec<EntityId> = owners.iter().filter_map(|owner| owner.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(());
        }

        let rows = self
            .fetcher
            .fetch_by_owners(spec.target_type(), owner_key, &ids, spec.limit)
            .await?;

        tracing::debug!(
            include = %spec.name,
            target = spec.target_type(),
            owners = ids.len(),
            rows = rows.len(),
            "loaded collection relation"
        );

        let mut grouped: HashMap<EntityId, Vec<Resource>> = HashMap::new();
        for row in rows {
            if let Some(owner) = row.key_of(owner_key) {
                grouped.entry(owner).or_default().push(row);
            }
        }

        let relation = spec.relation_name();
        for owner in owners.iter_mut() {
            let items = owner
                .id()
                .and_then(|id| grouped.get(&id))
                .cloned()
                .unwrap_or_default();
            owner.attach(relation, Related::Many(items));
        }

        Ok(())
    }
}
