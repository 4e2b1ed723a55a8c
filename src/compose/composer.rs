//! Pure projection of a loaded resource graph into a response tree

use serde_json::Value;

use crate::core::entity::{Related, Resource};
use crate::core::include::{IncludeRegistry, IncludeRequest, ResolvedInclude};
use crate::core::query::Page;

/// Turns loaded resources into nested JSON according to the client's includes
///
/// The composer only reads what is already attached to each [`Resource`]. It
/// never fetches and never mutates; a relation that was not loaded is simply
/// left out of the output.
///
/// # Example
/// ```rust,ignore
/// let composer = Composer::new(&registry).root_columns(&["id", "title"]);
/// let json = composer.compose(&topic, &IncludeRequest::parse_list("node,replies"));
/// ```
pub struct Composer<'r> {
    registry: &'r IncludeRegistry,
    root_columns: Option<Vec<String>>,
}

impl<'r> Composer<'r> {
    pub fn new(registry: &'r IncludeRegistry) -> Self {
        Self {
            registry,
            root_columns: None,
        }
    }

    /// Limit the top-level fields to `columns`; an empty list keeps them all
    pub fn root_columns(mut self, columns: &[&str]) -> Self {
        self.root_columns = if columns.is_empty() {
            None
        } else {
            Some(columns.iter().map(|c| c.to_string()).collect())
        };
        self
    }

    /// Compose a single resource
    pub fn compose(&self, resource: &Resource, requested: &[IncludeRequest]) -> Value {
        let resolved = self.registry.resolve(requested);
        self.project(resource, self.root_columns.as_deref(), None, &resolved)
    }

    /// Compose an ordered sequence of resources
    pub fn compose_many(&self, resources: &[Resource], requested: &[IncludeRequest]) -> Vec<Value> {
        let resolved = self.registry.resolve(requested);
        resources
            .iter()
            .map(|resource| self.project(resource, self.root_columns.as_deref(), None, &resolved))
            .collect()
    }

    /// Compose every item of a page; the page metadata is kept as-is
    pub fn compose_page(&self, page: &Page<Resource>, requested: &[IncludeRequest]) -> Page<Value> {
        page.with_items(self.compose_many(&page.items, requested))
    }

    fn project(
        &self,
        resource: &Resource,
        columns: Option<&[String]>,
        parent: Option<&str>,
        resolved: &[ResolvedInclude<'_>],
    ) -> Value {
        let mut output = match columns {
            Some(columns) => resource.select(columns),
            None => resource.fields.clone(),
        };

        for include in resolved
            .iter()
            .filter(|include| include.spec.parent.as_deref() == parent)
        {
            let name = include.spec.relation_name();
            let Some(related) = resource.relation(name) else {
                continue;
            };

            let value = self.embed(related, include, resolved);
            output.insert(name.to_string(), value);
        }

        Value::Object(output)
    }

    fn embed(
        &self,
        related: &Related,
        include: &ResolvedInclude<'_>,
        resolved: &[ResolvedInclude<'_>],
    ) -> Value {
        let columns = Some(include.columns.as_slice());
        let path = Some(include.spec.name.as_str());

        match related {
            Related::One(None) => Value::Null,
            Related::One(Some(target)) => self.project(target, columns, path, resolved),
            Related::Many(items) => Value::Array(
                items
                    .iter()
                    .take(include.spec.limit.unwrap_or(usize::MAX))
                    .map(|item| self.project(item, columns, path, resolved))
                    .collect(),
            ),
        }
    }
}
