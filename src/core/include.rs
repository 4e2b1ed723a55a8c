//! Include registry: which relations a response may embed
//!
//! Repositories declare what *could* be included for the current request by
//! adding [`IncludableSpec`]s to a request-scoped [`IncludeRegistry`]. At
//! serialization time the registry is queried against what the client
//! actually asked for.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::error::IncludeError;

/// Default maximum nesting depth for include paths (`a.b.c` is depth 3)
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Describes one include-able relation
///
/// # Example
/// ```rust,ignore
/// let spec = IncludableSpec::make("replies.user")
///     .default_columns(&["name"])
///     .allow_columns(User::INCLUDABLE)
///     .foreign_key("user_id")
///     .target("users")
///     .nested("replies");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludableSpec {
    /// Dotted include path, unique within a registry (e.g. "replies.user")
    pub name: String,

    /// Columns returned when the client did not narrow the columns
    pub default_columns: Vec<String>,

    /// Columns the client may ask for
    pub allow_columns: Vec<String>,

    /// Column on the owning entity that points at the related entity
    ///
    /// Absent for collections resolved by owner id.
    pub foreign_key: Option<String>,

    /// Maximum number of rows embedded for a collection
    pub limit: Option<usize>,

    /// Include this one nests under
    pub parent: Option<String>,

    /// Resource type to load the relation from; defaults to the relation name
    #[serde(default)]
    pub target: Option<String>,

    /// Column on collection rows that points back at their owner
    #[serde(default)]
    pub owner_key: Option<String>,
}

impl IncludableSpec {
    /// Start a spec for the given include path
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_columns: Vec::new(),
            allow_columns: Vec::new(),
            foreign_key: None,
            limit: None,
            parent: None,
            target: None,
            owner_key: None,
        }
    }

    pub fn default_columns(mut self, columns: &[&str]) -> Self {
        self.default_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn allow_columns(mut self, columns: &[&str]) -> Self {
        self.allow_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Nest this include under another one
    pub fn nested(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn target(mut self, resource_type: impl Into<String>) -> Self {
        self.target = Some(resource_type.into());
        self
    }

    pub fn owner_key(mut self, column: impl Into<String>) -> Self {
        self.owner_key = Some(column.into());
        self
    }

    /// Key the relation is embedded under: the last path segment
    pub fn relation_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Resource type the relation is loaded from
    pub fn target_type(&self) -> &str {
        self.target.as_deref().unwrap_or_else(|| self.relation_name())
    }

    /// Collections are resolved by owner id rather than a foreign key
    pub fn is_collection(&self) -> bool {
        self.foreign_key.is_none()
    }
}

/// One entry of the client's `include` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRequest {
    /// Dotted include path
    pub path: String,

    /// Columns the client narrowed the include to (may be empty)
    pub columns: Vec<String>,
}

impl IncludeRequest {
    /// Request an include with its default columns
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            columns: Vec::new(),
        }
    }

    /// Request an include narrowed to specific columns
    pub fn with_columns(path: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            path: path.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Parse one entry: `path` or `path:columns(a|b|c)`
    ///
    /// Unrecognised parameters are ignored. Returns `None` for a blank entry.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut parts = raw.split(':');
        let path = parts.next()?.trim();
        if path.is_empty() {
            return None;
        }

        let columns = parts
            .filter_map(|param| {
                param
                    .trim()
                    .strip_prefix("columns(")
                    .and_then(|rest| rest.strip_suffix(')'))
            })
            .flat_map(|list| list.split('|'))
            .map(str::trim)
            .filter(|column| !column.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self {
            path: path.to_string(),
            columns,
        })
    }

    /// Parse a comma-separated `include` parameter
    ///
    /// Commas inside `columns(...)` are not separators.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut entries = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;

        for (index, ch) in raw.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    entries.extend(Self::parse(&raw[start..index]));
                    start = index + 1;
                }
                _ => {}
            }
        }
        entries.extend(Self::parse(&raw[start..]));
        entries
    }
}

impl From<&str> for IncludeRequest {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// A spec the client asked for, with its effective columns
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInclude<'a> {
    pub spec: &'a IncludableSpec,
    pub columns: Vec<String>,
}

/// Request-scoped collection of include-able relations
///
/// Created fresh per request and dropped with it. The registry is
/// deliberately not `Clone`: it belongs to exactly one request.
#[derive(Debug)]
pub struct IncludeRegistry {
    specs: IndexMap<String, IncludableSpec>,
    max_depth: usize,
}

impl Default for IncludeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IncludeRegistry {
    /// Create an empty registry with the default depth limit
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create an empty registry that drops include paths deeper than `max_depth`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            specs: IndexMap::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Register an include-able relation
    pub fn add(&mut self, spec: IncludableSpec) -> Result<(), IncludeError> {
        if self.specs.contains_key(&spec.name) {
            return Err(IncludeError::Duplicate { name: spec.name });
        }

        if let Some(parent) = &spec.parent
            && !self.specs.contains_key(parent)
        {
            return Err(IncludeError::UnknownParent {
                name: spec.name.clone(),
                parent: parent.clone(),
            });
        }

        self.specs.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&IncludableSpec> {
        self.specs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Registered specs in registration order
    pub fn specs(&self) -> impl Iterator<Item = &IncludableSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Match the client's requested includes against the registry
    ///
    /// Returns one entry per distinct requested path, in request order.
    /// Unknown paths, nested paths whose parent was not requested, and paths
    /// deeper than the depth limit are dropped without error.
    pub fn resolve(&self, requested: &[IncludeRequest]) -> Vec<ResolvedInclude<'_>> {
        let requested_paths: HashSet<&str> =
            requested.iter().map(|request| request.path.as_str()).collect();
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for request in requested {
            if !seen.insert(request.path.as_str()) {
                continue;
            }

            let Some(spec) = self.specs.get(&request.path) else {
                tracing::debug!(include = %request.path, "dropping unknown include");
                continue;
            };

            match self.chain_depth(spec, &requested_paths) {
                Some(depth) if depth <= self.max_depth => resolved.push(ResolvedInclude {
                    spec,
                    columns: Self::filter_columns(spec, &request.columns),
                }),
                Some(depth) => {
                    tracing::debug!(include = %request.path, depth, max_depth = self.max_depth, "dropping include nested too deep");
                }
                None => {
                    tracing::debug!(include = %request.path, "dropping nested include without its parent");
                }
            }
        }

        resolved
    }

    /// Intersect the requested columns with the allowed ones
    ///
    /// Requested order is kept; an empty intersection falls back to the
    /// spec's default columns.
    pub fn filter_columns(spec: &IncludableSpec, requested: &[String]) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for column in requested {
            if spec.allow_columns.contains(column) && !columns.contains(column) {
                columns.push(column.clone());
            }
        }

        if columns.is_empty() {
            spec.default_columns.clone()
        } else {
            columns
        }
    }

    /// Depth of `spec` if its whole parent chain was requested
    fn chain_depth(&self, spec: &IncludableSpec, requested: &HashSet<&str>) -> Option<usize> {
        let mut depth = 1;
        let mut current = spec;

        while let Some(parent) = current.parent.as_deref() {
            if !requested.contains(parent) {
                return None;
            }
            current = self.specs.get(parent)?;
            depth += 1;
        }

        Some(depth)
    }
}
