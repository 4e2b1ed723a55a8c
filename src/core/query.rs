//! Query parameters and pagination utilities

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PaginationConfig;
use crate::core::include::IncludeRequest;

/// Query parameters for pagination, filtering and includes
///
/// # Example
/// ```rust,ignore
/// // GET /topics?page=2&limit=10&include=node,replies:columns(id|body)
/// let includes = params.includes();
/// let query = params.to_list_query(&config.pagination);
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct QueryParams {
    /// Page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page; falls back to the configured page size
    pub limit: Option<usize>,

    /// Filters as a JSON object of exact matches, e.g. `{"is_excellent": true}`
    pub filter: Option<String>,

    /// Sort field and direction: `field`, `field:asc` or `field:desc`
    pub sort: Option<String>,

    /// Comma-separated include paths
    pub include: Option<String>,
}

fn default_page() -> usize {
    1
}

impl QueryParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get the page size, clamped to the configured maximum
    pub fn page_size(&self, config: &PaginationConfig) -> usize {
        self.limit
            .unwrap_or(config.per_page)
            .clamp(1, config.max_per_page.max(1))
    }

    /// Parse filter JSON string into Value
    pub fn filter_value(&self) -> Option<Value> {
        self.filter
            .as_ref()
            .and_then(|s| serde_json::from_str(s).ok())
    }

    /// Parse the include parameter
    pub fn includes(&self) -> Vec<IncludeRequest> {
        self.include
            .as_deref()
            .map(IncludeRequest::parse_list)
            .unwrap_or_default()
    }

    /// Build the storage-level query for a listing
    pub fn to_list_query(&self, config: &PaginationConfig) -> ListQuery {
        ListQuery {
            filter: self.filter_value(),
            sort: self.sort.clone(),
            page: self.page(),
            page_size: self.page_size(config),
        }
    }
}

/// A listing request as seen by storage collaborators
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Exact-match filters as a JSON object
    pub filter: Option<Value>,

    /// Sort expression (`field:asc` / `field:desc`)
    pub sort: Option<String>,

    /// Page number (starts at 1)
    pub page: usize,

    /// Items per page
    pub page_size: usize,
}

impl ListQuery {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            filter: None,
            sort: None,
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Add an exact-match filter on `field`
    pub fn with_filter(mut self, field: &str, value: Value) -> Self {
        let mut filter = match self.filter.take() {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        filter.insert(field.to_string(), value);
        self.filter = Some(Value::Object(filter));
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Index of the first item on the requested page
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1).saturating_mul(self.page_size)
    }
}

/// A page of items with metadata from the source that produced it
///
/// The metadata always describes the authoritative source of the page. When
/// items are swapped for other values (see [`crate::core::merge::merge_page`])
/// the metadata travels unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items in page order
    pub items: Vec<T>,

    /// Total number of items in the source
    pub total: usize,

    /// Items per page
    pub page_size: usize,

    /// Page number (starts at 1)
    pub page_number: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, page_size: usize, page_number: usize) -> Self {
        Self {
            items,
            total,
            page_size,
            page_number,
        }
    }

    /// Cut one page out of a fully materialised, ordered collection
    pub fn paginate(all: Vec<T>, page_number: usize, page_size: usize) -> Self {
        let page_number = page_number.max(1);
        let page_size = page_size.max(1);
        let total = all.len();
        let offset = (page_number - 1).saturating_mul(page_size);
        let items = all.into_iter().skip(offset).take(page_size).collect();

        Self::new(items, total, page_size, page_number)
    }

    /// Same metadata, different items
    pub fn with_items<U>(&self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            total: self.total,
            page_size: self.page_size,
            page_number: self.page_number,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page_size: self.page_size,
            page_number: self.page_number,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta::new(self.page_number, self.page_size, self.total)
    }

    /// Wrap into the paginated response envelope
    pub fn into_response(self) -> PaginatedResponse<T> {
        PaginatedResponse {
            pagination: self.meta(),
            data: self.items,
        }
    }
}

/// Paginated response structure
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}
