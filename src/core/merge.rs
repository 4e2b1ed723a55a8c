//! Paginated secondary-fetch merge
//!
//! A page of keys comes from one source (a join table such as `favorites`),
//! the entities behind those keys come from another. [`merge_page`] stitches
//! the two together without touching the pagination metadata.

use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use crate::core::entity::HasKey;
use crate::core::query::Page;

/// Replace a page of reference keys with the entities they point at
///
/// - An empty reference page is returned as-is (with no items) and
///   `bulk_fetch` is never called.
/// - Otherwise `bulk_fetch` is called exactly once with every key, in page
///   order.
/// - The result follows the reference order, whatever order the fetch
///   returned. Keys the fetch did not return (e.g. deleted in between) are
///   dropped.
/// - `total`, `page_size` and `page_number` are copied from the reference
///   page.
///
/// A failing fetch fails the whole merge.
pub async fn merge_page<K, E, F, Fut>(reference: Page<K>, bulk_fetch: F) -> Result<Page<E>>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    E: HasKey<Key = K> + Clone,
    F: FnOnce(Vec<K>) -> Fut,
    Fut: Future<Output = Result<Vec<E>>>,
{
    if reference.is_empty() {
        return Ok(reference.with_items(Vec::new()));
    }

    let fetched = bulk_fetch(reference.items.clone()).await?;

    let mut by_key: HashMap<K, E> = HashMap::with_capacity(fetched.len());
    for entity in fetched {
        if let Some(key) = entity.key() {
            by_key.entry(key).or_insert(entity);
        }
    }

    let mut items = Vec::with_capacity(reference.items.len());
    for key in &reference.items {
        match by_key.get(key) {
            Some(entity) => items.push(entity.clone()),
            None => tracing::debug!(key = ?key, "reference key missing from bulk fetch, dropping"),
        }
    }

    Ok(reference.with_items(items))
}
