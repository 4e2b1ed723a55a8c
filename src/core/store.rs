//! Store traits for filtering and sorting

use serde_json::Value;

/// Trait for stores that filter and sort materialised collections
///
/// Storage backends that cannot push filters down to the database apply
/// them in memory through this trait before paginating.
pub trait QueryableStore<T>: Send + Sync {
    /// Keep the entities matching every exact-match pair in `filter`
    ///
    /// A filter that is not a JSON object matches everything.
    fn apply_filters(&self, data: Vec<T>, filter: &Value) -> Vec<T>;

    /// Sort entities by a `field`, `field:asc` or `field:desc` expression
    ///
    /// The sort is stable, so equal keys keep their natural order.
    fn apply_sort(&self, data: Vec<T>, sort: &str) -> Vec<T>;
}
