//! Macros for reducing boilerplate when defining forum entities

/// Implement [`Entity`](crate::entities::Entity) and
/// [`HasKey`](crate::core::HasKey) for a struct with an `id: EntityId` field
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Tag {
///     pub id: EntityId,
///     pub name: String,
/// }
///
/// impl_forum_entity!(Tag, "tags", ["id", "name"]);
/// ```
#[macro_export]
macro_rules! impl_forum_entity {
    ($type:ident, $resource:expr, [$($column:expr),* $(,)?]) => {
        impl $crate::entities::Entity for $type {
            const RESOURCE_TYPE: &'static str = $resource;
            const INCLUDABLE: &'static [&'static str] = &[$($column),*];

            fn id(&self) -> $crate::core::EntityId {
                self.id
            }
        }

        impl $crate::core::HasKey for $type {
            type Key = $crate::core::EntityId;

            fn key(&self) -> Option<$crate::core::EntityId> {
                Some(self.id)
            }
        }
    };
}
