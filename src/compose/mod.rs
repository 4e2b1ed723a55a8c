//! Response composition: bulk relation loading and include projection

pub mod composer;
pub mod loader;

pub use composer::Composer;
pub use loader::RelationLoader;
