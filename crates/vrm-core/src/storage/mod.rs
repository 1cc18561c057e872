//! Storage Module
//!
//! JSON file persistence with atomic replace and repository binding.

mod schema;
mod store;

pub use schema::{RepoMeta, StorageSchema, SCHEMA_VERSION};
pub use store::{Result, StorageError, Store};
