//! Persisted aggregate layout

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::Memory;

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Identity of the repository a data directory belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoMeta {
    /// Working-tree root
    pub root: String,
    /// SHA-256 of root and origin URL, see [`crate::repo::fingerprint`]
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Everything stored in `memories.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSchema {
    pub schema_version: u32,
    pub repo: RepoMeta,
    pub memories: Vec<Memory>,
}

impl StorageSchema {
    /// Empty aggregate bound to `repo`
    pub fn empty(repo: RepoMeta) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            repo,
            memories: Vec::new(),
        }
    }
}
