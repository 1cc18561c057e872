//! Keyword search over stored memories, without verification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{check_chars, check_range, preview, rank};
use crate::storage::{Result, Store};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInput {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_expired: bool,
}

impl SearchInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
            include_expired: false,
        }
    }
}

/// Projection of a matching memory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub subject: String,
    pub fact_preview: String,
    pub tags: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub citation_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub total_memories: usize,
    pub returned: usize,
    pub deleted_expired: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub stats: SearchStats,
}

/// Rank memories by how many query tokens their text contains.
///
/// Fast path for candidate discovery: citations are not checked.
pub fn search(store: &mut Store, input: SearchInput, now: DateTime<Utc>) -> Result<SearchResult> {
    check_chars("query", &input.query, 1, 200)?;
    let limit = input.limit.unwrap_or(DEFAULT_LIMIT);
    check_range("limit", limit, 1, MAX_LIMIT)?;

    let deleted_expired = store.cleanup_expired(now)?;
    let memories = store.memories()?;

    let pool = memories
        .iter()
        .filter(|m| input.include_expired || !m.is_expired(now));

    let results: Vec<SearchHit> = rank(pool, &input.query)
        .into_iter()
        .take(limit)
        .map(|m| SearchHit {
            id: m.id.clone(),
            subject: m.subject.clone(),
            fact_preview: preview(&m.fact, 100),
            tags: m.tags.clone(),
            expires_at: m.expires_at,
            citation_paths: m.citations.iter().map(|c| c.path.clone()).collect(),
        })
        .collect();

    tracing::debug!(query = %input.query, returned = results.len(), "Search complete");

    Ok(SearchResult {
        stats: SearchStats {
            total_memories: memories.len(),
            returned: results.len(),
            deleted_expired,
        },
        query: input.query,
        results,
    })
}
