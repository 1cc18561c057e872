//! Verified retrieval
//!
//! Search candidates are verified against the working tree before anything
//! is returned, so a caller only ever sees facts whose cited code is still
//! there. Successful retrieval also refreshes the TTL.

use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{check_chars, check_range, persist_or_restore, preview, rank};
use crate::config::Config;
use crate::memory::{Memory, ValidationStatus};
use crate::storage::{Result, Store};
use crate::verify::verify_memory_at;

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 20;
/// Candidates verified per requested result
const CANDIDATE_FACTOR: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveInput {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Also report STALE and MISSING candidates
    #[serde(default)]
    pub include_stale: bool,
    /// Refresh the TTL of returned memories
    #[serde(default = "default_touch")]
    pub touch: bool,
}

fn default_touch() -> bool {
    true
}

impl RetrieveInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
            include_stale: false,
            touch: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedCitation {
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub status: Option<ValidationStatus>,
    pub snippet_preview: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedMemory {
    pub id: String,
    pub subject: String,
    pub fact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub tags: Vec<String>,
    pub status: ValidationStatus,
    pub expires_at: DateTime<Utc>,
    pub citations: Vec<RetrievedCitation>,
}

impl RetrievedMemory {
    fn project(memory: &Memory, status: ValidationStatus) -> Self {
        Self {
            id: memory.id.clone(),
            subject: memory.subject.clone(),
            fact: memory.fact.clone(),
            reason: memory.reason.clone(),
            tags: memory.tags.clone(),
            status,
            expires_at: memory.expires_at,
            citations: memory
                .citations
                .iter()
                .map(|c| RetrievedCitation {
                    path: c.path.clone(),
                    start_line: c.start_line,
                    end_line: c.end_line,
                    status: c.last_validation_status,
                    snippet_preview: preview(&c.snippet_text, 200),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveStats {
    pub candidates: usize,
    pub verified: usize,
    pub valid_count: usize,
    /// Candidates with at least one re-anchored citation
    pub relocated_count: usize,
    pub stale_count: usize,
    pub missing_count: usize,
    pub deleted_expired: usize,
    pub took_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResult {
    pub query: String,
    pub valid: Vec<RetrievedMemory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<Vec<RetrievedMemory>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<RetrievedMemory>>,
    pub stats: RetrieveStats,
}

/// Verify the best-ranked candidates and return the ones still backed by
/// the working tree.
///
/// Every verified candidate is written back (statuses, relocated ranges and
/// TTL refreshes) in a single persist at the end.
pub fn retrieve(
    store: &mut Store,
    config: &Config,
    input: RetrieveInput,
    now: DateTime<Utc>,
) -> Result<RetrieveResult> {
    let started = Instant::now();

    check_chars("query", &input.query, 1, 200)?;
    let limit = input.limit.unwrap_or(DEFAULT_LIMIT);
    check_range("limit", limit, 1, MAX_LIMIT)?;

    let mut stats = RetrieveStats {
        deleted_expired: store.cleanup_expired(now)?,
        ..Default::default()
    };

    let previous = store.memories()?.to_vec();
    let candidates: Vec<Memory> = rank(&previous, &input.query)
        .into_iter()
        .take(limit * CANDIDATE_FACTOR)
        .cloned()
        .collect();
    stats.candidates = candidates.len();

    let mut valid = Vec::new();
    let mut stale = Vec::new();
    let mut missing = Vec::new();

    for candidate in &candidates {
        let verified = verify_memory_at(candidate, &config.repo_root, config.max_file_bytes, now);
        let mut memory = verified.memory;
        stats.verified += 1;

        if memory
            .citations
            .iter()
            .any(|c| c.last_validation_status == Some(ValidationStatus::Relocated))
        {
            stats.relocated_count += 1;
        }

        match verified.status {
            ValidationStatus::Valid | ValidationStatus::Relocated => {
                if input.touch {
                    memory.expires_at = now + Duration::days(config.ttl_days);
                    memory.last_used_at = Some(now);
                }
                stats.valid_count += 1;
                valid.push(RetrievedMemory::project(&memory, ValidationStatus::Valid));
            }
            ValidationStatus::Stale => {
                stats.stale_count += 1;
                stale.push(RetrievedMemory::project(&memory, ValidationStatus::Stale));
            }
            ValidationStatus::Missing => {
                stats.missing_count += 1;
                missing.push(RetrievedMemory::project(&memory, ValidationStatus::Missing));
            }
        }

        store.commit(memory)?;

        if valid.len() >= limit {
            break;
        }
    }

    if stats.verified > 0 {
        persist_or_restore(store, previous)?;
    }

    stats.took_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        query = %input.query,
        candidates = stats.candidates,
        valid = stats.valid_count,
        stale = stats.stale_count,
        missing = stats.missing_count,
        "Retrieve complete"
    );

    let (stale, missing) = if input.include_stale {
        (Some(stale), Some(missing))
    } else {
        (None, None)
    };

    Ok(RetrieveResult {
        query: input.query,
        valid,
        stale,
        missing,
        stats,
    })
}
