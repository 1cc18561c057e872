//! Listing memories by status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{check_range, persist_or_restore};
use crate::config::Config;
use crate::memory::{Memory, ValidationStatus};
use crate::storage::{Result, StorageError, Store};
use crate::verify::verify_memory_at;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

/// Which memories a listing includes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListFilter {
    #[default]
    All,
    Valid,
    Stale,
    Missing,
}

impl ListFilter {
    fn accepts(&self, status: ValidationStatus) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Valid => status == ValidationStatus::Valid,
            ListFilter::Stale => status == ValidationStatus::Stale,
            ListFilter::Missing => status == ValidationStatus::Missing,
        }
    }
}

impl std::str::FromStr for ListFilter {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(ListFilter::All),
            "valid" => Ok(ListFilter::Valid),
            "stale" => Ok(ListFilter::Stale),
            "missing" => Ok(ListFilter::Missing),
            _ => Err(StorageError::InvalidInput(format!(
                "Unknown status filter: {s} (expected all, valid, stale or missing)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInput {
    #[serde(default)]
    pub status: ListFilter,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Re-verify each inspected memory instead of trusting stored statuses
    #[serde(default)]
    pub verify: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCitation {
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub status: Option<ValidationStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: String,
    pub subject: String,
    pub status: ValidationStatus,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub citations: Vec<ListCitation>,
}

impl ListItem {
    fn project(memory: &Memory, status: ValidationStatus) -> Self {
        Self {
            id: memory.id.clone(),
            subject: memory.subject.clone(),
            status,
            expires_at: memory.expires_at,
            updated_at: memory.updated_at,
            citations: memory
                .citations
                .iter()
                .map(|c| ListCitation {
                    path: c.path.clone(),
                    start_line: c.start_line,
                    end_line: c.end_line,
                    status: c.last_validation_status,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    pub items: Vec<ListItem>,
}

/// List memories, most recently updated first, optionally filtered by status.
///
/// Without `verify`, the status of each memory comes from its stored citation
/// statuses and nothing is written.
pub fn list(
    store: &mut Store,
    config: &Config,
    input: ListInput,
    now: DateTime<Utc>,
) -> Result<ListResult> {
    let limit = input.limit.unwrap_or(DEFAULT_LIMIT);
    check_range("limit", limit, 1, MAX_LIMIT)?;

    store.cleanup_expired(now)?;

    let previous = store.memories()?.to_vec();
    let mut ordered: Vec<&Memory> = previous.iter().collect();
    ordered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let mut items = Vec::new();
    let mut verified_any = false;

    for memory in ordered {
        if items.len() >= limit {
            break;
        }

        let item = if input.verify {
            let verified = verify_memory_at(memory, &config.repo_root, config.max_file_bytes, now);
            let item = ListItem::project(&verified.memory, verified.status);
            store.commit(verified.memory)?;
            verified_any = true;
            item
        } else {
            ListItem::project(memory, memory.stored_status())
        };

        if input.status.accepts(item.status) {
            items.push(item);
        }
    }

    if verified_any {
        persist_or_restore(store, previous)?;
    }

    Ok(ListResult { items })
}
