//! Memory creation

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{check_chars, check_range, preview};
use crate::config::{Config, MAX_TTL_DAYS};
use crate::memory::{Citation, Memory, ValidationStatus};
use crate::secrets::contains_secret;
use crate::storage::{Result, StorageError, Store};
use crate::verify::{extract, hash, normalize, resolves_into, ExtractError};

const MAX_TAGS: usize = 10;
const MAX_CITATIONS: usize = 5;

/// One requested citation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationInput {
    /// Path relative to the repository root
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request to store a new memory
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoryInput {
    pub subject: String,
    pub fact: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Overrides the configured TTL
    #[serde(default)]
    pub ttl_days: Option<i64>,
    pub citations: Vec<CitationInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCitation {
    pub id: String,
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub snippet_sha256: String,
    pub snippet_preview: String,
}

/// Result of [`create_memory`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMemory {
    pub stored: bool,
    pub memory_id: String,
    pub expires_at: DateTime<Utc>,
    pub citations: Vec<CreatedCitation>,
}

/// Validate input, capture every cited snippet, and persist a new memory.
///
/// Nothing is written unless every citation extracts cleanly and no field
/// trips the secret scan.
pub fn create_memory(
    store: &mut Store,
    config: &Config,
    input: CreateMemoryInput,
    now: DateTime<Utc>,
) -> Result<CreatedMemory> {
    store.cleanup_expired(now)?;

    validate(&input, config)?;

    if config.secret_scan {
        if contains_secret(&input.subject) {
            return Err(StorageError::SecretDetected("subject".to_string()));
        }
        if contains_secret(&input.fact) {
            return Err(StorageError::SecretDetected("fact".to_string()));
        }
        if input.reason.as_deref().is_some_and(contains_secret) {
            return Err(StorageError::SecretDetected("reason".to_string()));
        }
    }

    let mut citations = Vec::with_capacity(input.citations.len());
    for requested in input.citations {
        if resolves_into(&config.repo_root, &requested.path, &config.data_dir) {
            return Err(ExtractError::PathViolation(requested.path).into());
        }

        let snippet = extract(
            &config.repo_root,
            &requested.path,
            requested.start_line,
            requested.end_line,
            config.max_file_bytes,
        )?;

        if config.secret_scan && contains_secret(&snippet) {
            return Err(StorageError::SecretDetected(format!(
                "snippet from {}",
                requested.path
            )));
        }

        citations.push(Citation {
            id: Uuid::new_v4().to_string(),
            path: requested.path,
            start_line: requested.start_line,
            end_line: requested.end_line,
            snippet_sha256: hash(&normalize(&snippet)),
            snippet_text: snippet,
            last_validated_at: Some(now),
            last_validation_status: Some(ValidationStatus::Valid),
            last_validation_detail: None,
            note: requested.note,
        });
    }

    let ttl_days = input.ttl_days.unwrap_or(config.ttl_days);
    let memory = Memory {
        id: Uuid::new_v4().to_string(),
        subject: input.subject,
        fact: input.fact,
        reason: input.reason,
        tags: input.tags,
        created_at: now,
        updated_at: now,
        last_used_at: None,
        expires_at: now + Duration::days(ttl_days),
        citations,
    };

    let result = CreatedMemory {
        stored: true,
        memory_id: memory.id.clone(),
        expires_at: memory.expires_at,
        citations: memory
            .citations
            .iter()
            .map(|c| CreatedCitation {
                id: c.id.clone(),
                path: c.path.clone(),
                start_line: c.start_line,
                end_line: c.end_line,
                snippet_sha256: c.snippet_sha256.clone(),
                snippet_preview: preview(&c.snippet_text, 200),
            })
            .collect(),
    };

    store.insert(memory)?;
    tracing::info!(id = %result.memory_id, citations = result.citations.len(), "Stored memory");

    Ok(result)
}

fn validate(input: &CreateMemoryInput, config: &Config) -> Result<()> {
    check_chars("subject", &input.subject, 1, 80)?;
    check_chars("fact", &input.fact, 1, 800)?;
    if let Some(reason) = &input.reason {
        check_chars("reason", reason, 0, 400)?;
    }

    if input.tags.len() > MAX_TAGS {
        return Err(StorageError::InvalidInput(format!(
            "at most {MAX_TAGS} tags allowed (got {})",
            input.tags.len()
        )));
    }
    for tag in &input.tags {
        check_chars("tag", tag, 1, 30)?;
    }

    if let Some(days) = input.ttl_days {
        check_range("ttlDays", days, 1, MAX_TTL_DAYS)?;
    }

    check_range("citations", input.citations.len(), 1, MAX_CITATIONS)?;
    for citation in &input.citations {
        if citation.start_line < 1 {
            return Err(StorageError::InvalidInput(format!(
                "startLine must be at least 1 in {}",
                citation.path
            )));
        }
        if citation.end_line < citation.start_line {
            return Err(StorageError::InvalidInput(format!(
                "Invalid line range: {}-{}",
                citation.start_line, citation.end_line
            )));
        }
        if citation.end_line - citation.start_line + 1 > config.citation_max_lines {
            return Err(StorageError::InvalidInput(format!(
                "Citation exceeds max lines ({})",
                config.citation_max_lines
            )));
        }
        if let Some(note) = &citation.note {
            check_chars("note", note, 0, 200)?;
        }
    }

    Ok(())
}
