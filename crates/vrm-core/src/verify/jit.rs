//! Just-in-time citation verification and relocation
//!
//! Verification is stateless: the prior status of a citation is never used to
//! decide the new one, only to detect whether anything changed. The result is
//! always a fresh snapshot; committing it back into the store is the caller's
//! job.

use std::path::Path;

use chrono::{DateTime, Utc};

use super::extract::{join_range, read_bounded, ExtractError};
use super::normalize::{hash, normalize, split_lines};
use crate::memory::{Citation, Memory, ValidationStatus};

/// Detail recorded when a citation is re-anchored
pub const DETAIL_RELOCATED: &str = "position updated";

/// Detail recorded when content changed and no unique match was confirmed
pub const DETAIL_STALE: &str = "content changed and cannot be safely relocated";

/// Result of verifying every citation of a memory
#[derive(Debug, Clone)]
pub struct VerifiedMemory {
    /// Updated copy of the memory
    pub memory: Memory,
    /// Aggregate status: MISSING, else STALE, else VALID
    pub status: ValidationStatus,
    /// Whether any citation's status or position differs from before
    pub changed: bool,
}

/// Verify a single citation against the working tree at `root`.
pub fn verify_citation(citation: &Citation, root: &Path, max_bytes: u64) -> Citation {
    verify_citation_at(citation, root, max_bytes, Utc::now())
}

/// [`verify_citation`] with an explicit clock.
pub fn verify_citation_at(
    citation: &Citation,
    root: &Path,
    max_bytes: u64,
    now: DateTime<Utc>,
) -> Citation {
    let mut result = citation.clone();
    result.last_validated_at = Some(now);

    let content = match read_bounded(root, &citation.path, max_bytes) {
        Ok(content) => content,
        Err(e) => {
            result.last_validation_status = Some(ValidationStatus::Missing);
            result.last_validation_detail = Some(missing_detail(&e));
            return result;
        }
    };

    let lines = split_lines(&content);

    // Fast path: the stored range still holds the same content
    if citation.start_line >= 1
        && citation.start_line <= citation.end_line
        && citation.end_line <= lines.len()
    {
        let current = join_range(&lines, citation.start_line, citation.end_line);
        if hash(&normalize(&current)) == citation.snippet_sha256 {
            result.last_validation_status = Some(ValidationStatus::Valid);
            result.last_validation_detail = None;
            return result;
        }
    }

    if let Some((start, end)) = relocate(citation, &content, &lines) {
        tracing::debug!(
            path = %citation.path,
            from = %format!("{}-{}", citation.start_line, citation.end_line),
            to = %format!("{start}-{end}"),
            "Relocated citation"
        );
        result.start_line = start;
        result.end_line = end;
        result.last_validation_status = Some(ValidationStatus::Relocated);
        result.last_validation_detail = Some(DETAIL_RELOCATED.to_string());
        return result;
    }

    result.last_validation_status = Some(ValidationStatus::Stale);
    result.last_validation_detail = Some(DETAIL_STALE.to_string());
    result
}

/// Search the normalized file for the normalized original snippet.
///
/// Returns the new inclusive range only when the snippet occurs exactly once
/// and the raw lines at that range hash back to the stored fingerprint.
fn relocate(citation: &Citation, content: &str, lines: &[&str]) -> Option<(usize, usize)> {
    let haystack = normalize(content);
    let normalized_snippet = normalize(&citation.snippet_text);
    let target = normalized_snippet
        .strip_suffix('\n')
        .unwrap_or(&normalized_snippet);

    if target.is_empty() {
        return None;
    }

    // first == last means exactly one occurrence, overlaps included
    let first = haystack.find(target)?;
    let last = haystack.rfind(target)?;
    if first != last {
        return None;
    }

    let start = haystack[..first].matches('\n').count() + 1;
    let end = start + target.matches('\n').count();
    if end > lines.len() {
        return None;
    }

    let candidate = join_range(lines, start, end);
    if hash(&normalize(&candidate)) == citation.snippet_sha256 {
        Some((start, end))
    } else {
        None
    }
}

fn missing_detail(error: &ExtractError) -> String {
    match error {
        ExtractError::PathViolation(_) => error.to_string(),
        ExtractError::NotFound(_) => "File no longer exists.".to_string(),
        ExtractError::TooLarge { .. } => "File too large for verification.".to_string(),
        _ => "Failed to read file.".to_string(),
    }
}

/// Verify every citation of a memory, in order.
pub fn verify_memory(memory: &Memory, root: &Path, max_bytes: u64) -> VerifiedMemory {
    verify_memory_at(memory, root, max_bytes, Utc::now())
}

/// [`verify_memory`] with an explicit clock.
pub fn verify_memory_at(
    memory: &Memory,
    root: &Path,
    max_bytes: u64,
    now: DateTime<Utc>,
) -> VerifiedMemory {
    let citations: Vec<Citation> = memory
        .citations
        .iter()
        .map(|c| verify_citation_at(c, root, max_bytes, now))
        .collect();

    let changed = memory.citations.iter().zip(&citations).any(|(before, after)| {
        before.last_validation_status != after.last_validation_status
            || before.start_line != after.start_line
            || before.end_line != after.end_line
    });

    let status = ValidationStatus::aggregate(citations.iter().map(|c| c.last_validation_status));

    let mut updated = memory.clone();
    updated.citations = citations;
    if changed {
        updated.updated_at = now;
    }

    VerifiedMemory {
        memory: updated,
        status,
        changed,
    }
}
