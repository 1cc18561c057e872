//! Memory module - Core types and data structures
//!
//! A [`Memory`] is a short factual note anchored to the repository by one or
//! more [`Citation`]s. Each citation pins an inclusive line range of a file
//! together with the hash of its normalized text at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// VALIDATION STATUS
// ============================================================================

/// Outcome of verifying a citation (or, aggregated, a memory) against the
/// live working tree.
///
/// These are data, not errors: every verification produces one of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    /// Content at the stored range still hashes to the stored fingerprint
    Valid,
    /// Content moved; the citation was re-anchored to a unique new range
    Relocated,
    /// Content changed and could not be unambiguously re-anchored
    Stale,
    /// File is gone, unreadable, too large, or the path is unsafe
    Missing,
}

impl ValidationStatus {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "VALID",
            ValidationStatus::Relocated => "RELOCATED",
            ValidationStatus::Stale => "STALE",
            ValidationStatus::Missing => "MISSING",
        }
    }

    /// Aggregate severity: MISSING over STALE over everything else.
    ///
    /// RELOCATED and never-verified citations count as VALID.
    pub fn aggregate<I>(statuses: I) -> ValidationStatus
    where
        I: IntoIterator<Item = Option<ValidationStatus>>,
    {
        let mut result = ValidationStatus::Valid;
        for status in statuses.into_iter().flatten() {
            match status {
                ValidationStatus::Missing => return ValidationStatus::Missing,
                ValidationStatus::Stale => result = ValidationStatus::Stale,
                ValidationStatus::Valid | ValidationStatus::Relocated => {}
            }
        }
        result
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VALID" => Ok(ValidationStatus::Valid),
            "RELOCATED" => Ok(ValidationStatus::Relocated),
            "STALE" => Ok(ValidationStatus::Stale),
            "MISSING" => Ok(ValidationStatus::Missing),
            _ => Err(format!("Unknown validation status: {}", s)),
        }
    }
}

// ============================================================================
// CITATION
// ============================================================================

/// A pointer from a memory to an inclusive line range of a repository file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Path relative to the repository root
    pub path: String,
    /// First cited line, 1-indexed
    pub start_line: usize,
    /// Last cited line, inclusive
    pub end_line: usize,
    /// SHA-256 of the normalized snippet captured at creation
    pub snippet_sha256: String,
    /// Raw snippet text as originally extracted
    pub snippet_text: String,
    pub last_validated_at: Option<DateTime<Utc>>,
    pub last_validation_status: Option<ValidationStatus>,
    pub last_validation_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Citation {
    /// Number of lines covered by the range
    pub fn line_span(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

// ============================================================================
// MEMORY
// ============================================================================

/// A factual note anchored to the repository by citations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Short headline
    pub subject: String,
    /// The fact itself
    pub fact: String,
    /// Why the fact matters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Advances on creation and whenever verification changes a citation
    pub updated_at: DateTime<Utc>,
    /// Last time a retrieval returned this memory as valid
    pub last_used_at: Option<DateTime<Utc>>,
    /// The memory is swept once `expires_at <= now`
    pub expires_at: DateTime<Utc>,
    pub citations: Vec<Citation>,
}

impl Memory {
    /// Check whether the memory has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Status derived from the last stored verification of each citation
    pub fn stored_status(&self) -> ValidationStatus {
        ValidationStatus::aggregate(self.citations.iter().map(|c| c.last_validation_status))
    }

    /// Lowercased text that keyword search matches against
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.subject,
            self.fact,
            self.reason.as_deref().unwrap_or(""),
            self.tags.join(" ")
        )
        .to_lowercase()
    }
}
