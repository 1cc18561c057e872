//! Runtime configuration
//!
//! Values come from `VRM_*` environment variables with fallbacks to the
//! defaults below; front ends may override individual fields afterwards.

use std::path::{Path, PathBuf};

use crate::verify::DATA_DIR_NAME;

/// Days a memory lives without a successful verified retrieval
pub const DEFAULT_TTL_DAYS: i64 = 28;

/// Largest accepted TTL in days
pub const MAX_TTL_DAYS: i64 = 365;

/// Files above this size are never read
pub const DEFAULT_MAX_FILE_BYTES: u64 = 2_000_000;

/// Longest citation range, in lines
pub const CITATION_MAX_LINES: usize = 200;

/// Store configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working-tree root citations are resolved against
    pub repo_root: PathBuf,
    /// Directory holding `meta.json` and `memories.json`
    pub data_dir: PathBuf,
    pub ttl_days: i64,
    pub max_file_bytes: u64,
    /// Reject memories whose text or snippets look like credentials
    pub secret_scan: bool,
    pub citation_max_lines: usize,
}

impl Config {
    /// Defaults for a repository root, data directory inside it
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        let repo_root = repo_root.into();
        Self {
            data_dir: default_data_dir(&repo_root),
            repo_root,
            ttl_days: DEFAULT_TTL_DAYS,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            secret_scan: true,
            citation_max_lines: CITATION_MAX_LINES,
        }
    }

    /// Build from the process environment.
    ///
    /// - `VRM_DATA_DIR`: data directory (default `<repo>/.verified-repo-memory`)
    /// - `VRM_TTL_DAYS`: 1-365, anything else falls back to 28
    /// - `VRM_MAX_FILE_BYTES`: positive integer, else 2000000
    /// - `VRM_SECRET_SCAN`: `off` disables secret rejection
    pub fn from_env(repo_root: impl Into<PathBuf>) -> Self {
        Self::from_lookup(repo_root, |key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(repo_root: impl Into<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(repo_root);

        if let Some(dir) = lookup("VRM_DATA_DIR").filter(|s| !s.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(days) = lookup("VRM_TTL_DAYS") {
            config = config.with_ttl_days(days.trim().parse().ok());
        }
        if let Some(bytes) = lookup("VRM_MAX_FILE_BYTES") {
            config = config.with_max_file_bytes(bytes.trim().parse().ok());
        }
        if lookup("VRM_SECRET_SCAN").as_deref() == Some("off") {
            config.secret_scan = false;
        }

        config
    }

    /// Set the TTL, falling back to the default when absent or out of range
    pub fn with_ttl_days(mut self, days: Option<i64>) -> Self {
        self.ttl_days = match days {
            Some(d) if (1..=MAX_TTL_DAYS).contains(&d) => d,
            _ => DEFAULT_TTL_DAYS,
        };
        self
    }

    /// Set the file size limit, falling back to the default when absent or zero
    pub fn with_max_file_bytes(mut self, bytes: Option<u64>) -> Self {
        self.max_file_bytes = match bytes {
            Some(b) if b >= 1 => b,
            _ => DEFAULT_MAX_FILE_BYTES,
        };
        self
    }
}

/// `<repo>/.verified-repo-memory`
pub fn default_data_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(DATA_DIR_NAME)
}
