//! # VRM Core
//!
//! Verified repo memory: short facts about a codebase, each anchored to the
//! exact lines that justify it.
//!
//! - **Content-hash citations**: every citation stores the SHA-256 of its
//!   normalized snippet, so line-ending and trailing-whitespace churn never
//!   invalidates it
//! - **Just-in-time verification**: citations are checked against the live
//!   working tree when a memory is read, never trusted from stored state
//! - **Relocation**: when code moves, a citation is re-anchored only if its
//!   snippet occurs exactly once and re-hashes identically
//! - **TTL**: memories expire unless a verified retrieval refreshes them
//! - **Crash-safe storage**: one JSON file replaced by fsync + atomic rename,
//!   bound to a single repository by fingerprint
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vrm_core::prelude::*;
//! use chrono::Utc;
//!
//! let config = Config::from_env(discover_root(std::path::Path::new(".")));
//! let mut store = Store::from_config(&config)?;
//!
//! let input = CreateMemoryInput {
//!     subject: "Retry policy".to_string(),
//!     fact: "HTTP calls retry three times with backoff".to_string(),
//!     reason: None,
//!     tags: vec!["http".to_string()],
//!     ttl_days: None,
//!     citations: vec![CitationInput {
//!         path: "src/http.rs".to_string(),
//!         start_line: 10,
//!         end_line: 14,
//!         note: None,
//!     }],
//! };
//! create_memory(&mut store, &config, input, Utc::now())?;
//!
//! // Later: only facts whose cited code still exists come back
//! let found = retrieve(&mut store, &config, RetrieveInput::new("retry"), Utc::now())?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod memory;
pub mod ops;
pub mod repo;
pub mod secrets;
pub mod storage;
pub mod verify;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{Config, CITATION_MAX_LINES, DEFAULT_MAX_FILE_BYTES, DEFAULT_TTL_DAYS, MAX_TTL_DAYS};

pub use memory::{Citation, Memory, ValidationStatus};

pub use ops::{
    create_memory, forget, list, retrieve, search, CitationInput, CreateMemoryInput,
    CreatedMemory, ForgetResult, ListFilter, ListInput, ListResult, RetrieveInput,
    RetrieveResult, SearchInput, SearchResult,
};

pub use repo::discover_root;

pub use storage::{RepoMeta, Result, StorageError, StorageSchema, Store};

pub use verify::{
    verify_citation, verify_memory, ExtractError, VerifiedMemory, DATA_DIR_NAME,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        create_memory, discover_root, forget, list, retrieve, search, Citation, CitationInput,
        Config, CreateMemoryInput, ListFilter, ListInput, Memory, Result, RetrieveInput,
        SearchInput, StorageError, Store, ValidationStatus,
    };
}
