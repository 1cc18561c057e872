//! Verification Module
//!
//! Content-addressed citation checking:
//! - Normalization and SHA-256 fingerprints of snippets
//! - Path-safe line-range extraction
//! - Just-in-time verification with unambiguous relocation

pub mod extract;
pub mod jit;
pub mod normalize;

pub use extract::{
    extract, resolves_into, safe_resolve, ExtractError, DATA_DIR_NAME,
    RESTRICTED_SEGMENTS,
};
pub use jit::{
    verify_citation, verify_citation_at, verify_memory, verify_memory_at, VerifiedMemory,
    DETAIL_RELOCATED, DETAIL_STALE,
};
pub use normalize::{fingerprint, hash, normalize, split_lines};
