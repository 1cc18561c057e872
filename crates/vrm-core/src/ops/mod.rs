//! Operations
//!
//! The externally visible actions on a repository's memories. Each one takes
//! the store exclusively, sweeps expired memories first, and returns a
//! serializable result for the front end to render.

mod create;
mod forget;
mod list;
mod retrieve;
mod search;
mod verify;

pub use create::{create_memory, CitationInput, CreateMemoryInput, CreatedCitation, CreatedMemory};
pub use forget::{forget, ForgetResult};
pub use list::{list, ListCitation, ListFilter, ListInput, ListItem, ListResult};
pub use retrieve::{
    retrieve, RetrieveInput, RetrieveResult, RetrieveStats, RetrievedCitation, RetrievedMemory,
};
pub use search::{search, SearchHit, SearchInput, SearchResult, SearchStats};
pub use verify::verify;

use crate::memory::Memory;
use crate::storage::{Result, StorageError, Store};

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Lowercased whitespace-separated query tokens
pub(crate) fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Number of tokens contained in the memory's search text
pub(crate) fn score(memory: &Memory, tokens: &[String]) -> usize {
    let haystack = memory.search_text();
    tokens.iter().filter(|t| haystack.contains(t.as_str())).count()
}

/// Memories with a positive score, best first, ties broken by most recent update
pub(crate) fn rank<'a, I>(memories: I, query: &str) -> Vec<&'a Memory>
where
    I: IntoIterator<Item = &'a Memory>,
{
    let tokens = tokenize(query);
    let mut scored: Vec<(usize, &Memory)> = memories
        .into_iter()
        .map(|m| (score(m, &tokens), m))
        .filter(|(s, _)| *s > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.updated_at.cmp(&a.1.updated_at)));
    scored.into_iter().map(|(_, m)| m).collect()
}

/// First `max` characters of `text`
pub(crate) fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Reject strings whose character count falls outside `min..=max`
pub(crate) fn check_chars(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(StorageError::InvalidInput(format!(
            "{field} must be between {min} and {max} characters (got {len})"
        )));
    }
    Ok(())
}

/// Reject numbers outside `min..=max`
pub(crate) fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(StorageError::InvalidInput(format!(
            "{field} must be between {min} and {max} (got {value})"
        )));
    }
    Ok(())
}

/// Persist, or put `previous` back if the write fails
pub(crate) fn persist_or_restore(store: &mut Store, previous: Vec<Memory>) -> Result<()> {
    if let Err(e) = store.persist() {
        store.replace_memories(previous)?;
        return Err(e);
    }
    Ok(())
}
