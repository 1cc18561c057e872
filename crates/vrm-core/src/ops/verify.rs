//! Explicit verification of a single memory

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::storage::{Result, StorageError, Store};
use crate::verify::{verify_memory_at, VerifiedMemory};

/// Verify one memory against the working tree and commit the outcome.
///
/// The store is only written when a citation's status or position changed.
pub fn verify(
    store: &mut Store,
    config: &Config,
    id: &str,
    now: DateTime<Utc>,
) -> Result<VerifiedMemory> {
    store.cleanup_expired(now)?;

    let memory = store
        .get(id)?
        .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

    let verified = verify_memory_at(memory, &config.repo_root, config.max_file_bytes, now);

    if verified.changed {
        let previous = store.memories()?.to_vec();
        store.commit(verified.memory.clone())?;
        super::persist_or_restore(store, previous)?;
        tracing::info!(id, status = %verified.status, "Memory verification changed");
    }

    Ok(verified)
}
