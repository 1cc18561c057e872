//! Manual deletion

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::{Result, Store};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetResult {
    pub deleted: bool,
    pub memory_id: String,
}

/// Delete a memory by id. Unknown ids are not an error.
pub fn forget(store: &mut Store, id: &str, now: DateTime<Utc>) -> Result<ForgetResult> {
    store.cleanup_expired(now)?;

    let deleted = store.remove(id)?;
    if deleted {
        tracing::info!(id, "Forgot memory");
    }

    Ok(ForgetResult {
        deleted,
        memory_id: id.to_string(),
    })
}
