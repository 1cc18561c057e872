//! File Storage Implementation
//!
//! The whole aggregate lives in one pretty-printed JSON file that is only
//! ever replaced, never edited in place:
//!
//! 1. write `memories.json.tmp` and fsync it
//! 2. move an existing `memories.json` to `memories.json.bak`
//! 3. rename the temporary file to `memories.json`
//!
//! Step 3 is the only point where new content becomes visible. A sibling
//! `meta.json` records which repository the directory belongs to.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::schema::{RepoMeta, StorageSchema};
use crate::config::Config;
use crate::memory::Memory;
use crate::repo;
use crate::verify::ExtractError;

const MEMORIES_FILE: &str = "memories.json";
const TMP_FILE: &str = "memories.json.tmp";
const BACKUP_FILE: &str = "memories.json.bak";
const META_FILE: &str = "meta.json";
const META_TMP_FILE: &str = "meta.json.tmp";

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Data directory is bound to a different repository. Fatal.
    #[error("Repo fingerprint mismatch! Expected: {expected}, Actual: {actual}")]
    FingerprintMismatch { expected: String, actual: String },
    /// Atomic replace failed; the previous file is still in place
    #[error("Failed to save memories: {0}")]
    Persistence(String),
    /// A data file exists but cannot be parsed
    #[error("Corrupt data file {path}: {message}")]
    Corrupt { path: String, message: String },
    /// Operation attempted before `load`
    #[error("Store not loaded")]
    NotLoaded,
    /// Caller input outside the accepted limits
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Secret pattern found in the named field
    #[error("Secret detected in {0}")]
    SecretDetected(String),
    /// No memory with this id
    #[error("Memory not found: {0}")]
    NotFound(String),
    /// Citation could not be extracted
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORE
// ============================================================================

/// Durable owner of the memory aggregate for one repository.
///
/// Not synchronized: every mutating method takes `&mut self`, and callers
/// sharing a store across threads must wrap it in their own lock.
pub struct Store {
    repo_root: PathBuf,
    data_dir: PathBuf,
    schema: Option<StorageSchema>,
}

impl Store {
    /// Create a store handle, creating the data directory if needed.
    ///
    /// Nothing is read until [`Store::load`].
    pub fn new(repo_root: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            repo_root: repo_root.into(),
            data_dir,
            schema: None,
        })
    }

    /// Create and load in one step
    pub fn open(repo_root: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(repo_root, data_dir)?;
        store.load()?;
        Ok(store)
    }

    /// Create and load using a [`Config`]
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(config.repo_root.clone(), config.data_dir.clone())
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the primary aggregate file
    pub fn memories_path(&self) -> PathBuf {
        self.data_dir.join(MEMORIES_FILE)
    }

    /// Path of the single backup slot
    pub fn backup_path(&self) -> PathBuf {
        self.data_dir.join(BACKUP_FILE)
    }

    /// Path of the repository metadata record
    pub fn meta_path(&self) -> PathBuf {
        self.data_dir.join(META_FILE)
    }

    pub fn is_loaded(&self) -> bool {
        self.schema.is_some()
    }

    /// Bind to the repository and read the aggregate.
    ///
    /// Idempotent once it has succeeded. The live fingerprint must match the
    /// recorded one; a mismatch fails before anything is written.
    pub fn load(&mut self) -> Result<()> {
        if self.schema.is_some() {
            return Ok(());
        }

        let fingerprint = repo::fingerprint(&self.repo_root);
        let meta_path = self.meta_path();

        if meta_path.exists() {
            let meta: RepoMeta = read_json(&meta_path)?;
            if meta.fingerprint != fingerprint {
                return Err(StorageError::FingerprintMismatch {
                    expected: meta.fingerprint,
                    actual: fingerprint,
                });
            }
        } else {
            let meta = self.repo_meta(fingerprint.clone());
            let data = serde_json::to_string_pretty(&meta)
                .map_err(|e| StorageError::Persistence(e.to_string()))?;
            write_synced(&self.data_dir.join(META_TMP_FILE), data.as_bytes())
                .and_then(|_| fs::rename(self.data_dir.join(META_TMP_FILE), &meta_path))
                .map_err(|e| StorageError::Persistence(e.to_string()))?;
            tracing::info!(root = %self.repo_root.display(), "Bound data directory to repository");
        }

        let memories_path = self.memories_path();
        let backup_path = self.backup_path();

        if memories_path.exists() {
            self.schema = Some(read_json(&memories_path)?);
        } else if backup_path.exists() {
            // Interrupted between moving the primary aside and renaming the new file in
            tracing::warn!("Primary memory file missing, recovering from backup");
            let schema: StorageSchema = read_json(&backup_path)?;
            self.write_schema(&schema)?;
            self.schema = Some(schema);
        } else {
            let schema = StorageSchema::empty(self.repo_meta(fingerprint));
            self.write_schema(&schema)?;
            self.schema = Some(schema);
        }

        Ok(())
    }

    fn repo_meta(&self, fingerprint: String) -> RepoMeta {
        RepoMeta {
            root: self.repo_root.display().to_string(),
            fingerprint,
            created_at: Utc::now(),
        }
    }

    // ========================================================================
    // AGGREGATE ACCESS
    // ========================================================================

    pub fn schema(&self) -> Result<&StorageSchema> {
        self.schema.as_ref().ok_or(StorageError::NotLoaded)
    }

    fn schema_mut(&mut self) -> Result<&mut StorageSchema> {
        self.schema.as_mut().ok_or(StorageError::NotLoaded)
    }

    pub fn memories(&self) -> Result<&[Memory]> {
        Ok(&self.schema()?.memories)
    }

    pub fn get(&self, id: &str) -> Result<Option<&Memory>> {
        Ok(self.memories()?.iter().find(|m| m.id == id))
    }

    /// Append a memory and persist. On failure the aggregate is unchanged.
    pub fn insert(&mut self, memory: Memory) -> Result<()> {
        self.schema_mut()?.memories.push(memory);
        if let Err(e) = self.persist() {
            self.schema_mut()?.memories.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Replace the stored memory with the same id, in memory only.
    ///
    /// Returns `false` if no memory has that id. Call [`Store::persist`] to
    /// make the change durable.
    pub fn commit(&mut self, memory: Memory) -> Result<bool> {
        let memories = &mut self.schema_mut()?.memories;
        match memories.iter_mut().find(|m| m.id == memory.id) {
            Some(slot) => {
                *slot = memory;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Swap in a whole memory list, in memory only
    pub(crate) fn replace_memories(&mut self, memories: Vec<Memory>) -> Result<()> {
        self.schema_mut()?.memories = memories;
        Ok(())
    }

    /// Delete by id. Persists only if something was removed.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let memories = &mut self.schema_mut()?.memories;
        let Some(index) = memories.iter().position(|m| m.id == id) else {
            return Ok(false);
        };
        let removed = memories.remove(index);

        if let Err(e) = self.persist() {
            self.schema_mut()?.memories.insert(index, removed);
            return Err(e);
        }
        Ok(true)
    }

    /// Remove every memory with `expires_at <= now`.
    ///
    /// Writes only when the set changed, so a sweep that removes nothing
    /// leaves the file byte-identical.
    pub fn cleanup_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let memories = &mut self.schema_mut()?.memories;
        if !memories.iter().any(|m| m.is_expired(now)) {
            return Ok(0);
        }

        let previous = memories.clone();
        memories.retain(|m| !m.is_expired(now));
        let removed = previous.len() - memories.len();

        if let Err(e) = self.persist() {
            self.replace_memories(previous)?;
            return Err(e);
        }

        tracing::info!(removed, "Cleaned up expired memories");
        Ok(removed)
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Atomically replace the primary file with the current aggregate
    pub fn persist(&self) -> Result<()> {
        self.write_schema(self.schema()?)
    }

    fn write_schema(&self, schema: &StorageSchema) -> Result<()> {
        let data = serde_json::to_string_pretty(schema)
            .map_err(|e| StorageError::Persistence(e.to_string()))?;

        replace_file(
            &self.data_dir.join(TMP_FILE),
            &self.memories_path(),
            &self.backup_path(),
            data.as_bytes(),
        )
        .map_err(|e| {
            tracing::error!("Failed to perform atomic write: {}", e);
            StorageError::Persistence(e.to_string())
        })
    }
}

/// tmp -> fsync -> primary to backup -> tmp to primary
fn replace_file(tmp: &Path, primary: &Path, backup: &Path, data: &[u8]) -> std::io::Result<()> {
    write_synced(tmp, data)?;

    let had_primary = primary.exists();
    if had_primary {
        // Renaming onto an existing file fails on some platforms
        if backup.exists() {
            fs::remove_file(backup)?;
        }
        fs::rename(primary, backup)?;
    }

    if let Err(e) = fs::rename(tmp, primary) {
        if had_primary {
            let _ = fs::rename(backup, primary);
        }
        return Err(e);
    }

    Ok(())
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| StorageError::Corrupt {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
