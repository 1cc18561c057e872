//! Repository identity
//!
//! A data directory is bound to one clone through a fingerprint of the
//! working-tree root and the `origin` remote URL.

use std::path::{Path, PathBuf};

use git2::Repository;
use sha2::{Digest, Sha256};

/// Resolve the working-tree root that contains `path`.
///
/// Falls back to the canonical form of `path` itself (or `path` unchanged if
/// it cannot be canonicalized) when it is not inside a git repository.
pub fn discover_root(path: &Path) -> PathBuf {
    let resolved = match path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("Could not resolve real path for {}: {}", path.display(), e);
            path.to_path_buf()
        }
    };

    match Repository::discover(&resolved) {
        Ok(repo) => match repo.workdir() {
            Some(workdir) => workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf()),
            None => resolved,
        },
        Err(e) => {
            tracing::debug!(
                "No git repository at {}, using it as root: {}",
                resolved.display(),
                e.message()
            );
            resolved
        }
    }
}

/// URL of the `origin` remote, or an empty string when there is none.
pub fn origin_url(root: &Path) -> String {
    Repository::open(root)
        .ok()
        .and_then(|repo| {
            repo.find_remote("origin")
                .ok()
                .and_then(|remote| remote.url().map(str::to_string))
        })
        .unwrap_or_default()
}

/// SHA-256 hex of `"<root>\n<origin url>\n"`.
pub fn fingerprint(root: &Path) -> String {
    let input = format!("{}\n{}\n", root.display(), origin_url(root));
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
