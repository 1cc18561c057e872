//! Safe path resolution and line-range extraction
//!
//! Citations name repo-relative paths supplied by callers, so every read goes
//! through [`safe_resolve`] first. Extraction returns the raw lines verbatim;
//! normalization happens downstream.

use std::path::{Component, Path, PathBuf};

use super::normalize::split_lines;

/// Directory name used for the store's data directory inside a repository.
pub const DATA_DIR_NAME: &str = ".verified-repo-memory";

/// Path segments that citations may never reach into.
pub const RESTRICTED_SEGMENTS: &[&str] = &[".git", DATA_DIR_NAME];

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Extraction error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Absolute path, `..` traversal, restricted directory, or escape from the root
    #[error("Unsafe path: {0}")]
    PathViolation(String),
    /// File is absent or not a regular file
    #[error("File not found: {0}")]
    NotFound(String),
    /// File exceeds the configured size limit
    #[error("File too large: {path} ({size} bytes > {max} bytes)")]
    TooLarge { path: String, size: u64, max: u64 },
    /// Line range is not usable against the file
    #[error("Invalid line range: {0}")]
    InvalidRange(String),
    /// IO error while reading an existing file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// PATH SAFETY
// ============================================================================

/// Resolve `relative` against `root`, refusing anything that could leave the
/// repository or touch version-control metadata or the data directory.
pub fn safe_resolve(root: &Path, relative: &str) -> Result<PathBuf, ExtractError> {
    let violation = || ExtractError::PathViolation(relative.to_string());

    if Path::new(relative).is_absolute() || relative.starts_with('/') || relative.starts_with('\\')
    {
        return Err(violation());
    }

    // Split on both separators so Windows-style input is checked the same way
    for segment in relative.split(['/', '\\']) {
        if segment == ".." || RESTRICTED_SEGMENTS.contains(&segment) {
            return Err(violation());
        }
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return Err(violation()),
        }
    }

    if !resolved.starts_with(root) {
        return Err(violation());
    }

    // Symlinks must stay inside the tree and out of restricted directories
    if let (Ok(real), Ok(real_root)) = (resolved.canonicalize(), root.canonicalize()) {
        let inner = real.strip_prefix(&real_root).map_err(|_| violation())?;
        if inner
            .components()
            .any(|c| RESTRICTED_SEGMENTS.iter().any(|r| c.as_os_str() == *r))
        {
            return Err(violation());
        }
    }

    Ok(resolved)
}

/// Whether `relative` under `root` lands inside `dir`.
///
/// Covers data directories configured away from [`DATA_DIR_NAME`]. Paths that
/// do not exist are compared as written.
pub fn resolves_into(root: &Path, relative: &str, dir: &Path) -> bool {
    let Ok(path) = safe_resolve(root, relative) else {
        return false;
    };
    let real = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
    path.starts_with(dir) || real(&path).starts_with(real(dir))
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Read a file under the size limit, decoding UTF-8 lossily.
pub(crate) fn read_bounded(
    root: &Path,
    relative: &str,
    max_bytes: u64,
) -> Result<String, ExtractError> {
    let path = safe_resolve(root, relative)?;

    let metadata = match std::fs::metadata(&path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(ExtractError::NotFound(relative.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractError::NotFound(relative.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.len() > max_bytes {
        return Err(ExtractError::TooLarge {
            path: relative.to_string(),
            size: metadata.len(),
            max: max_bytes,
        });
    }

    let bytes = std::fs::read(&path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Join lines `start..=end` (1-indexed) of `lines` with `\n`.
///
/// Callers guarantee `1 <= start <= lines.len()`; `end` is clamped.
pub(crate) fn join_range(lines: &[&str], start: usize, end: usize) -> String {
    let end = end.min(lines.len());
    lines[start - 1..end].join("\n")
}

/// Extract the inclusive line range `start_line..=end_line` from a file.
///
/// An `end_line` past the last line is clamped to the end of the file; a
/// `start_line` past it is an error.
pub fn extract(
    root: &Path,
    relative: &str,
    start_line: usize,
    end_line: usize,
    max_bytes: u64,
) -> Result<String, ExtractError> {
    let content = read_bounded(root, relative, max_bytes)?;

    if start_line < 1 || end_line < start_line {
        return Err(ExtractError::InvalidRange(format!("{start_line}-{end_line}")));
    }

    let lines = split_lines(&content);
    if start_line > lines.len() {
        return Err(ExtractError::InvalidRange(format!(
            "{start_line}-{end_line} is out of bounds ({} lines)",
            lines.len()
        )));
    }

    Ok(join_range(&lines, start_line, end_line))
}
