//! Snippet normalization and content hashing
//!
//! A citation's fingerprint is the SHA-256 of its *normalized* text. The
//! normal form is insensitive to:
//! - line-terminator style (CRLF, CR, LF)
//! - trailing spaces and tabs on each line
//! - the number of trailing blank lines
//!
//! Any other change to the text changes the hash.

use sha2::{Digest, Sha256};

/// Canonicalize snippet text.
///
/// Converts every line terminator to `\n`, strips trailing spaces and tabs
/// from each line, and collapses trailing newlines so the result ends in
/// exactly one `\n`. Text that is empty after stripping stays empty.
///
/// `normalize(&normalize(x)) == normalize(x)` for every input.
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut normalized = unified
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n");

    if !normalized.is_empty() {
        let kept = normalized.trim_end_matches('\n').len();
        normalized.truncate(kept);
        normalized.push('\n');
    }

    normalized
}

/// SHA-256 of already-normalized text, lowercase hex.
pub fn hash(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Normalize then hash. This is the fingerprint stored on a citation.
pub fn fingerprint(text: &str) -> String {
    hash(&normalize(text))
}

/// Split file content into logical lines on any terminator form.
///
/// A trailing terminator produces a final empty segment, so `"a\nb\n"`
/// yields `["a", "b", ""]`. Line numbers used by citations index into this.
pub fn split_lines(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&content[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&content[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&content[start..]);

    lines
}
