//! Test Data Factory
//!
//! Source files and memory inputs shaped like what agents actually cite.

use vrm_core::{CitationInput, CreateMemoryInput};

/// Five distinct lines, newline-terminated
pub const FIVE_LINES: &str = "line 1\nline 2\nline 3\nline 4\nline 5\n";

/// Factory for creating test data
pub struct TestDataFactory;

impl TestDataFactory {
    /// A small Rust module with a few distinct items
    pub fn rust_module() -> String {
        [
            "use std::time::Duration;",
            "",
            "pub const MAX_RETRIES: u32 = 3;",
            "pub const BACKOFF: Duration = Duration::from_millis(250);",
            "",
            "pub fn should_retry(attempt: u32) -> bool {",
            "    attempt < MAX_RETRIES",
            "}",
            "",
        ]
        .join("\n")
    }

    /// `count` numbered lines, all distinct
    pub fn numbered_lines(count: usize) -> String {
        (1..=count).map(|i| format!("entry {i:04}\n")).collect()
    }

    /// The same text repeated on consecutive lines
    pub fn repeated_lines(text: &str, count: usize) -> String {
        (0..count).map(|_| format!("{text}\n")).collect()
    }

    /// Memory input with one citation
    pub fn memory_input(
        subject: &str,
        fact: &str,
        path: &str,
        start_line: usize,
        end_line: usize,
    ) -> CreateMemoryInput {
        CreateMemoryInput {
            subject: subject.to_string(),
            fact: fact.to_string(),
            reason: None,
            tags: vec![],
            ttl_days: None,
            citations: vec![Self::citation(path, start_line, end_line)],
        }
    }

    pub fn citation(path: &str, start_line: usize, end_line: usize) -> CitationInput {
        CitationInput {
            path: path.to_string(),
            start_line,
            end_line,
            note: None,
        }
    }
}
