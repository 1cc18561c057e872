//! Test Repository Manager
//!
//! Provides isolated repositories for testing:
//! - Temporary working trees that are automatically cleaned up
//! - Optional git initialization with an `origin` remote
//! - File editing helpers that simulate code churn
//! - Store reopening to check what actually reached disk

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::Repository;
use tempfile::TempDir;
use vrm_core::{
    create_memory, discover_root, CitationInput, Config, CreateMemoryInput, Memory, Store,
};

/// Manager for test repositories
///
/// Each instance owns a fresh working tree and a store bound to it. The
/// directory is deleted when the manager is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let mut repo = TestRepoManager::new_temp();
/// repo.write_file("src/lib.rs", FIVE_LINES);
/// let id = repo.cite("Entry point", "src/lib.rs", 2, 3);
/// repo.insert_lines_at_top("src/lib.rs", &["// header"]);
/// ```
pub struct TestRepoManager {
    /// The store instance
    pub store: Store,
    /// Configuration the store was opened with
    pub config: Config,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestRepoManager {
    /// Plain directory, no git metadata
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = discover_root(temp_dir.path());
        Self::open(temp_dir, root)
    }

    /// Git repository with `origin` pointing at `url`
    pub fn new_git(url: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let repo = Repository::init(temp_dir.path()).expect("Failed to init git repository");
        repo.remote("origin", url).expect("Failed to add origin");
        let root = discover_root(temp_dir.path());
        Self::open(temp_dir, root)
    }

    fn open(temp_dir: TempDir, root: PathBuf) -> Self {
        let config = Config::new(&root);
        let store = Store::from_config(&config).expect("Failed to open test store");
        Self {
            store,
            config,
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Working-tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh store over the same data directory
    pub fn reopen(&self) -> Store {
        Store::from_config(&self.config).expect("Failed to reopen store")
    }

    /// Memory as currently persisted on disk
    pub fn persisted(&self, id: &str) -> Option<Memory> {
        self.reopen().get(id).expect("store loaded").cloned()
    }

    // ========================================================================
    // FILE CHURN
    // ========================================================================

    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    pub fn read_file(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).expect("Failed to read file")
    }

    pub fn remove_file(&self, relative: &str) {
        fs::remove_file(self.root.join(relative)).expect("Failed to remove file");
    }

    /// Prepend lines, shifting everything below
    pub fn insert_lines_at_top(&self, relative: &str, lines: &[&str]) {
        let mut content: String = lines.iter().map(|l| format!("{l}\n")).collect();
        content.push_str(&self.read_file(relative));
        self.write_file(relative, &content);
    }

    /// Replace 1-indexed line `line` with `replacement`
    pub fn replace_line(&self, relative: &str, line: usize, replacement: &str) {
        let content = self.read_file(relative);
        let mut lines: Vec<&str> = content.split('\n').collect();
        lines[line - 1] = replacement;
        self.write_file(relative, &lines.join("\n"));
    }

    // ========================================================================
    // SEEDING
    // ========================================================================

    /// Store a memory citing one range, returning its id
    pub fn cite(&mut self, subject: &str, path: &str, start: usize, end: usize) -> String {
        self.cite_at(subject, path, start, end, Utc::now())
    }

    /// [`TestRepoManager::cite`] with an explicit clock
    pub fn cite_at(
        &mut self,
        subject: &str,
        path: &str,
        start: usize,
        end: usize,
        now: DateTime<Utc>,
    ) -> String {
        let input = CreateMemoryInput {
            subject: subject.to_string(),
            fact: format!("{subject} lives in {path}"),
            reason: None,
            tags: vec![],
            ttl_days: None,
            citations: vec![CitationInput {
                path: path.to_string(),
                start_line: start,
                end_line: end,
                note: None,
            }],
        };
        create_memory(&mut self.store, &self.config, input, now)
            .expect("Failed to store memory")
            .memory_id
    }
}
