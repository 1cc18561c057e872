//! Test harness

mod repo_manager;

pub use repo_manager::TestRepoManager;
