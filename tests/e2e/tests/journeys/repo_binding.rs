//! Journey: a data directory belongs to exactly one repository clone.

use std::fs;

use git2::Repository;
use vrm_core::{Config, StorageError, Store};
use vrm_e2e_tests::harness::TestRepoManager;
use vrm_e2e_tests::mocks::FIVE_LINES;

fn snapshot(dir: &std::path::Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            (
                e.file_name().to_string_lossy().into_owned(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_reopening_same_repository_succeeds() {
    let mut repo = TestRepoManager::new_git("https://example.com/acme/widgets.git");
    repo.write_file("x.txt", FIVE_LINES);
    let id = repo.cite("Bound fact", "x.txt", 1, 1);

    let reopened = repo.reopen();
    assert!(reopened.get(&id).unwrap().is_some());
}

#[test]
fn test_foreign_repository_is_rejected_without_mutation() {
    let mut repo_a = TestRepoManager::new_git("https://example.com/acme/a.git");
    repo_a.write_file("x.txt", FIVE_LINES);
    repo_a.cite("A fact", "x.txt", 1, 1);
    repo_a.cite("Another A fact", "x.txt", 2, 2);
    let data_dir = repo_a.config.data_dir.clone();
    let before = snapshot(&data_dir);

    let repo_b = TestRepoManager::new_git("https://example.com/acme/b.git");
    let mut config = Config::new(repo_b.root());
    config.data_dir = data_dir.clone();

    let err = Store::from_config(&config).err().unwrap();
    match err {
        StorageError::FingerprintMismatch { expected, actual } => assert_ne!(expected, actual),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(snapshot(&data_dir), before);
}

#[test]
fn test_changed_origin_is_rejected() {
    let repo = TestRepoManager::new_git("https://example.com/acme/widgets.git");

    let git = Repository::open(repo.root()).unwrap();
    git.remote_set_url("origin", "https://example.com/other/widgets.git")
        .unwrap();

    let err = Store::from_config(&repo.config).err().unwrap();
    assert!(matches!(err, StorageError::FingerprintMismatch { .. }));
}

#[test]
fn test_data_directory_layout() {
    let repo = TestRepoManager::new_temp();
    let names: Vec<String> = snapshot(&repo.config.data_dir)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["memories.json", "meta.json"]);

    let meta: serde_json::Value =
        serde_json::from_slice(&fs::read(repo.store.meta_path()).unwrap()).unwrap();
    assert_eq!(meta["root"], repo.root().display().to_string());
    assert_eq!(meta["fingerprint"].as_str().unwrap().len(), 64);
}
