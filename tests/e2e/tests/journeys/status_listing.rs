//! Journey: audit stored memories, verify one explicitly, forget another.

use chrono::Utc;
use vrm_core::ops::{forget, list, verify};
use vrm_core::{ListFilter, ListInput, StorageError, ValidationStatus};
use vrm_e2e_tests::harness::TestRepoManager;
use vrm_e2e_tests::mocks::{TestDataFactory, FIVE_LINES};

fn listed(repo: &mut TestRepoManager, status: ListFilter, verify: bool) -> Vec<String> {
    let input = ListInput {
        status,
        limit: None,
        verify,
    };
    list(&mut repo.store, &repo.config, input, Utc::now())
        .unwrap()
        .items
        .into_iter()
        .map(|i| i.subject)
        .collect()
}

#[test]
fn test_list_reflects_stored_then_verified_status() {
    let mut repo = TestRepoManager::new_temp();
    repo.write_file("keep.txt", FIVE_LINES);
    repo.write_file("edit.txt", &TestDataFactory::numbered_lines(10));
    repo.write_file("drop.txt", FIVE_LINES);
    repo.cite("Kept", "keep.txt", 1, 2);
    repo.cite("Edited", "edit.txt", 4, 5);
    repo.cite("Dropped", "drop.txt", 3, 3);

    repo.replace_line("edit.txt", 5, "entry changed");
    repo.remove_file("drop.txt");

    // Stored statuses have not seen the churn yet
    assert_eq!(listed(&mut repo, ListFilter::Valid, false).len(), 3);
    assert!(listed(&mut repo, ListFilter::Stale, false).is_empty());

    // Verification surfaces it and persists the outcome
    assert_eq!(listed(&mut repo, ListFilter::Stale, true), vec!["Edited"]);
    assert_eq!(listed(&mut repo, ListFilter::Missing, false), vec!["Dropped"]);
    assert_eq!(listed(&mut repo, ListFilter::Valid, false), vec!["Kept"]);
}

#[test]
fn test_explicit_verify_and_forget() {
    let mut repo = TestRepoManager::new_temp();
    repo.write_file("x.txt", FIVE_LINES);
    let id = repo.cite("Verified explicitly", "x.txt", 4, 5);

    repo.insert_lines_at_top("x.txt", &["a", "b"]);
    let verified = verify(&mut repo.store, &repo.config, &id, Utc::now()).unwrap();
    assert!(verified.changed);
    assert_eq!(verified.status, ValidationStatus::Valid);
    let citation = &verified.memory.citations[0];
    assert_eq!((citation.start_line, citation.end_line), (6, 7));

    let result = forget(&mut repo.store, &id, Utc::now()).unwrap();
    assert!(result.deleted);
    assert!(repo.persisted(&id).is_none());

    let err = verify(&mut repo.store, &repo.config, &id, Utc::now()).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
    assert!(!forget(&mut repo.store, &id, Utc::now()).unwrap().deleted);
}
