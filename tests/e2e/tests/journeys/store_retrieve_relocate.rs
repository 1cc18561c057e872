//! Journey: store a cited fact, change the code, retrieve it again.

use vrm_core::ops::retrieve;
use vrm_core::verify::DETAIL_RELOCATED;
use vrm_core::{RetrieveInput, ValidationStatus};
use vrm_e2e_tests::harness::TestRepoManager;
use vrm_e2e_tests::mocks::{TestDataFactory, FIVE_LINES};

fn retrieve_all(repo: &mut TestRepoManager, query: &str) -> vrm_core::RetrieveResult {
    let mut input = RetrieveInput::new(query);
    input.include_stale = true;
    retrieve(&mut repo.store, &repo.config, input, chrono::Utc::now()).unwrap()
}

#[test]
fn test_inserted_line_relocates_citation() {
    let mut repo = TestRepoManager::new_temp();
    repo.write_file("x.txt", FIVE_LINES);
    let id = repo.cite("Second and third lines", "x.txt", 2, 3);

    repo.insert_lines_at_top("x.txt", &["line 0"]);

    let result = retrieve_all(&mut repo, "second third");
    assert_eq!(result.valid.len(), 1);
    let citation = &result.valid[0].citations[0];
    assert_eq!((citation.start_line, citation.end_line), (3, 4));
    assert_eq!(citation.status, Some(ValidationStatus::Relocated));
    assert_eq!(result.stats.relocated_count, 1);

    let persisted = repo.persisted(&id).unwrap();
    let citation = &persisted.citations[0];
    assert_eq!((citation.start_line, citation.end_line), (3, 4));
    assert_eq!(citation.last_validation_detail.as_deref(), Some(DETAIL_RELOCATED));

    // A second retrieval finds it in place
    let result = retrieve_all(&mut repo, "second third");
    assert_eq!(result.valid[0].citations[0].status, Some(ValidationStatus::Valid));
    assert_eq!(result.stats.relocated_count, 0);
}

#[test]
fn test_cosmetic_churn_stays_valid() {
    let mut repo = TestRepoManager::new_temp();
    repo.write_file("src/retry.rs", &TestDataFactory::rust_module());
    repo.cite("Retry limit", "src/retry.rs", 3, 4);

    let churned = TestDataFactory::rust_module()
        .lines()
        .map(|l| format!("{l}  \t\r\n"))
        .collect::<String>()
        + "\r\n\r\n";
    repo.write_file("src/retry.rs", &churned);

    let result = retrieve_all(&mut repo, "retry");
    assert_eq!(result.valid.len(), 1);
    let citation = &result.valid[0].citations[0];
    assert_eq!((citation.start_line, citation.end_line), (3, 4));
    assert_eq!(citation.status, Some(ValidationStatus::Valid));
}

#[test]
fn test_edit_inside_range_goes_stale() {
    let mut repo = TestRepoManager::new_temp();
    repo.write_file("src/retry.rs", &TestDataFactory::rust_module());
    let id = repo.cite("Retry limit", "src/retry.rs", 3, 3);

    repo.replace_line("src/retry.rs", 3, "pub const MAX_RETRIES: u32 = 5;");

    let result = retrieve_all(&mut repo, "retry");
    assert!(result.valid.is_empty());
    let stale = result.stale.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, id);
    assert_eq!(
        repo.persisted(&id).unwrap().stored_status(),
        ValidationStatus::Stale
    );
}

#[test]
fn test_duplicated_snippet_is_not_relocated() {
    let mut repo = TestRepoManager::new_temp();
    repo.write_file("a.txt", "alpha\nneedle one\nneedle two\nomega\n");
    repo.cite("Needle pair", "a.txt", 2, 3);

    repo.write_file(
        "a.txt",
        "start\nalpha\nneedle one\nneedle two\nmiddle\nneedle one\nneedle two\nomega\n",
    );

    let result = retrieve_all(&mut repo, "needle");
    assert!(result.valid.is_empty());
    assert_eq!(result.stats.stale_count, 1);
}

#[test]
fn test_deleted_file_is_missing() {
    let mut repo = TestRepoManager::new_temp();
    repo.write_file("gone.txt", FIVE_LINES);
    let id = repo.cite("Doomed file", "gone.txt", 1, 5);

    repo.remove_file("gone.txt");

    let result = retrieve_all(&mut repo, "doomed");
    assert!(result.valid.is_empty());
    assert_eq!(result.missing.unwrap()[0].id, id);
    let persisted = repo.persisted(&id).unwrap();
    assert_eq!(
        persisted.citations[0].last_validation_detail.as_deref(),
        Some("File no longer exists.")
    );
}

#[test]
fn test_multi_citation_memory_reports_worst_status() {
    let mut repo = TestRepoManager::new_temp();
    repo.write_file("a.txt", FIVE_LINES);
    repo.write_file("b.txt", &TestDataFactory::numbered_lines(20));
    let mut input = TestDataFactory::memory_input("Two files", "spans two files", "a.txt", 1, 2);
    input.citations.push(TestDataFactory::citation("b.txt", 10, 12));
    vrm_core::create_memory(&mut repo.store, &repo.config, input, chrono::Utc::now()).unwrap();

    repo.insert_lines_at_top("a.txt", &["new first line"]);
    repo.remove_file("b.txt");

    let result = retrieve_all(&mut repo, "files");
    let missing = result.missing.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].citations[0].status, Some(ValidationStatus::Relocated));
    assert_eq!(missing[0].citations[1].status, Some(ValidationStatus::Missing));
}
