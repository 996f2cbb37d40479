//! Loading fixture files from disk.

use std::fs;

use pretty_assertions::assert_eq;

use r_builtin_oracle::{CasePolicy, IgnoredReason, Registry};

#[test]
fn test_load_dir_sorts_files_by_name() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("b_second.R"),
        "## case: second\n2L\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("a_first.R"),
        "## case: first\n1L\n## case: first.bis\n1L\n",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not a fixture").unwrap();

    let registry = Registry::load_dir(dir.path()).unwrap();
    let names: Vec<&str> = registry.cases().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["first", "first.bis", "second"]);
}

#[test]
fn test_load_dir_reads_policies() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("cases.R"),
        "## case: flaky\n## policy: Ignored.ImplementationError\n1L\n",
    )
    .unwrap();

    let registry = Registry::load_dir(dir.path()).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.cases()[0].policy,
        CasePolicy::Ignored(IgnoredReason::ImplementationError)
    );
}

#[test]
fn test_duplicate_names_across_files_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.R"), "## case: same\n1L\n").unwrap();
    fs::write(dir.path().join("b.R"), "## case: same\n2L\n").unwrap();

    assert!(Registry::load_dir(dir.path()).is_err());
}

#[test]
fn test_missing_dir_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(Registry::load_dir(&missing).is_err());
}
