use bit_refs::{RefKind, RefsError, normalize_name, normalize_name_oid};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;
use common::repo::{TestRepo, fixture_oid, random_branch_name, test_repo};

#[rstest]
fn create_direct_ref_writes_a_loose_file(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");

    let reference = test_repo
        .repo
        .refs()
        .create_oid("refs/heads/main", &oid, false)
        .unwrap();

    assert_eq!(reference.kind(), RefKind::Direct);
    assert_eq!(reference.oid(), Some(&oid));
    assert_eq!(test_repo.read_file("refs/heads/main"), format!("{oid}\n"));
}

#[rstest]
fn create_direct_ref_with_hierarchical_name(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let branch_name = "refs/heads/team/backend/feature/user-authentication";

    test_repo.repo.refs().create_oid(branch_name, &oid, false).unwrap();

    assert_eq!(test_repo.read_file(branch_name), format!("{oid}\n"));
}

#[rstest]
fn create_duplicate_ref_fails_without_force(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let name = random_branch_name();
    let refs = test_repo.repo.refs();

    refs.create_oid(&name, &oid, false).unwrap();

    let error = refs.create_oid(&name, &oid, false).unwrap_err();
    assert!(matches!(error, RefsError::AlreadyExists(_)));
}

#[rstest]
fn create_duplicate_ref_succeeds_with_force(test_repo: TestRepo) {
    let old = test_repo.store_blob("one\n");
    let new = test_repo.store_blob("two\n");
    let refs = test_repo.repo.refs();

    refs.create_oid("refs/heads/main", &old, false).unwrap();
    refs.create_oid("refs/heads/main", &new, true).unwrap();

    assert_eq!(test_repo.read_file("refs/heads/main"), format!("{new}\n"));
}

#[rstest]
fn create_direct_ref_verifies_the_target_exists(test_repo: TestRepo) {
    let error = test_repo
        .repo
        .refs()
        .create_oid("refs/heads/main", &fixture_oid('9'), false)
        .unwrap_err();

    assert!(matches!(error, RefsError::InvalidTarget { .. }));
}

#[rstest]
fn create_direct_ref_requires_a_refs_name(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");

    let error = test_repo.repo.refs().create_oid("main", &oid, false).unwrap_err();
    assert!(matches!(error, RefsError::InvalidName { .. }));
}

#[rstest]
#[case("refs/heads/foo..bar")]
#[case("refs/heads/foo.lock")]
#[case("refs/heads/.hidden")]
#[case("refs/heads/with space")]
#[case("refs/heads/star*name")]
#[case("refs/heads/ref@{1}")]
#[case("refs/heads/trailing.")]
#[case("refs/heads/trailing/")]
fn create_rejects_invalid_names(test_repo: TestRepo, #[case] name: &str) {
    let oid = test_repo.store_blob("one\n");

    let error = test_repo.repo.refs().create_oid(name, &oid, false).unwrap_err();
    assert!(matches!(error, RefsError::InvalidName { .. }));
}

#[rstest]
fn create_collapses_consecutive_slashes(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");

    let reference = test_repo
        .repo
        .refs()
        .create_oid("refs//heads///x", &oid, false)
        .unwrap();

    assert_eq!(reference.name().as_str(), "refs/heads/x");
    assert_eq!(test_repo.read_file("refs/heads/x"), format!("{oid}\n"));
}

#[rstest]
fn create_symbolic_ref_writes_the_header_format(test_repo: TestRepo) {
    let reference = test_repo
        .repo
        .refs()
        .create_symbolic("MERGE_HEAD", "refs/heads/feature", false)
        .unwrap();

    assert_eq!(reference.kind(), RefKind::Symbolic);
    assert_eq!(test_repo.read_file("MERGE_HEAD"), "ref: refs/heads/feature\n");
}

#[rstest]
fn create_symbolic_ref_rejects_an_invalid_target(test_repo: TestRepo) {
    let error = test_repo
        .repo
        .refs()
        .create_symbolic("HEAD", "refs/heads/bad..target", true)
        .unwrap_err();

    assert!(matches!(error, RefsError::InvalidTarget { .. }));
}

#[rstest]
fn creating_a_prefix_of_an_existing_ref_fails(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let refs = test_repo.repo.refs();

    refs.create_oid("refs/heads/a/b", &oid, false).unwrap();

    // refs/heads/a conflicts with refs/heads/a/b on the '/' boundary
    let error = refs.create_oid("refs/heads/a", &oid, false).unwrap_err();
    assert!(matches!(error, RefsError::AlreadyExists(_)));

    // after deleting the nested ref the name becomes usable
    let nested = refs.lookup("refs/heads/a/b").unwrap();
    refs.delete(nested).unwrap();
    refs.create_oid("refs/heads/a", &oid, true).unwrap();

    assert_eq!(test_repo.read_file("refs/heads/a"), format!("{oid}\n"));
}

#[rstest]
fn creating_under_an_existing_ref_fails(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let refs = test_repo.repo.refs();

    refs.create_oid("refs/heads/a", &oid, false).unwrap();

    let error = refs.create_oid("refs/heads/a/b", &oid, false).unwrap_err();
    assert!(matches!(error, RefsError::AlreadyExists(_)));
}

#[rstest]
fn set_oid_rewrites_the_loose_file(test_repo: TestRepo) {
    let old = test_repo.store_blob("one\n");
    let new = test_repo.store_blob("two\n");
    let refs = test_repo.repo.refs();

    let mut reference = refs.create_oid("refs/heads/main", &old, false).unwrap();
    refs.set_oid(&mut reference, new.clone()).unwrap();

    assert_eq!(reference.oid(), Some(&new));
    assert_eq!(test_repo.read_file("refs/heads/main"), format!("{new}\n"));
}

#[rstest]
fn set_oid_rejects_a_missing_target(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let refs = test_repo.repo.refs();

    let mut reference = refs.create_oid("refs/heads/main", &oid, false).unwrap();
    let error = refs.set_oid(&mut reference, fixture_oid('9')).unwrap_err();

    assert!(matches!(error, RefsError::InvalidTarget { .. }));
    // the file still holds the old value
    assert_eq!(test_repo.read_file("refs/heads/main"), format!("{oid}\n"));
}

#[rstest]
fn set_oid_requires_a_direct_ref(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let refs = test_repo.repo.refs();

    let mut head = refs.set_head("refs/heads/main").unwrap();
    let error = refs.set_oid(&mut head, oid).unwrap_err();

    assert!(matches!(error, RefsError::InvalidTarget { .. }));
}

#[rstest]
fn set_symbolic_target_rewrites_the_loose_file(test_repo: TestRepo) {
    let refs = test_repo.repo.refs();

    let mut head = refs.set_head("refs/heads/main").unwrap();
    refs.set_symbolic_target(&mut head, "refs/heads/trunk").unwrap();

    assert_eq!(test_repo.read_file("HEAD"), "ref: refs/heads/trunk\n");
}

#[rstest]
fn set_symbolic_target_requires_a_symbolic_ref(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let refs = test_repo.repo.refs();

    let mut reference = refs.create_oid("refs/heads/main", &oid, false).unwrap();
    let error = refs
        .set_symbolic_target(&mut reference, "refs/heads/other")
        .unwrap_err();

    assert!(matches!(error, RefsError::InvalidTarget { .. }));
}

#[rstest]
fn a_new_loose_file_shadows_the_packed_copy(test_repo: TestRepo) {
    let old = test_repo.store_blob("one\n");
    let new = test_repo.store_blob("two\n");
    let refs = test_repo.repo.refs();

    refs.create_oid("refs/heads/main", &old, false).unwrap();
    refs.pack_all().unwrap();

    let mut reference = refs.lookup("refs/heads/main").unwrap();
    assert!(reference.is_packed());

    refs.set_oid(&mut reference, new.clone()).unwrap();

    // the packed entry still exists but the loose file wins
    let packed_content = test_repo.read_file("packed-refs");
    assert!(packed_content.contains(&format!("{old} refs/heads/main")));
    assert_eq!(refs.lookup("refs/heads/main").unwrap().oid(), Some(&new));
}

#[test]
fn normalize_name_collapses_slashes() {
    assert_eq!(normalize_name("refs//heads///x").unwrap(), "refs/heads/x");
}

#[test]
fn normalize_name_oid_enforces_the_grammar() {
    assert!(matches!(
        normalize_name_oid("refs/heads/foo..bar").unwrap_err(),
        RefsError::InvalidName { .. }
    ));
    assert!(matches!(
        normalize_name_oid("refs/heads/foo.lock").unwrap_err(),
        RefsError::InvalidName { .. }
    ));
    assert_eq!(normalize_name_oid("HEAD").unwrap(), "HEAD");
}
