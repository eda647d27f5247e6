use bit_refs::{RefKind, RefsError};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;
use common::repo::{TestRepo, test_repo};

/// Create a chain of `links` symbolic refs ending in a direct ref, and
/// return the name of the first link
fn symbolic_chain(test_repo: &TestRepo, links: usize) -> String {
    let oid = test_repo.store_blob("terminal\n");
    let refs = test_repo.repo.refs();

    refs.create_oid("refs/heads/terminal", &oid, false).unwrap();

    let mut target = "refs/heads/terminal".to_string();
    for level in (1..=links).rev() {
        let name = format!("refs/heads/link-{level}");
        refs.create_symbolic(&name, &target, false).unwrap();
        target = name;
    }

    target
}

#[rstest]
fn resolves_a_single_symbolic_hop(test_repo: TestRepo) {
    let first = symbolic_chain(&test_repo, 1);
    let refs = test_repo.repo.refs();

    let reference = refs.lookup(&first).unwrap();
    let resolved = refs.resolve(&reference).unwrap();

    assert_eq!(resolved.kind(), RefKind::Direct);
    assert_eq!(resolved.name().as_str(), "refs/heads/terminal");
}

#[rstest]
fn resolves_a_chain_at_the_nesting_bound(test_repo: TestRepo) {
    let first = symbolic_chain(&test_repo, 5);
    let refs = test_repo.repo.refs();

    let reference = refs.lookup(&first).unwrap();
    let resolved = refs.resolve(&reference).unwrap();

    assert_eq!(resolved.kind(), RefKind::Direct);
    assert_eq!(resolved.name().as_str(), "refs/heads/terminal");
}

#[rstest]
fn rejects_a_chain_beyond_the_nesting_bound(test_repo: TestRepo) {
    let first = symbolic_chain(&test_repo, 6);
    let refs = test_repo.repo.refs();

    let reference = refs.lookup(&first).unwrap();
    let error = refs.resolve(&reference).unwrap_err();

    assert!(matches!(error, RefsError::TooNested(_)));
}

#[rstest]
fn rejects_a_symbolic_cycle(test_repo: TestRepo) {
    let refs = test_repo.repo.refs();

    refs.create_symbolic("refs/heads/ouro", "refs/heads/boros", false).unwrap();
    refs.create_symbolic("refs/heads/boros", "refs/heads/ouro", false).unwrap();

    let reference = refs.lookup("refs/heads/ouro").unwrap();
    let error = refs.resolve(&reference).unwrap_err();

    assert!(matches!(error, RefsError::TooNested(_)));
}

#[rstest]
fn resolving_a_direct_ref_returns_a_fresh_copy(test_repo: TestRepo) {
    let old = test_repo.store_blob("one\n");
    let new = test_repo.store_blob("two\n");
    let refs = test_repo.repo.refs();

    let reference = refs.create_oid("refs/heads/main", &old, false).unwrap();

    // an external writer moves the branch under us
    test_repo.write_file("refs/heads/main", &format!("{new}\n"));

    let resolved = refs.resolve(&reference).unwrap();
    assert_eq!(resolved.oid(), Some(&new));
}

#[rstest]
fn resolving_a_dangling_symbolic_ref_is_not_found(test_repo: TestRepo) {
    let refs = test_repo.repo.refs();

    let head = refs.set_head("refs/heads/unborn").unwrap();
    let error = refs.resolve(&head).unwrap_err();

    assert!(matches!(error, RefsError::NotFound(_)));
}

#[rstest]
fn reload_picks_up_an_external_change(test_repo: TestRepo) {
    let old = test_repo.store_blob("one\n");
    let new = test_repo.store_blob("two\n");
    let refs = test_repo.repo.refs();

    let mut reference = refs.create_oid("refs/heads/main", &old, false).unwrap();

    test_repo.write_file("refs/heads/main", &format!("{new}\n"));
    refs.reload(&mut reference).unwrap();

    assert_eq!(reference.oid(), Some(&new));
}

#[rstest]
fn reload_follows_a_ref_into_the_packed_store(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let refs = test_repo.repo.refs();

    let mut reference = refs.create_oid("refs/heads/main", &oid, false).unwrap();
    refs.pack_all().unwrap();

    refs.reload(&mut reference).unwrap();

    assert!(reference.is_packed());
    assert_eq!(reference.oid(), Some(&oid));
}

#[rstest]
fn reload_of_a_deleted_ref_is_not_found(test_repo: TestRepo) {
    let oid = test_repo.store_blob("one\n");
    let refs = test_repo.repo.refs();

    let mut reference = refs.create_oid("refs/heads/main", &oid, false).unwrap();
    std::fs::remove_file(test_repo.file_path("refs/heads/main")).unwrap();

    let error = refs.reload(&mut reference).unwrap_err();
    assert!(matches!(error, RefsError::NotFound(_)));
}
