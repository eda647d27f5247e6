use assert_fs::TempDir;
use bit_refs::artifacts::objects::blob::Blob;
use bit_refs::artifacts::objects::tag::Tag;
use bit_refs::{ObjectId, ObjectType, Repository};
use fake::Fake;
use fake::faker::lorem::en::Word;
use rstest::fixture;
use std::path::PathBuf;

/// A repository rooted inside a temp dir that lives as long as the test
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Absolute path of a repository-relative file
    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.repo.path().join(relative)
    }

    /// Read a repository-relative file as a string
    pub fn read_file(&self, relative: &str) -> String {
        std::fs::read_to_string(self.file_path(relative)).expect("failed to read file")
    }

    /// Write a repository-relative file, creating parent directories
    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.file_path(relative);
        std::fs::create_dir_all(path.parent().expect("file has no parent"))
            .expect("failed to create parent directories");
        std::fs::write(path, content).expect("failed to write file");
    }

    /// Store a blob with the given content, returning its OID
    pub fn store_blob(&self, content: &str) -> ObjectId {
        self.repo
            .database()
            .store(&Blob::new(content.to_string().into()))
            .expect("failed to store blob")
    }

    /// Store an annotated tag wrapping `target`, returning the tag's OID
    pub fn store_tag(&self, target: &ObjectId, name: &str) -> ObjectId {
        let tag = Tag::new(
            target.clone(),
            ObjectType::Blob,
            name.to_string(),
            "A Tagger <tagger@example.com> 1700000000 +0000".to_string(),
            format!("tag {name}\n"),
        );
        self.repo.database().store(&tag).expect("failed to store tag")
    }
}

#[fixture]
pub fn test_repo() -> TestRepo {
    let dir = TempDir::new().expect("failed to create temp dir");
    let repo = Repository::init(dir.path().join("repo")).expect("failed to init repository");
    TestRepo { dir, repo }
}

/// An OID made of a single repeated hex digit, for fixture files
pub fn fixture_oid(digit: char) -> ObjectId {
    ObjectId::try_parse(&digit.to_string().repeat(40)).expect("invalid fixture oid")
}

/// A random valid branch name
pub fn random_branch_name() -> String {
    format!("refs/heads/{}", Word().fake::<String>())
}
