//! Repository abstraction and coordination
//!
//! This module provides the `Repository` type that owns the on-disk layout
//! and the shared state of the reference backend. It acts as a facade over
//! the lower-level areas (object database, reflog) and hands out the
//! unified reference API through [`Repository::refs`].
//!
//! ## Architecture
//!
//! The repository maintains:
//! - Database: Object storage used to verify ref targets and peel tags
//! - Reflog: Log file maintenance for renamed references
//! - RefCache: The in-memory view of the `packed-refs` file
//!
//! ## Shared State
//!
//! The packed-ref cache is wrapped in `RefCell`: the backend is
//! single-threaded at the API level and the cache is only ever replaced
//! wholesale, never handed out by reference across calls.

use crate::areas::database::Database;
use crate::areas::reflog::Reflog;
use crate::areas::refs::Refs;
use crate::artifacts::refs::packed::RefCache;
use crate::artifacts::refs::ref_name::RefName;
use crate::artifacts::refs::{HEAD_REF_NAME, PACKED_REFS_FILE, REFS_DIR};
use crate::errors::Result;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Object database directory name
const DATABASE_DIR: &str = "objects";

/// Reference log directory name
const LOGS_DIR: &str = "logs";

/// Branch that a freshly initialized HEAD points at
const DEFAULT_BRANCH_REF: &str = "refs/heads/main";

/// An open repository
///
/// Coordinates the storage areas and provides access to the reference API.
///
/// ## Usage
///
/// ```ignore
/// let repo = Repository::init(PathBuf::from("repo"))?;
/// let refs = repo.refs();
/// refs.create_oid("refs/heads/main", &oid, false)?;
/// ```
pub struct Repository {
    /// Repository root path
    path: Box<Path>,
    /// Object database
    database: Database,
    /// Reference log manager
    reflog: Reflog,
    /// In-memory view of the packed-refs file (lazy)
    ref_cache: RefCell<RefCache>,
}

impl Repository {
    /// Open an existing repository rooted at `path`
    pub fn open(path: PathBuf) -> Result<Self> {
        let path = path.canonicalize()?;

        Ok(Repository {
            database: Database::new(path.join(DATABASE_DIR).into_boxed_path()),
            reflog: Reflog::new(path.join(LOGS_DIR).into_boxed_path()),
            ref_cache: RefCell::new(RefCache::new()),
            path: path.into_boxed_path(),
        })
    }

    /// Create the repository skeleton at `path` and open it
    ///
    /// Creates the `refs/heads`, `refs/tags`, `objects` and `logs`
    /// directories and, unless one exists already, a `HEAD` symbolic ref
    /// pointing at the default branch.
    pub fn init(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let repository = Self::open(path)?;

        std::fs::create_dir_all(repository.path.join(REFS_DIR).join("heads"))?;
        std::fs::create_dir_all(repository.path.join(REFS_DIR).join("tags"))?;
        std::fs::create_dir_all(repository.database.objects_path())?;
        std::fs::create_dir_all(repository.path.join(LOGS_DIR))?;

        if !repository.path.join(HEAD_REF_NAME).exists() {
            repository.refs().set_head(DEFAULT_BRANCH_REF)?;
        }

        Ok(repository)
    }

    /// Repository root path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The object database
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The reference log manager
    pub fn reflog(&self) -> &Reflog {
        &self.reflog
    }

    /// The unified reference API, bound to this repository
    pub fn refs(&self) -> Refs<'_> {
        Refs::new(self)
    }

    pub(crate) fn ref_cache(&self) -> &RefCell<RefCache> {
        &self.ref_cache
    }

    /// Root of the loose reference tree
    pub(crate) fn refs_dir(&self) -> PathBuf {
        self.path.join(REFS_DIR)
    }

    /// Path of the packed-refs file
    pub(crate) fn packed_refs_path(&self) -> PathBuf {
        self.path.join(PACKED_REFS_FILE)
    }

    /// Filesystem path of a reference
    pub(crate) fn ref_path(&self, name: &RefName) -> PathBuf {
        self.path.join(name.to_path())
    }

    /// Filesystem path of a reference given by plain name
    pub(crate) fn ref_path_str(&self, name: &str) -> PathBuf {
        self.path.join(name.split('/').collect::<PathBuf>())
    }
}
