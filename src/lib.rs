//! Reference storage for the bit version control system
//!
//! This crate implements the reference backend: named, human-readable
//! handles (branches, tags, HEAD) resolving to object IDs or to other
//! references. Two on-disk representations coexist and are presented as one
//! logical namespace:
//!
//! - Loose: one text file per reference under `refs/…` or at the
//!   repository root
//! - Packed: a consolidated `packed-refs` text file, cached in memory with
//!   mtime-based revalidation
//!
//! ## Modules
//!
//! - `areas`: Storage managers (repository facade, object database, the
//!   unified reference API, reflog maintenance)
//! - `artifacts`: Data types and formats (names, handles, loose and packed
//!   file formats, filesystem utilities)
//! - `errors`: The error taxonomy
//!
//! ## Usage
//!
//! ```ignore
//! let repository = Repository::init(PathBuf::from("repo"))?;
//! let refs = repository.refs();
//!
//! refs.create_oid("refs/heads/main", &oid, false)?;
//! refs.create_symbolic("HEAD", "refs/heads/main", true)?;
//!
//! let head = refs.resolve(&refs.head()?)?;
//! assert_eq!(head.oid(), Some(&oid));
//! ```

pub mod areas;
pub mod artifacts;
pub mod errors;

pub use areas::database::Database;
pub use areas::reflog::Reflog;
pub use areas::refs::Refs;
pub use areas::repository::Repository;
pub use artifacts::objects::object_id::ObjectId;
pub use artifacts::objects::object_type::ObjectType;
pub use artifacts::refs::ref_name::{RefName, normalize_name, normalize_name_oid};
pub use artifacts::refs::reference::{RefTarget, Reference};
pub use artifacts::refs::{ListFlags, MAX_NESTING_LEVEL, RefKind};
pub use errors::{RefsError, Result};
