//! Reference data types and storage formats
//!
//! This module contains the building blocks of the reference backend:
//!
//! - `ref_name`: Name validation and normalization
//! - `reference`: The reference handle returned to callers
//! - `loose`: One-file-per-ref text format
//! - `packed`: The consolidated `packed-refs` format and its in-memory cache
//!
//! ## Reference Types
//!
//! - HEAD, MERGE_HEAD, FETCH_HEAD: Well-known refs at the repository root
//! - Branches: `refs/heads/*`
//! - Tags: `refs/tags/*` (annotated tags carry a cached peel OID when packed)
//! - Remotes: `refs/remotes/*`

pub mod loose;
pub mod packed;
pub mod ref_name;
pub mod reference;

use bitflags::bitflags;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Name of the MERGE_HEAD reference (present mid-merge)
pub const MERGE_HEAD_REF_NAME: &str = "MERGE_HEAD";

/// Name of the FETCH_HEAD reference
pub const FETCH_HEAD_REF_NAME: &str = "FETCH_HEAD";

/// Directory holding the loose reference tree
pub const REFS_DIR: &str = "refs";

/// Name prefix shared by all non-root references
pub const REFS_PREFIX: &str = "refs/";

/// Name prefix of branch references
pub const REFS_HEADS_PREFIX: &str = "refs/heads/";

/// Name prefix of tag references
pub const REFS_TAGS_PREFIX: &str = "refs/tags/";

/// Name prefix of remote-tracking references
pub const REFS_REMOTES_PREFIX: &str = "refs/remotes/";

/// Name of the consolidated packed reference file
pub const PACKED_REFS_FILE: &str = "packed-refs";

/// Header line emitted at the top of packed-refs (trailing space included)
pub const PACKED_REFS_HEADER: &str = "# pack-refs with: peeled ";

/// Prefix marking a loose reference file as symbolic
pub const SYMREF_PREFIX: &str = "ref: ";

/// Upper bound on symbolic resolution depth
pub const MAX_NESTING_LEVEL: usize = 5;

/// Upper bound on a normalized reference name, in bytes
pub const MAX_REF_NAME_LENGTH: usize = 1024;

/// Kind of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Targets an object ID
    Direct,
    /// Targets another reference by name
    Symbolic,
}

bitflags! {
    /// Filter flags for reference enumeration
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ListFlags: u8 {
        /// Include direct references
        const OID = 1;
        /// Include symbolic references
        const SYMBOLIC = 2;
        /// Include references from the packed file
        const PACKED = 4;
        /// Include everything
        const LISTALL = Self::OID.bits() | Self::SYMBOLIC.bits() | Self::PACKED.bits();
    }
}

impl RefKind {
    /// The enumeration flag bit matching this kind
    pub(crate) fn as_list_flag(self) -> ListFlags {
        match self {
            RefKind::Direct => ListFlags::OID,
            RefKind::Symbolic => ListFlags::SYMBOLIC,
        }
    }
}
