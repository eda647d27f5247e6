//! Reference handles
//!
//! A [`Reference`] is the value returned to callers by the unified API. It
//! is a snapshot: the canonical name, the target (an OID or another ref
//! name), whether the bytes came from the packed file, and the modification
//! time of the source when it was read. Handles never borrow the
//! repository; every operation takes the repository through the
//! [`Refs`](crate::areas::refs::Refs) view instead.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::RefKind;
use crate::artifacts::refs::ref_name::RefName;
use std::time::SystemTime;

/// Target of a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// An immutable object identifier
    Direct(ObjectId),
    /// The name of another reference
    Symbolic(RefName),
}

impl RefTarget {
    pub fn kind(&self) -> RefKind {
        match self {
            RefTarget::Direct(_) => RefKind::Direct,
            RefTarget::Symbolic(_) => RefKind::Symbolic,
        }
    }
}

/// A named reference, as read from one of the two stores
#[derive(Debug, Clone)]
pub struct Reference {
    /// Canonical (normalized) name
    name: RefName,
    /// What the reference points at
    target: RefTarget,
    /// True when the bytes came from the packed file
    packed: bool,
    /// Modification time of the source when last read
    mtime: Option<SystemTime>,
}

impl Reference {
    pub(crate) fn new(
        name: RefName,
        target: RefTarget,
        packed: bool,
        mtime: Option<SystemTime>,
    ) -> Self {
        Reference {
            name,
            target,
            packed,
            mtime,
        }
    }

    pub fn name(&self) -> &RefName {
        &self.name
    }

    pub fn kind(&self) -> RefKind {
        self.target.kind()
    }

    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    /// The target OID, for direct references
    pub fn oid(&self) -> Option<&ObjectId> {
        match &self.target {
            RefTarget::Direct(oid) => Some(oid),
            RefTarget::Symbolic(_) => None,
        }
    }

    /// The target name, for symbolic references
    pub fn symbolic_target(&self) -> Option<&RefName> {
        match &self.target {
            RefTarget::Direct(_) => None,
            RefTarget::Symbolic(target) => Some(target),
        }
    }

    /// True when the reference was read from the packed file
    pub fn is_packed(&self) -> bool {
        self.packed
    }

    pub(crate) fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    pub(crate) fn set_name(&mut self, name: RefName) {
        self.name = name;
    }

    pub(crate) fn set_target(&mut self, target: RefTarget) {
        self.target = target;
    }

    pub(crate) fn set_packed(&mut self, packed: bool) {
        self.packed = packed;
    }

    pub(crate) fn set_mtime(&mut self, mtime: Option<SystemTime>) {
        self.mtime = mtime;
    }
}
