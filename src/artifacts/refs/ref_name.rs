//! Reference name validation and normalization
//!
//! A reference name is a `/`-separated path-like string. Validation follows
//! git-style conventions to prevent ambiguity and filesystem issues:
//!
//! - Must be non-empty
//! - Must not contain bytes <= 0x20, nor `~`, `^`, `:`, `\`, `?`, `[`, `*`
//! - Must not start with `.` or `/`; components must not start with `.`
//! - Must not contain `..` or `@{`
//! - Must not end with `.` or `/`, nor with the suffix `.lock`
//!
//! Normalization additionally collapses consecutive slashes, so
//! `refs//heads///x` becomes `refs/heads/x`. Names intended to hold an OID
//! (branches, tags) must live under `refs/` or be one of the well-known
//! roots (`HEAD`, `MERGE_HEAD`, `FETCH_HEAD`).

use crate::artifacts::refs::{
    FETCH_HEAD_REF_NAME, HEAD_REF_NAME, MAX_REF_NAME_LENGTH, MERGE_HEAD_REF_NAME, REFS_PREFIX,
    REFS_TAGS_PREFIX,
};
use crate::errors::{RefsError, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Regex pattern for invalid constructs in a reference name
const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\.$|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^]";

static INVALID_REF_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(INVALID_REF_NAME_REGEX).expect("invalid ref name pattern"));

/// A validated, normalized reference name
///
/// Construction goes through [`RefName::try_parse`] (symbolic-capable names)
/// or [`RefName::try_parse_oid`] (names that must be able to hold an OID),
/// so a `RefName` value always satisfies the naming grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    /// Validate and normalize a name that may refer to anything
    ///
    /// # Returns
    ///
    /// The normalized name, or *invalid-name* when the grammar is violated
    pub fn try_parse(name: &str) -> Result<Self> {
        Self::normalize(name, false)
    }

    /// Validate and normalize a name that must be able to hold an OID
    ///
    /// Identical to [`RefName::try_parse`] plus the root rule: the name must
    /// live under `refs/`, or be exactly `HEAD`, `MERGE_HEAD` or
    /// `FETCH_HEAD`.
    pub fn try_parse_oid(name: &str) -> Result<Self> {
        Self::normalize(name, true)
    }

    /// Wrap an already-normalized name without re-validating
    ///
    /// Used when reading trusted on-disk state: symbolic targets are
    /// validated on set, not on every read.
    pub(crate) fn new_unchecked(name: String) -> Self {
        RefName(name)
    }

    fn normalize(name: &str, oid_ref: bool) -> Result<Self> {
        if name.is_empty() {
            return Err(RefsError::invalid_name(name, "name is empty"));
        }

        if INVALID_REF_NAME_PATTERN.is_match(name) {
            return Err(RefsError::invalid_name(
                name,
                "name contains an invalid character or sequence",
            ));
        }

        // collapse consecutive slashes; every other rule leaves the input
        // byte-for-byte intact
        let mut normalized = String::with_capacity(name.len());
        let mut previous = '\0';
        for current in name.chars() {
            if current == '/' && previous == '/' {
                continue;
            }
            normalized.push(current);
            previous = current;
        }

        if normalized.len() >= MAX_REF_NAME_LENGTH {
            return Err(RefsError::invalid_name(name, "name is too long"));
        }

        if oid_ref && !normalized.starts_with(REFS_PREFIX) && !is_well_known_root(&normalized) {
            return Err(RefsError::invalid_name(
                name,
                "name does not start with 'refs/'",
            ));
        }

        Ok(RefName(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for references under `refs/tags/`
    pub fn is_tag(&self) -> bool {
        self.0.starts_with(REFS_TAGS_PREFIX)
    }

    /// The repository-root-relative filesystem path of this reference
    pub fn to_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

/// True for the loose refs that live at the repository root
pub fn is_well_known_root(name: &str) -> bool {
    name == HEAD_REF_NAME || name == MERGE_HEAD_REF_NAME || name == FETCH_HEAD_REF_NAME
}

/// Validate and normalize a reference name
///
/// Exported helper for callers that need validation without constructing a
/// reference.
pub fn normalize_name(name: &str) -> Result<String> {
    RefName::try_parse(name).map(|n| n.0)
}

/// Validate and normalize a reference name that must be able to hold an OID
pub fn normalize_name_oid(name: &str) -> Result<String> {
    RefName::try_parse_oid(name).map(|n| n.0)
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
