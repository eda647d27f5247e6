//! Packed reference file format and in-memory cache
//!
//! The `packed-refs` file consolidates many references into one text file:
//!
//! ```text
//! # pack-refs with: peeled
//! 1111111111111111111111111111111111111111 refs/heads/dev
//! 2222222222222222222222222222222222222222 refs/tags/v1
//! ^3333333333333333333333333333333333333333
//! ```
//!
//! Comment lines are only legal at the top. A `^` peel line carries the
//! resolved target of an annotated tag and is only legal immediately after
//! a `refs/tags/` entry. The writer emits entries sorted by name so two
//! writes of the same cache produce byte-identical files.
//!
//! The [`RefCache`] holds the parsed entries together with the file mtime
//! observed at parse time; it is replaced wholesale on refresh, never
//! partially mutated.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::{PACKED_REFS_HEADER, REFS_TAGS_PREFIX};
use crate::errors::{RefsError, Result};
use std::collections::HashMap;
use std::time::SystemTime;

/// A single entry of the packed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedEntry {
    /// Target object ID
    pub(crate) oid: ObjectId,
    /// Cached peel target, for annotated tags
    pub(crate) peel: Option<ObjectId>,
    /// True when the entry was folded in from a loose file and the loose
    /// file has not been swept yet
    pub(crate) was_loose: bool,
}

impl PackedEntry {
    pub(crate) fn new(oid: ObjectId) -> Self {
        PackedEntry {
            oid,
            peel: None,
            was_loose: false,
        }
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn peel(&self) -> Option<&ObjectId> {
        self.peel.as_ref()
    }

    pub(crate) fn set_peel(&mut self, peel: ObjectId) {
        self.peel = Some(peel);
    }

    pub(crate) fn was_loose(&self) -> bool {
        self.was_loose
    }
}

/// In-memory view of the packed file
///
/// Owned by the repository and shared by all operations on it. `loaded`
/// distinguishes the lazy pre-first-use state from a loaded-but-empty one
/// (packed file absent).
#[derive(Debug, Default)]
pub struct RefCache {
    entries: HashMap<String, PackedEntry>,
    mtime: Option<SystemTime>,
    loaded: bool,
}

impl RefCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mtime to hand to the freshness check; `None` forces a re-read
    pub(crate) fn last_mtime(&self) -> Option<SystemTime> {
        if self.loaded { self.mtime } else { None }
    }

    /// The mtime of the file backing the current entries
    pub(crate) fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    pub(crate) fn set_mtime(&mut self, mtime: Option<SystemTime>) {
        self.mtime = mtime;
    }

    /// Record that the packed file does not exist
    pub(crate) fn clear_absent(&mut self) {
        self.entries.clear();
        self.mtime = None;
        self.loaded = true;
    }

    /// Drop all state after a parse failure; the next access re-reads
    pub(crate) fn invalidate(&mut self) {
        self.entries.clear();
        self.mtime = None;
        self.loaded = false;
    }

    /// Atomically replace the whole mapping
    pub(crate) fn replace(&mut self, entries: HashMap<String, PackedEntry>, mtime: SystemTime) {
        self.entries = entries;
        self.mtime = Some(mtime);
        self.loaded = true;
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&PackedEntry> {
        self.entries.get(name)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<PackedEntry> {
        self.entries.remove(name)
    }

    /// Fold a loose reference in, replacing any packed entry of the same name
    pub(crate) fn insert_loose(&mut self, name: String, oid: ObjectId) {
        self.entries.insert(
            name,
            PackedEntry {
                oid,
                peel: None,
                was_loose: true,
            },
        );
    }

    pub(crate) fn entries(&self) -> &HashMap<String, PackedEntry> {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut HashMap<String, PackedEntry> {
        &mut self.entries
    }

    /// Forget sweep bookkeeping once the folded loose files are gone
    pub(crate) fn clear_was_loose(&mut self) {
        for entry in self.entries.values_mut() {
            entry.was_loose = false;
        }
    }

    /// All names, sorted byte-wise
    pub(crate) fn names_sorted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Parse the content of a packed-refs file into a fresh mapping
pub fn parse(content: &[u8]) -> Result<HashMap<String, PackedEntry>> {
    let mut rest = content;

    // leading comment lines
    while rest.first() == Some(&b'#') {
        let eol = rest
            .iter()
            .position(|&byte| byte == b'\n')
            .ok_or_else(|| RefsError::PackedRefsCorrupt("unterminated comment line".to_string()))?;
        rest = &rest[eol + 1..];
    }

    let mut entries = HashMap::new();

    while !rest.is_empty() {
        let (name, oid, remainder) = parse_ref_line(rest)?;
        let mut entry = PackedEntry::new(oid);
        rest = remainder;

        if rest.first() == Some(&b'^') {
            if !name.starts_with(REFS_TAGS_PREFIX) {
                return Err(RefsError::PackedRefsCorrupt(format!(
                    "peel line after non-tag reference '{name}'"
                )));
            }

            let (peel, remainder) = parse_peel_line(rest)?;
            entry.peel = Some(peel);
            rest = remainder;
        }

        entries.insert(name, entry);
    }

    Ok(entries)
}

/// Parse one `<oid> <name>\n` line, returning the unconsumed remainder
fn parse_ref_line(buffer: &[u8]) -> Result<(String, ObjectId, &[u8])> {
    if buffer.len() <= OBJECT_ID_LENGTH + 1 {
        return Err(RefsError::PackedRefsCorrupt(
            "truncated reference line".to_string(),
        ));
    }

    if buffer[OBJECT_ID_LENGTH] != b' ' {
        return Err(RefsError::PackedRefsCorrupt(
            "missing space after object id".to_string(),
        ));
    }

    let oid = parse_hex(&buffer[..OBJECT_ID_LENGTH])?;

    let name_region = &buffer[OBJECT_ID_LENGTH + 1..];
    let eol = name_region
        .iter()
        .position(|&byte| byte == b'\n')
        .ok_or_else(|| RefsError::PackedRefsCorrupt("missing EOL".to_string()))?;

    let mut name_bytes = &name_region[..eol];
    if name_bytes.last() == Some(&b'\r') {
        name_bytes = &name_bytes[..name_bytes.len() - 1];
    }

    let name = std::str::from_utf8(name_bytes)
        .map_err(|_| RefsError::PackedRefsCorrupt("reference name is not valid UTF-8".to_string()))?
        .to_string();

    Ok((name, oid, &name_region[eol + 1..]))
}

/// Parse one `^<oid>\n` peel line, returning the unconsumed remainder
fn parse_peel_line(buffer: &[u8]) -> Result<(ObjectId, &[u8])> {
    // caller checked for the leading '^'
    let rest = &buffer[1..];

    if rest.len() <= OBJECT_ID_LENGTH {
        return Err(RefsError::PackedRefsCorrupt(
            "truncated peel line".to_string(),
        ));
    }

    let oid = parse_hex(&rest[..OBJECT_ID_LENGTH])?;

    let mut eol = OBJECT_ID_LENGTH;
    if rest[eol] == b'\r' {
        eol += 1;
    }

    if rest.get(eol) != Some(&b'\n') {
        return Err(RefsError::PackedRefsCorrupt(
            "peel line not terminated correctly".to_string(),
        ));
    }

    Ok((oid, &rest[eol + 1..]))
}

fn parse_hex(bytes: &[u8]) -> Result<ObjectId> {
    let hex = std::str::from_utf8(bytes)
        .map_err(|_| RefsError::PackedRefsCorrupt("invalid object id".to_string()))?;

    ObjectId::try_parse(hex)
        .map_err(|_| RefsError::PackedRefsCorrupt(format!("invalid object id '{hex}'")))
}

/// Serialize entries to packed-refs file content
///
/// Entries are written sorted by name so output is deterministic.
pub fn serialize(entries: &HashMap<String, PackedEntry>) -> Vec<u8> {
    let mut names: Vec<&String> = entries.keys().collect();
    names.sort();

    let mut content = format!("{PACKED_REFS_HEADER}\n");
    for name in names {
        let entry = &entries[name];
        content.push_str(&format!("{} {}\n", entry.oid, name));

        if let Some(peel) = &entry.peel {
            content.push_str(&format!("^{peel}\n"));
        }
    }

    content.into_bytes()
}
