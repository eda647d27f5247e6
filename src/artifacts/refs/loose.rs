//! Loose reference file format
//!
//! A loose reference is a small text file at the repository-root-relative
//! path that its name encodes. The content is one of:
//!
//! - Direct: 40 hex characters, then `\n`
//! - Symbolic: `ref: <target>`, then `\n`
//!
//! A `\r` before the `\n` is tolerated on read and never emitted on write.
//! Bytes after the terminating newline are ignored, matching the historical
//! readers of this format.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::{RefKind, SYMREF_PREFIX};
use crate::artifacts::refs::ref_name::RefName;
use crate::artifacts::refs::reference::RefTarget;
use crate::errors::{RefsError, Result};
use std::path::Path;

/// Parse a loose reference file's content
///
/// # Arguments
///
/// * `name` - Reference name, for error reporting
/// * `content` - Raw file content
pub fn parse(name: &str, content: &[u8]) -> Result<RefTarget> {
    if content.starts_with(SYMREF_PREFIX.as_bytes()) {
        parse_symbolic(name, content).map(RefTarget::Symbolic)
    } else {
        parse_oid(name, content).map(RefTarget::Direct)
    }
}

/// Parse the target name out of a symbolic reference file
///
/// The caller has already checked for the `ref: ` header.
pub fn parse_symbolic(name: &str, content: &[u8]) -> Result<RefName> {
    let header_len = SYMREF_PREFIX.len();

    if content.len() < header_len + 1 {
        return Err(RefsError::corrupted_loose(name, "file too short"));
    }

    let rest = &content[header_len..];
    let eol = rest
        .iter()
        .position(|&byte| byte == b'\n')
        .ok_or_else(|| RefsError::corrupted_loose(name, "missing EOL"))?;

    let mut target = &rest[..eol];
    if target.last() == Some(&b'\r') {
        target = &target[..target.len() - 1];
    }

    let target = std::str::from_utf8(target)
        .map_err(|_| RefsError::corrupted_loose(name, "target is not valid UTF-8"))?;

    // targets are validated on set, not on every read
    Ok(RefName::new_unchecked(target.to_string()))
}

/// Parse the OID out of a direct reference file
pub fn parse_oid(name: &str, content: &[u8]) -> Result<ObjectId> {
    // File format: 40 chars (OID) + newline
    if content.len() < OBJECT_ID_LENGTH + 1 {
        return Err(RefsError::corrupted_loose(name, "file too short"));
    }

    let hex = std::str::from_utf8(&content[..OBJECT_ID_LENGTH])
        .map_err(|_| RefsError::corrupted_loose(name, "invalid object id"))?;
    let oid = ObjectId::try_parse(hex)
        .map_err(|_| RefsError::corrupted_loose(name, "invalid object id"))?;

    let mut eol = OBJECT_ID_LENGTH;
    if content[eol] == b'\r' {
        eol += 1;
    }

    if content.get(eol) != Some(&b'\n') {
        return Err(RefsError::corrupted_loose(name, "missing EOL"));
    }

    Ok(oid)
}

/// Serialize a reference target to loose file content
pub fn serialize(target: &RefTarget) -> Vec<u8> {
    match target {
        RefTarget::Direct(oid) => format!("{oid}\n").into_bytes(),
        RefTarget::Symbolic(name) => format!("{SYMREF_PREFIX}{name}\n").into_bytes(),
    }
}

/// Guess the kind of a loose reference from its first bytes
///
/// Used by filtered enumeration to avoid full-parse costs. An absent or
/// unreadable file yields `None`.
pub fn sniff_kind(path: &Path) -> Option<RefKind> {
    let content = std::fs::read(path).ok()?;

    if content.starts_with(SYMREF_PREFIX.as_bytes()) {
        Some(RefKind::Symbolic)
    } else {
        Some(RefKind::Direct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::proptest;

    #[test]
    fn parses_a_direct_reference() {
        let content = format!("{}\n", "a".repeat(40));
        let target = parse("refs/heads/main", content.as_bytes()).unwrap();

        assert_eq!(
            target,
            RefTarget::Direct(ObjectId::try_parse(&"a".repeat(40)).unwrap())
        );
    }

    #[test]
    fn parses_a_direct_reference_with_crlf() {
        let content = format!("{}\r\n", "b".repeat(40));
        let target = parse("refs/heads/main", content.as_bytes()).unwrap();

        assert_eq!(
            target,
            RefTarget::Direct(ObjectId::try_parse(&"b".repeat(40)).unwrap())
        );
    }

    #[test]
    fn parses_a_symbolic_reference() {
        let target = parse("HEAD", b"ref: refs/heads/main\n").unwrap();

        assert_eq!(
            target,
            RefTarget::Symbolic(RefName::try_parse("refs/heads/main").unwrap())
        );
    }

    #[test]
    fn parses_a_symbolic_reference_with_crlf() {
        let target = parse("HEAD", b"ref: refs/heads/main\r\n").unwrap();

        assert_eq!(
            target,
            RefTarget::Symbolic(RefName::try_parse("refs/heads/main").unwrap())
        );
    }

    #[test]
    fn ignores_bytes_after_the_newline() {
        let content = format!("{}\ntrailing garbage", "a".repeat(40));
        assert!(parse("refs/heads/main", content.as_bytes()).is_ok());
    }

    #[test]
    fn rejects_a_short_direct_reference() {
        let content = "a".repeat(40);
        let error = parse("refs/heads/main", content.as_bytes()).unwrap_err();
        assert!(matches!(error, RefsError::CorruptedLoose { .. }));
    }

    #[test]
    fn rejects_a_direct_reference_without_eol() {
        let content = format!("{}x", "a".repeat(40));
        let error = parse("refs/heads/main", content.as_bytes()).unwrap_err();
        assert!(matches!(error, RefsError::CorruptedLoose { .. }));
    }

    #[test]
    fn rejects_invalid_hex() {
        let content = format!("{}\n", "z".repeat(40));
        let error = parse("refs/heads/main", content.as_bytes()).unwrap_err();
        assert!(matches!(error, RefsError::CorruptedLoose { .. }));
    }

    #[test]
    fn rejects_a_symbolic_reference_without_eol() {
        let error = parse("HEAD", b"ref: refs/heads/main").unwrap_err();
        assert!(matches!(error, RefsError::CorruptedLoose { .. }));
    }

    #[test]
    fn rejects_an_empty_symbolic_reference() {
        let error = parse("HEAD", b"ref: ").unwrap_err();
        assert!(matches!(error, RefsError::CorruptedLoose { .. }));
    }

    proptest! {
        #[test]
        fn direct_references_round_trip(hex in "[0-9a-f]{40}") {
            let oid = ObjectId::try_parse(&hex).unwrap();
            let content = serialize(&RefTarget::Direct(oid.clone()));

            let parsed = parse("refs/heads/main", &content).unwrap();
            assert_eq!(parsed, RefTarget::Direct(oid));
        }

        #[test]
        fn symbolic_references_round_trip(suffix in "[a-zA-Z0-9_-]{1,32}") {
            let name = RefName::try_parse(&format!("refs/heads/{suffix}")).unwrap();
            let content = serialize(&RefTarget::Symbolic(name.clone()));

            let parsed = parse("HEAD", &content).unwrap();
            assert_eq!(parsed, RefTarget::Symbolic(name));
        }
    }
}
