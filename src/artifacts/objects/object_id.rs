//! Object identifier (20-byte hash)
//!
//! Object IDs are 40-character hexadecimal strings naming a 20-byte hash.
//! They uniquely identify all objects in the database and are the targets
//! of direct references.
//!
//! ## Format
//!
//! - 40 lowercase hex characters (e.g., "abc123...def")
//!
//! ## Storage
//!
//! Objects are stored in `objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::{RefsError, Result};
use std::path::PathBuf;

/// Object identifier
///
/// A 40-character hexadecimal string that uniquely identifies an object.
/// Always stored in lowercase so that equality and ordering are byte-exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Uppercase hex digits are accepted and folded to lowercase.
    ///
    /// # Arguments
    ///
    /// * `id` - 40-character hexadecimal string
    ///
    /// # Returns
    ///
    /// Validated ObjectId or error if invalid length/characters
    pub fn try_parse(id: &str) -> Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(RefsError::InvalidOid(id.to_string()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RefsError::InvalidOid(id.to_string()));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Convert to file system path for object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 chars.
    /// For example, `abc123...` becomes `ab/c123...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
