//! Error taxonomy for reference operations
//!
//! Every fallible operation in the crate returns [`Result`], which carries a
//! [`RefsError`]. The variants map one-to-one onto the failure conditions of
//! the reference backend: lookup misses, name grammar violations, storage
//! corruption, and plain filesystem errors.

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, RefsError>;

/// Errors produced by the reference backend
#[derive(Debug, thiserror::Error)]
pub enum RefsError {
    /// The name was found in neither the loose store nor the packed file
    #[error("reference '{0}' not found")]
    NotFound(String),

    /// The name violates the reference naming grammar
    #[error("invalid reference name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Creation or rename without `force` into an occupied name
    #[error("a reference with the name '{0}' already exists")]
    AlreadyExists(String),

    /// The target OID is not present in the object database
    #[error("invalid target for reference '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    /// A string failed to parse as a 40-character hexadecimal object ID
    #[error("invalid object id '{0}'")]
    InvalidOid(String),

    /// A loose reference file could not be parsed
    #[error("corrupted loose reference '{name}': {reason}")]
    CorruptedLoose { name: String, reason: String },

    /// The `packed-refs` file could not be parsed
    #[error("corrupted packed-refs file: {0}")]
    PackedRefsCorrupt(String),

    /// An object needed for tag peeling is missing or unreadable
    #[error("corrupted object '{0}'")]
    CorruptedObject(String),

    /// Symbolic resolution did not terminate within the nesting bound
    #[error("symbolic reference too nested ({0} levels deep)")]
    TooNested(usize),

    /// Underlying filesystem failure
    #[error("filesystem error")]
    Io(#[from] std::io::Error),
}

impl RefsError {
    /// True for the *not-found* kind, used by the two-store lookup fallback
    pub fn is_not_found(&self) -> bool {
        matches!(self, RefsError::NotFound(_))
    }

    pub(crate) fn invalid_name(name: &str, reason: &str) -> Self {
        RefsError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn corrupted_loose(name: &str, reason: &str) -> Self {
        RefsError::CorruptedLoose {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
