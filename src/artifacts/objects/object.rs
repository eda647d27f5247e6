//! Core object trait
//!
//! All objects stored in the database implement `Object`:
//! serialization with the `<type> <size>\0<content>` header, and object ID
//! computation as the SHA-1 hash of the serialized bytes.
//!
//! ## Object Format
//!
//! ```text
//! <type> <size>\0<content>
//! ```
//! Then compressed with zlib and stored in `objects/`.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::Write;

/// Core database object trait
///
/// Implemented by the object types the reference backend needs to interact
/// with (blobs as plain targets, annotated tags for peeling).
pub trait Object {
    /// Get the object's type
    fn object_type(&self) -> ObjectType;

    /// Get the object's payload, without the header
    fn content(&self) -> Result<Bytes>;

    /// Serialize the object to bytes (including header)
    fn serialize(&self) -> Result<Bytes> {
        let content = self.content()?;

        let mut data = Vec::with_capacity(content.len() + 32);
        write!(data, "{} {}\0", self.object_type(), content.len())?;
        data.extend_from_slice(&content);

        Ok(data.into())
    }

    /// Compute the object ID (SHA-1 hash)
    ///
    /// The ID is computed by hashing the serialized content.
    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        let mut hasher = Sha1::new();
        hasher.update(&content);

        let oid = hasher.finalize();
        ObjectId::try_parse(&format!("{oid:x}"))
    }
}
