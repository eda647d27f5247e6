//! Object database
//!
//! Content-addressable storage for the objects the reference backend needs
//! to touch. The backend uses it to verify that a direct reference targets
//! a real object, and to peel annotated tags when writing the packed file.
//!
//! ## Storage Format
//!
//! Objects are stored as:
//! - Path: `objects/ab/cdef123...` (first 2 chars as directory, rest as filename)
//! - Content: Compressed (zlib) format containing type, size, and data

use crate::artifacts::core::atomic_write;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::errors::{RefsError, Result};
use bytes::Bytes;
use std::io::{BufRead, Cursor, Read, Write};
use std::path::Path;

/// Object database
///
/// Manages storage and retrieval of content-addressable objects. All
/// objects are identified by their SHA-1 hash and stored in compressed
/// format.
#[derive(Debug)]
pub struct Database {
    /// Path to the objects directory
    path: Box<Path>,
}

impl Database {
    /// Create a new database instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the objects directory
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    /// Get the path to the objects directory
    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Check whether an object exists in the database
    pub fn exists(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).exists()
    }

    /// Store an object in the database
    ///
    /// The object is serialized, compressed, and written to the path its
    /// hash encodes. Storing an already-present object is a no-op.
    ///
    /// # Returns
    ///
    /// The object ID of the stored object
    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        let object_id = object.object_id()?;
        let object_path = self.path.join(object_id.to_path());

        if !object_path.exists() {
            let content = Self::compress(&object.serialize()?)?;
            atomic_write(&object_path, &content)?;
        }

        Ok(object_id)
    }

    /// Read an object's type from its header
    pub fn object_type(&self, object_id: &ObjectId) -> Result<ObjectType> {
        let (object_type, _) = self.parse_object_as_bytes(object_id)?;
        Ok(object_type)
    }

    /// Resolve the peel target of an object
    ///
    /// # Returns
    ///
    /// Some(target OID) when the object is an annotated tag, None for any
    /// other object type.
    pub fn peel_target(&self, object_id: &ObjectId) -> Result<Option<ObjectId>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tag => {
                let tag = Tag::deserialize(object_reader)?;
                Ok(Some(tag.target().clone()))
            }
            _ => Ok(None),
        }
    }

    fn parse_object_as_bytes(&self, object_id: &ObjectId) -> Result<(ObjectType, impl BufRead)> {
        let object_content = self.read_object(object_id)?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::parse_object_type(&mut object_reader)?;

        Ok((object_type, object_reader))
    }

    fn read_object(&self, object_id: &ObjectId) -> Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        let object_content = std::fs::read(&object_path)
            .map_err(|_| RefsError::CorruptedObject(object_id.to_string()))?;

        Self::decompress(&object_content, object_id)
    }

    fn compress(data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;

        Ok(encoder.finish()?)
    }

    fn decompress(data: &[u8], object_id: &ObjectId) -> Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .map_err(|_| RefsError::CorruptedObject(object_id.to_string()))?;

        Ok(decompressed_content.into())
    }
}
