use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;
use bytes::Bytes;
use derive_new::new;

/// Raw content object
///
/// The simplest object kind: an opaque byte payload. References created
/// through the backend may target blobs directly.
#[derive(Debug, Clone, new)]
pub struct Blob {
    data: Bytes,
}

impl Blob {
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn content(&self) -> Result<Bytes> {
        Ok(self.data.clone())
    }
}
