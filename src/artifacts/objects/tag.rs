//! Annotated tag object
//!
//! An annotated tag is a real object in the database wrapping a target
//! object. The reference backend peels annotated tags when writing the
//! packed file: the tag's target OID is cached next to the tag ref so
//! readers do not have to re-walk the tag chain.
//!
//! ## Format
//!
//! ```text
//! object <40-hex-oid>
//! type <target-type>
//! tag <name>
//! tagger <identity>
//!
//! <message>
//! ```

use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{RefsError, Result};
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

#[derive(Debug, Clone, new)]
pub struct Tag {
    target: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: String,
    message: String,
}

impl Tag {
    /// The OID of the object this tag wraps
    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deserialize a tag payload (header already consumed)
    pub fn deserialize(reader: impl BufRead) -> Result<Self> {
        let mut target = None;
        let mut target_type = None;
        let mut name = None;
        let mut tagger = String::new();
        let mut message = String::new();
        let mut in_message = false;

        for line in reader.lines() {
            let line = line?;

            if in_message {
                message.push_str(&line);
                message.push('\n');
            } else if line.is_empty() {
                in_message = true;
            } else if let Some(oid) = line.strip_prefix("object ") {
                target = Some(ObjectId::try_parse(oid)?);
            } else if let Some(kind) = line.strip_prefix("type ") {
                target_type = Some(ObjectType::try_from(kind)?);
            } else if let Some(tag_name) = line.strip_prefix("tag ") {
                name = Some(tag_name.to_string());
            } else if let Some(identity) = line.strip_prefix("tagger ") {
                tagger = identity.to_string();
            } else {
                return Err(RefsError::CorruptedObject(format!(
                    "unexpected tag header line '{line}'"
                )));
            }
        }

        let target = target
            .ok_or_else(|| RefsError::CorruptedObject("tag without object line".to_string()))?;
        let target_type = target_type
            .ok_or_else(|| RefsError::CorruptedObject("tag without type line".to_string()))?;
        let name =
            name.ok_or_else(|| RefsError::CorruptedObject("tag without tag line".to_string()))?;

        Ok(Tag {
            target,
            target_type,
            name,
            tagger,
            message,
        })
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn content(&self) -> Result<Bytes> {
        let mut content = String::new();
        content.push_str(&format!("object {}\n", self.target));
        content.push_str(&format!("type {}\n", self.target_type));
        content.push_str(&format!("tag {}\n", self.name));
        content.push_str(&format!("tagger {}\n", self.tagger));
        content.push('\n');
        content.push_str(&self.message);

        Ok(Bytes::from(content))
    }
}
