use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::kvlm::Kvlm;
use crate::types::ObjectKind;

/// an annotated tag, stored as a key-value list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    pub fn new(
        object: Digest,
        kind: ObjectKind,
        name: impl Into<Vec<u8>>,
        tagger: impl Into<Vec<u8>>,
        message: impl Into<Vec<u8>>,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.append("object", object.to_hex());
        kvlm.append("type", kind.as_str());
        kvlm.append("tag", name);
        kvlm.append("tagger", tagger);
        kvlm.set_message(message);
        Self { kvlm }
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// digest of the tagged object
    pub fn object(&self) -> Result<Digest> {
        let hex = self.kvlm.get_one("object").ok_or(Error::MissingField {
            kind: "tag",
            field: "object",
        })?;
        Digest::from_hex_bytes(hex)
    }

    /// kind of the tagged object
    pub fn target_kind(&self) -> Result<ObjectKind> {
        let kind = self.kvlm.get_one("type").ok_or(Error::MissingField {
            kind: "tag",
            field: "type",
        })?;
        ObjectKind::from_tag(kind)
    }

    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.kvlm.get_one("tag").map(String::from_utf8_lossy)
    }

    pub fn tagger(&self) -> Option<Cow<'_, str>> {
        self.kvlm.get_one("tagger").map(String::from_utf8_lossy)
    }

    pub fn message(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.kvlm.message())
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.kvlm.serialize()
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self> {
        Ok(Self {
            kvlm: Kvlm::parse(payload)?,
        })
    }
}
