use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{Blob, Commit, Tag, Tree};

/// the four kinds of stored object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    /// the type tag written in the canonical header
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }

    /// parse a header type tag
    pub fn from_tag(tag: &[u8]) -> Result<Self> {
        match tag {
            b"blob" => Ok(ObjectKind::Blob),
            b"tree" => Ok(ObjectKind::Tree),
            b"commit" => Ok(ObjectKind::Commit),
            b"tag" => Ok(ObjectKind::Tag),
            other => Err(Error::UnknownType(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s.as_bytes())
    }
}

/// a stored object of any kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
            Object::Tag(_) => ObjectKind::Tag,
        }
    }

    /// payload bytes, without the canonical header
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Object::Blob(blob) => blob.serialize(),
            Object::Tree(tree) => tree.serialize(),
            Object::Commit(commit) => commit.serialize(),
            Object::Tag(tag) => tag.serialize(),
        }
    }

    /// decode a payload of the given kind
    pub fn deserialize(kind: ObjectKind, payload: &[u8]) -> Result<Self> {
        Ok(match kind {
            ObjectKind::Blob => Object::Blob(Blob::deserialize(payload)),
            ObjectKind::Tree => Object::Tree(Tree::deserialize(payload)?),
            ObjectKind::Commit => Object::Commit(Commit::deserialize(payload)?),
            ObjectKind::Tag => Object::Tag(Tag::deserialize(payload)?),
        })
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Object::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Object::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Object::Commit(commit)
    }
}

impl From<Tag> for Object {
    fn from(tag: Tag) -> Self {
        Object::Tag(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        for kind in [
            ObjectKind::Blob,
            ObjectKind::Tree,
            ObjectKind::Commit,
            ObjectKind::Tag,
        ] {
            assert_eq!(kind.as_str().parse::<ObjectKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = ObjectKind::from_tag(b"chunk").unwrap_err();
        assert!(matches!(err, Error::UnknownType(ref t) if t == "chunk"));
    }

    #[test]
    fn test_dispatch_by_kind() {
        let obj = Object::deserialize(ObjectKind::Blob, b"data").unwrap();
        assert_eq!(obj.kind(), ObjectKind::Blob);
        assert_eq!(obj.serialize(), b"data".to_vec());

        let obj = Object::deserialize(ObjectKind::Commit, b"tree abc\n\nmsg\n").unwrap();
        assert_eq!(obj.kind(), ObjectKind::Commit);
        assert_eq!(obj.serialize(), b"tree abc\n\nmsg\n".to_vec());
    }

    #[test]
    fn test_malformed_payload_is_not_defaulted() {
        let err = Object::deserialize(ObjectKind::Tree, b"100644 file").unwrap_err();
        assert!(matches!(err, Error::MalformedObject { kind: "tree", .. }));

        let err = Object::deserialize(ObjectKind::Tag, b"object abc").unwrap_err();
        assert!(matches!(err, Error::MalformedKvlm { .. }));
    }
}
