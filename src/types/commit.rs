use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::kvlm::Kvlm;

/// a commit object pointing to a tree, stored as a key-value list
///
/// any field set is accepted on decode; the typed accessors only fail when
/// the field they read is absent or not a digest. text accessors decode
/// lossily, and the exact bytes stay reachable through [`Commit::kvlm`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    /// create a new commit
    ///
    /// `author` and `committer` are identity strings including the timestamp,
    /// e.g. `Name <mail@example.com> 1527025023 +0200`.
    pub fn new(
        tree: Digest,
        parents: &[Digest],
        author: impl Into<Vec<u8>>,
        committer: impl Into<Vec<u8>>,
        message: impl Into<Vec<u8>>,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.append("tree", tree.to_hex());
        for parent in parents {
            kvlm.append("parent", parent.to_hex());
        }
        kvlm.append("author", author);
        kvlm.append("committer", committer);
        kvlm.set_message(message);
        Self { kvlm }
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// root tree digest
    pub fn tree(&self) -> Result<Digest> {
        let hex = self.kvlm.get_one("tree").ok_or(Error::MissingField {
            kind: "commit",
            field: "tree",
        })?;
        Digest::from_hex_bytes(hex)
    }

    /// parent commit digests (empty for initial, 1 for linear, 2+ for merge)
    pub fn parents(&self) -> Result<Vec<Digest>> {
        self.kvlm
            .get_all("parent")
            .iter()
            .map(|hex| Digest::from_hex_bytes(hex))
            .collect()
    }

    pub fn author(&self) -> Option<Cow<'_, str>> {
        self.kvlm.get_one("author").map(String::from_utf8_lossy)
    }

    pub fn committer(&self) -> Option<Cow<'_, str>> {
        self.kvlm.get_one("committer").map(String::from_utf8_lossy)
    }

    pub fn message(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.kvlm.message())
    }

    /// commit time in seconds since the epoch, read from the committer
    /// (or author) identity's `<seconds> <tz>` suffix
    pub fn timestamp(&self) -> Option<i64> {
        let ident = self.committer().or_else(|| self.author())?;
        let mut parts = ident.rsplit(' ');
        let _tz = parts.next()?;
        parts.next()?.parse().ok()
    }

    /// is this an initial commit (no parents)
    pub fn is_root(&self) -> bool {
        self.kvlm.get_all("parent").is_empty()
    }

    /// is this a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.kvlm.get_all("parent").len() > 1
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
