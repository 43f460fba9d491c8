use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::hash::{Digest, DIGEST_LEN};
use crate::types::ObjectKind;

/// regular file
pub const MODE_FILE: &str = "100644";
/// executable file
pub const MODE_EXECUTABLE: &str = "100755";
/// symbolic link
pub const MODE_SYMLINK: &str = "120000";
/// subdirectory (another tree)
pub const MODE_DIR: &str = "40000";
/// submodule commit
pub const MODE_GITLINK: &str = "160000";

/// a directory listing
///
/// entries built through [`Tree::new`] are kept in canonical order; entries
/// decoded from disk keep their stored order, and [`Tree::serialize`] always
/// emits canonical order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// create a new tree, validating and sorting entries
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            validate_entry_name(&entry.name)?;
            // dir "a" and file "a" sort apart, so adjacency is not enough
            if !seen.insert(entry.name.as_slice()) {
                return Err(Error::DuplicateEntryName(entry.name_str().into_owned()));
            }
        }

        entries.sort_by(TreeEntry::canonical_cmp);

        Ok(Self { entries })
    }

    /// create an empty tree
    pub fn empty() -> Self {
        Self { entries: vec![] }
    }

    /// get entries slice
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// look up entry by name
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&TreeEntry> {
        let name = name.as_ref();
        self.entries.iter().find(|e| e.name == name)
    }

    /// number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// is tree empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// encode as `<mode> <name>\0<20 raw digest bytes>` per entry, in canonical order
    pub fn serialize(&self) -> Vec<u8> {
        let mut sorted: Vec<&TreeEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.canonical_cmp(b));

        let mut out = Vec::new();
        for entry in sorted {
            out.extend_from_slice(entry.mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.digest.as_bytes());
        }
        out
    }

    /// decode a binary tree payload
    pub fn deserialize(payload: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < payload.len() {
            let (entry, next) = parse_entry(payload, pos)?;
            entries.push(entry);
            pos = next;
        }

        Ok(Self { entries })
    }
}

fn malformed(offset: usize, reason: impl Into<String>) -> Error {
    Error::MalformedObject {
        kind: "tree",
        offset,
        reason: reason.into(),
    }
}

/// parse one entry starting at `pos`, returning it and the offset after it
fn parse_entry(payload: &[u8], pos: usize) -> Result<(TreeEntry, usize)> {
    let rest = &payload[pos..];

    let space = rest
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| malformed(pos, "truncated entry: missing space after mode"))?;
    let mode = &rest[..space];
    if mode.is_empty() || !mode.iter().all(u8::is_ascii_digit) {
        return Err(malformed(pos, "mode is not an octal number"));
    }

    let name_start = space + 1;
    let nul = rest[name_start..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| name_start + i)
        .ok_or_else(|| malformed(pos + name_start, "truncated entry: missing NUL after name"))?;

    let digest_start = nul + 1;
    let digest = rest
        .get(digest_start..digest_start + DIGEST_LEN)
        .and_then(Digest::from_slice)
        .ok_or_else(|| malformed(pos + digest_start, "truncated entry: short digest"))?;

    let entry = TreeEntry {
        // digits are ascii, so this cannot fail
        mode: String::from_utf8_lossy(mode).into_owned(),
        name: rest[name_start..nul].to_vec(),
        digest,
    };
    Ok((entry, pos + digest_start + DIGEST_LEN))
}

/// validate an entry name
fn validate_entry_name(name: &[u8]) -> Result<()> {
    let shown = || String::from_utf8_lossy(name);
    if name.is_empty() {
        return Err(Error::InvalidEntryName("empty name".to_string()));
    }
    if name.contains(&b'/') {
        return Err(Error::InvalidEntryName(format!(
            "name contains '/': {}",
            shown()
        )));
    }
    if name.contains(&0) {
        return Err(Error::InvalidEntryName(format!(
            "name contains null byte: {}",
            shown()
        )));
    }
    if name == b"." || name == b".." {
        return Err(Error::InvalidEntryName(format!("reserved name: {}", shown())));
    }
    Ok(())
}

/// a single entry in a tree
///
/// names are raw bytes, as stored on disk; they need not be UTF-8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub name: Vec<u8>,
    pub digest: Digest,
}

impl TreeEntry {
    pub fn new(mode: impl Into<String>, name: impl Into<Vec<u8>>, digest: Digest) -> Self {
        Self {
            mode: mode.into(),
            name: name.into(),
            digest,
        }
    }

    pub fn file(name: impl Into<Vec<u8>>, digest: Digest) -> Self {
        Self::new(MODE_FILE, name, digest)
    }

    pub fn dir(name: impl Into<Vec<u8>>, digest: Digest) -> Self {
        Self::new(MODE_DIR, name, digest)
    }

    /// name for display, with invalid UTF-8 replaced
    pub fn name_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// does this entry point at a subtree
    pub fn is_dir(&self) -> bool {
        self.mode == MODE_DIR || self.mode == "040000"
    }

    /// kind of object the entry's digest refers to
    pub fn kind(&self) -> ObjectKind {
        if self.is_dir() {
            ObjectKind::Tree
        } else if self.mode == MODE_GITLINK {
            ObjectKind::Commit
        } else {
            ObjectKind::Blob
        }
    }

    /// mode zero-padded to six digits, as listings print it
    pub fn padded_mode(&self) -> String {
        format!("{:0>6}", self.mode)
    }

    /// byte-wise name order, with directories compared as `name/`
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    fn sort_key(&self) -> SortKey<'_> {
        SortKey {
            name: &self.name,
            dir: self.is_dir(),
        }
    }
}

/// name bytes followed by an implicit '/' for directories
#[derive(PartialEq, Eq)]
struct SortKey<'a> {
    name: &'a [u8],
    dir: bool,
}

impl SortKey<'_> {
    fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.name
            .iter()
            .copied()
            .chain(self.dir.then_some(b'/'))
    }
}

impl PartialOrd for SortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes().cmp(other.bytes())
    }
}
