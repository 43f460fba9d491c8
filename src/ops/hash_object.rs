use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::hash::Digest;
use crate::object::write_raw;
use crate::repo::Repo;
use crate::types::{Object, ObjectKind};

/// hash raw bytes as an object of `kind`, storing it when a repo is given
///
/// the bytes are checked to decode as `kind` first, then stored exactly as
/// given, so the digest is always the digest of the input.
pub fn hash_object(repo: Option<&Repo>, kind: ObjectKind, data: &[u8]) -> Result<Digest> {
    Object::deserialize(kind, data)?;
    write_raw(repo, kind, data)
}

/// hash the contents of a file
pub fn hash_file(repo: Option<&Repo>, kind: ObjectKind, path: &Path) -> Result<Digest> {
    let data = std::fs::read(path).with_path(path)?;
    hash_object(repo, kind, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{object_exists, read_blob, read_commit};
    use crate::Error;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repo::init(&repo_path).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_hash_file_write() {
        let (dir, repo) = test_repo();
        let file = dir.path().join("hello.txt");
        std::fs::write(&file, "hello\n").unwrap();

        let digest = hash_file(Some(&repo), ObjectKind::Blob, &file).unwrap();
        assert_eq!(digest.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert_eq!(read_blob(&repo, &digest).unwrap().data(), b"hello\n");
    }

    #[test]
    fn test_hash_without_repo() {
        let (_dir, repo) = test_repo();
        let digest = hash_object(None, ObjectKind::Blob, b"hello\n").unwrap();
        assert!(!object_exists(&repo, &digest));
    }

    #[test]
    fn test_hash_rejects_malformed() {
        let result = hash_object(None, ObjectKind::Commit, b"no separator");
        assert!(matches!(result, Err(Error::MalformedKvlm { .. })));
    }

    #[test]
    fn test_hash_latin1_commit() {
        let (_dir, repo) = test_repo();
        let raw = b"tree 0000000000000000000000000000000000000000\n\
author Jos\xe9 <j@example.com> 1 +0000\n\
encoding ISO-8859-1\n\
\n\
caf\xe9\n";

        let digest = hash_object(Some(&repo), ObjectKind::Commit, raw).unwrap();
        assert_eq!(digest, crate::compute_object_hash(ObjectKind::Commit, raw));
        assert_eq!(read_commit(&repo, &digest).unwrap().serialize(), raw.to_vec());
    }

    #[test]
    fn test_hash_missing_file() {
        let dir = tempdir().unwrap();
        let result = hash_file(None, ObjectKind::Blob, &dir.path().join("absent"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
