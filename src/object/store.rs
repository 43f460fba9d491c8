use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, IoResultExt, Result};
use crate::hash::{compute_canonical_hash, object_header, Digest};
use crate::repo::Repo;
use crate::types::{Blob, Commit, Object, ObjectKind, Tag, Tree};

use super::{compress, decompress};

/// write an object to the object store
///
/// the digest is SHA-1 over `<kind> <len>\0<payload>`; the file holds the
/// same bytes zlib-compressed. with no repository only the digest is
/// computed and nothing touches the filesystem.
pub fn write_object(repo: Option<&Repo>, object: &Object) -> Result<Digest> {
    write_raw(repo, object.kind(), &object.serialize())
}

/// write an already serialized payload of the given kind
pub fn write_raw(repo: Option<&Repo>, kind: ObjectKind, payload: &[u8]) -> Result<Digest> {
    let canonical = canonical_bytes(kind, payload);
    let digest = compute_canonical_hash(&canonical);

    if let Some(repo) = repo {
        if persist(repo, &digest, &canonical)? {
            debug!(digest = %digest, kind = %kind, size = payload.len(), "wrote object");
        } else {
            debug!(digest = %digest, kind = %kind, "object already exists");
        }
    }

    Ok(digest)
}

/// digest an object without storing it
pub fn object_digest(object: &Object) -> Digest {
    compute_canonical_hash(&canonical_bytes(object.kind(), &object.serialize()))
}

/// header followed by payload
fn canonical_bytes(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut canonical = object_header(kind, payload.len());
    canonical.extend_from_slice(payload);
    canonical
}

/// store canonical bytes under their digest, returning false when already present
fn persist(repo: &Repo, digest: &Digest, canonical: &[u8]) -> Result<bool> {
    let path = object_path(repo, digest);

    // dedup: existing content is never rewritten
    if path.exists() {
        return Ok(false);
    }

    let compressed = compress(canonical, repo.config().core.compression()).with_path(&path)?;

    let object_dir = path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| repo.objects_path());
    fs::create_dir_all(&object_dir).with_path(&object_dir)?;

    let tmp_dir = repo.tmp_path();
    fs::create_dir_all(&tmp_dir).with_path(&tmp_dir)?;

    // atomic write: temp -> fsync -> rename
    let tmp_path = tmp_dir.join(uuid::Uuid::new_v4().to_string());
    write_temp(&tmp_path, &compressed)?;

    // may replace a concurrent writer's file, whose bytes are identical
    if let Err(e) = fs::rename(&tmp_path, &path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::Io { path, source: e });
    }

    // fsync parent directory
    let dir_file = File::open(&object_dir).with_path(&object_dir)?;
    dir_file.sync_all().with_path(&object_dir)?;

    Ok(true)
}

/// write and fsync a temp file, removing it again on failure
fn write_temp(tmp_path: &Path, data: &[u8]) -> Result<()> {
    let result = File::create(tmp_path).and_then(|mut tmp_file| {
        tmp_file.write_all(data)?;
        tmp_file.sync_all()
    });

    if let Err(e) = result {
        let _ = fs::remove_file(tmp_path);
        warn!(path = %tmp_path.display(), error = %e, "temp object write failed");
        return Err(Error::Io {
            path: tmp_path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

/// read an object from the object store
pub fn read_object(repo: &Repo, digest: &Digest) -> Result<Object> {
    let (kind, payload) = read_raw(repo, digest)?;
    Object::deserialize(kind, &payload)
}

/// read an object that may legitimately be absent
pub fn try_read_object(repo: &Repo, digest: &Digest) -> Result<Option<Object>> {
    match read_object(repo, digest) {
        Ok(object) => Ok(Some(object)),
        Err(Error::ObjectNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// read and verify an object, returning its kind and payload undecoded
pub fn read_raw(repo: &Repo, digest: &Digest) -> Result<(ObjectKind, Vec<u8>)> {
    let path = object_path(repo, digest);

    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*digest)
        } else {
            Error::Io {
                path: path.clone(),
                source: e,
            }
        }
    })?;

    let canonical = decompress(&compressed).map_err(|e| {
        warn!(digest = %digest, error = %e, "failed to inflate object");
        Error::corrupt(*digest, format!("decompression failed: {}", e))
    })?;

    let (kind, payload) = split_canonical(digest, &canonical)?;

    // verify digest
    let actual = compute_canonical_hash(&canonical);
    if actual != *digest {
        warn!(digest = %digest, actual = %actual, "object digest mismatch");
        return Err(Error::corrupt(
            *digest,
            format!("digest mismatch: content hashes to {}", actual),
        ));
    }

    debug!(digest = %digest, kind = %kind, size = payload.len(), "read object");
    Ok((kind, payload.to_vec()))
}

/// parse `<kind> <len>\0` and check the declared length against the payload
fn split_canonical<'a>(digest: &Digest, canonical: &'a [u8]) -> Result<(ObjectKind, &'a [u8])> {
    let nul = canonical
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::corrupt(*digest, "header is not NUL-terminated"))?;
    let header = &canonical[..nul];
    let payload = &canonical[nul + 1..];

    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| Error::corrupt(*digest, "header has no length field"))?;
    let tag = &header[..space];
    let length = std::str::from_utf8(&header[space + 1..])
        .ok()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| Error::corrupt(*digest, "header length is not a decimal number"))?;

    if length != payload.len() {
        return Err(Error::corrupt(
            *digest,
            format!(
                "declared length {} but payload is {} bytes",
                length,
                payload.len()
            ),
        ));
    }

    let kind = ObjectKind::from_tag(tag)?;
    Ok((kind, payload))
}

fn unexpected(digest: &Digest, expected: ObjectKind, found: &Object) -> Error {
    Error::UnexpectedType {
        digest: *digest,
        expected,
        found: found.kind(),
    }
}

/// read a blob from the object store
pub fn read_blob(repo: &Repo, digest: &Digest) -> Result<Blob> {
    match read_object(repo, digest)? {
        Object::Blob(blob) => Ok(blob),
        other => Err(unexpected(digest, ObjectKind::Blob, &other)),
    }
}

/// read a tree from the object store
pub fn read_tree(repo: &Repo, digest: &Digest) -> Result<Tree> {
    match read_object(repo, digest)? {
        Object::Tree(tree) => Ok(tree),
        other => Err(unexpected(digest, ObjectKind::Tree, &other)),
    }
}

/// read a commit from the object store
pub fn read_commit(repo: &Repo, digest: &Digest) -> Result<Commit> {
    match read_object(repo, digest)? {
        Object::Commit(commit) => Ok(commit),
        other => Err(unexpected(digest, ObjectKind::Commit, &other)),
    }
}

/// read a tag from the object store
pub fn read_tag(repo: &Repo, digest: &Digest) -> Result<Tag> {
    match read_object(repo, digest)? {
        Object::Tag(tag) => Ok(tag),
        other => Err(unexpected(digest, ObjectKind::Tag, &other)),
    }
}

/// get the filesystem path to an object
pub fn object_path(repo: &Repo, digest: &Digest) -> PathBuf {
    let (dir, file) = digest.to_path_components();
    repo.objects_path().join(dir).join(file)
}

/// check if an object exists in the object store
pub fn object_exists(repo: &Repo, digest: &Digest) -> bool {
    object_path(repo, digest).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TreeEntry;
    use tempfile::tempdir;

    const HELLO: &str = "ce013625030ba8dba906f756967f9e9ca394464a";

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repo::init(&repo_path).unwrap();
        (dir, repo)
    }

    /// replace a stored object's file with the given canonical bytes
    fn overwrite_canonical(repo: &Repo, digest: &Digest, canonical: &[u8]) {
        let path = object_path(repo, digest);
        fs::write(&path, compress(canonical, 6).unwrap()).unwrap();
    }

    #[test]
    fn test_hello_blob_end_to_end() {
        let (_dir, repo) = test_repo();

        let blob = Object::Blob(Blob::new(b"hello\n".to_vec()));
        let digest = write_object(Some(&repo), &blob).unwrap();

        assert_eq!(digest.to_hex(), HELLO);
        let expected_path = repo
            .path()
            .join("objects/ce/013625030ba8dba906f756967f9e9ca394464a");
        assert_eq!(object_path(&repo, &digest), expected_path);
        assert!(expected_path.is_file());

        // stored bytes are the compressed canonical form
        let stored = decompress(&fs::read(&expected_path).unwrap()).unwrap();
        assert_eq!(stored, b"blob 6\0hello\n".to_vec());

        assert_eq!(read_object(&repo, &digest).unwrap(), blob);
        assert_eq!(read_blob(&repo, &digest).unwrap().data(), b"hello\n");
    }

    #[test]
    fn test_non_utf8_objects_read_back() {
        let (_dir, repo) = test_repo();

        let mut tree_raw = b"100644 caf\xe9\0".to_vec();
        tree_raw.extend_from_slice(Digest::ZERO.as_bytes());
        let tree = write_raw(Some(&repo), ObjectKind::Tree, &tree_raw).unwrap();

        let commit_raw = format!("tree {}\n", tree)
            .into_bytes()
            .into_iter()
            .chain(b"author Jos\xe9 <j@example.com> 1 +0000\n\nmsg\n".iter().copied())
            .collect::<Vec<u8>>();
        let commit = write_raw(Some(&repo), ObjectKind::Commit, &commit_raw).unwrap();

        let read = read_tree(&repo, &tree).unwrap();
        assert!(read.get(b"caf\xe9").is_some());
        assert_eq!(read.serialize(), tree_raw);

        let read = read_commit(&repo, &commit).unwrap();
        assert_eq!(read.tree().unwrap(), tree);
        assert_eq!(read.serialize(), commit_raw);
        assert_eq!(object_digest(&Object::Commit(read)), commit);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (_dir, repo) = test_repo();

        let blob = Object::Blob(Blob::new(b"hello\n".to_vec()));
        let digest = write_object(None, &blob).unwrap();

        assert_eq!(digest.to_hex(), HELLO);
        assert_eq!(object_digest(&blob), digest);
        assert!(!object_exists(&repo, &digest));
        assert_eq!(fs::read_dir(repo.objects_path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_is_idempotent() {
        let (_dir, repo) = test_repo();

        let first = Object::Commit(Commit::new(Digest::ZERO, &[], "a", "a", "m\n"));
        let second = Object::Commit(Commit::new(Digest::ZERO, &[], "a", "a", "m\n"));

        let h1 = write_object(Some(&repo), &first).unwrap();
        let path = object_path(&repo, &h1);
        let modified = fs::metadata(&path).unwrap().modified().unwrap();

        let h2 = write_object(Some(&repo), &second).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);

        // no new write happens for existing content
        let canonical = canonical_bytes(ObjectKind::Commit, &second.serialize());
        assert!(!persist(&repo, &h1, &canonical).unwrap());
    }

    #[test]
    fn test_existing_file_is_not_rewritten() {
        let (_dir, repo) = test_repo();

        let blob = Object::Blob(Blob::new(b"keep me".to_vec()));
        let digest = write_object(Some(&repo), &blob).unwrap();
        let path = object_path(&repo, &digest);

        // the store trusts the path, so a sentinel survives a second write
        fs::write(&path, b"sentinel").unwrap();
        write_object(Some(&repo), &blob).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"sentinel");
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        let (_dir, repo) = test_repo();

        let blob = Object::Blob(Blob::new(b"content".to_vec()));
        let blob_digest = write_object(Some(&repo), &blob).unwrap();

        let tree = Object::Tree(
            Tree::new(vec![
                TreeEntry::file("b.txt", blob_digest),
                TreeEntry::dir("a", blob_digest),
            ])
            .unwrap(),
        );
        let tree_digest = write_object(Some(&repo), &tree).unwrap();

        let commit = Object::Commit(Commit::new(
            tree_digest,
            &[],
            "Ada <ada@example.com> 0 +0000",
            "Ada <ada@example.com> 0 +0000",
            "first\n\nmulti\nline\n",
        ));
        let commit_digest = write_object(Some(&repo), &commit).unwrap();

        let tag = Object::Tag(Tag::new(
            commit_digest,
            ObjectKind::Commit,
            "v1",
            "Ada <ada@example.com> 0 +0000",
            "tagged\n",
        ));
        let tag_digest = write_object(Some(&repo), &tag).unwrap();

        assert_eq!(read_object(&repo, &blob_digest).unwrap(), blob);
        assert_eq!(read_object(&repo, &tree_digest).unwrap(), tree);
        assert_eq!(read_object(&repo, &commit_digest).unwrap(), commit);
        assert_eq!(read_object(&repo, &tag_digest).unwrap(), tag);
    }

    #[test]
    fn test_read_nonexistent() {
        let (_dir, repo) = test_repo();

        let fake = Digest::from_bytes([0x11; 20]);
        assert!(matches!(
            read_object(&repo, &fake),
            Err(Error::ObjectNotFound(_))
        ));
        assert!(try_read_object(&repo, &fake).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_length_rejected() {
        let (_dir, repo) = test_repo();

        let digest =
            write_object(Some(&repo), &Object::Blob(Blob::new(b"hello\n".to_vec()))).unwrap();

        // one byte of the length field: 6 -> 5
        overwrite_canonical(&repo, &digest, b"blob 5\0hello\n");
        let err = read_object(&repo, &digest).unwrap_err();
        assert!(
            matches!(err, Error::CorruptObject { ref reason, .. } if reason.contains("declared length 5"))
        );

        overwrite_canonical(&repo, &digest, b"blob 7\0hello\n");
        assert!(matches!(
            read_object(&repo, &digest),
            Err(Error::CorruptObject { .. })
        ));
    }

    #[test]
    fn test_corrupt_header_rejected() {
        let (_dir, repo) = test_repo();
        let digest = Digest::from_bytes([0x22; 20]);
        fs::create_dir_all(object_path(&repo, &digest).parent().unwrap()).unwrap();

        for canonical in [&b"blob6\0hello\n"[..], b"blob x\0hello\n", b"blob 6 hello\n"] {
            overwrite_canonical(&repo, &digest, canonical);
            assert!(matches!(
                read_raw(&repo, &digest),
                Err(Error::CorruptObject { .. })
            ));
        }
    }

    #[test]
    fn test_not_zlib_rejected() {
        let (_dir, repo) = test_repo();
        let digest = write_object(Some(&repo), &Object::Blob(Blob::new(b"x".to_vec()))).unwrap();

        fs::write(object_path(&repo, &digest), b"plain text").unwrap();
        let err = read_object(&repo, &digest).unwrap_err();
        assert!(
            matches!(err, Error::CorruptObject { ref reason, .. } if reason.starts_with("decompression"))
        );
    }

    #[test]
    fn test_unknown_type() {
        let (_dir, repo) = test_repo();
        let canonical = b"chunk 3\0abc";
        let digest = compute_canonical_hash(canonical);
        fs::create_dir_all(object_path(&repo, &digest).parent().unwrap()).unwrap();
        overwrite_canonical(&repo, &digest, canonical);

        assert!(matches!(
            read_object(&repo, &digest),
            Err(Error::UnknownType(ref t)) if t == "chunk"
        ));
    }

    #[test]
    fn test_digest_mismatch() {
        let (_dir, repo) = test_repo();
        let digest = write_object(Some(&repo), &Object::Blob(Blob::new(b"aaa".to_vec()))).unwrap();

        // well-formed, but not the content this digest names
        overwrite_canonical(&repo, &digest, b"blob 3\0bbb");
        let err = read_object(&repo, &digest).unwrap_err();
        assert!(
            matches!(err, Error::CorruptObject { ref reason, .. } if reason.starts_with("digest mismatch"))
        );
    }

    #[test]
    fn test_typed_read_mismatch() {
        let (_dir, repo) = test_repo();
        let digest = write_object(Some(&repo), &Object::Blob(Blob::new(b"x".to_vec()))).unwrap();

        let err = read_commit(&repo, &digest).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedType {
                expected: ObjectKind::Commit,
                found: ObjectKind::Blob,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_payload_surfaces() {
        let (_dir, repo) = test_repo();
        let digest = write_raw(Some(&repo), ObjectKind::Tree, b"100644 broken").unwrap();

        assert!(matches!(
            read_object(&repo, &digest),
            Err(Error::MalformedObject { kind: "tree", .. })
        ));
        // the raw form is still readable
        assert_eq!(read_raw(&repo, &digest).unwrap().1, b"100644 broken".to_vec());
    }

    #[test]
    fn test_tmp_dir_left_clean() {
        let (_dir, repo) = test_repo();
        for i in 0..5 {
            write_object(Some(&repo), &Object::Blob(Blob::new(vec![i; 10]))).unwrap();
        }
        assert_eq!(fs::read_dir(repo.tmp_path()).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_writers() {
        let (_dir, repo) = test_repo();
        let repo = std::sync::Arc::new(repo);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                std::thread::spawn(move || {
                    let blob = Object::Blob(Blob::new(b"racy".to_vec()));
                    write_object(Some(&*repo), &blob).unwrap()
                })
            })
            .collect();

        let digests: Vec<Digest> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(digests.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(read_blob(&repo, &digests[0]).unwrap().data(), b"racy");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_temp_write_is_removed() {
        // writes to /dev/full fail with ENOSPC
        if !Path::new("/dev/full").exists() {
            return;
        }
        let (_dir, repo) = test_repo();
        let tmp_path = repo.tmp_path().join("partial");
        std::os::unix::fs::symlink("/dev/full", &tmp_path).unwrap();

        let err = write_temp(&tmp_path, b"compressed bytes").unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if *path == tmp_path));
        assert!(fs::symlink_metadata(&tmp_path).is_err());
        assert_eq!(fs::read_dir(repo.tmp_path()).unwrap().count(), 0);
    }
}
