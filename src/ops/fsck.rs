use std::collections::BTreeSet;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::object::{object_exists, read_object};
use crate::repo::Repo;
use crate::types::{Object, ObjectKind, MODE_GITLINK};

/// fsck report
#[derive(Debug, Default)]
pub struct FsckReport {
    /// objects checked
    pub objects_checked: usize,
    /// objects that fail to read back intact
    pub corrupt_objects: Vec<CorruptObject>,
    /// objects referenced by other objects but not stored
    pub missing_objects: Vec<MissingObject>,
}

impl FsckReport {
    pub fn is_ok(&self) -> bool {
        self.corrupt_objects.is_empty() && self.missing_objects.is_empty()
    }
}

#[derive(Debug)]
pub struct CorruptObject {
    pub digest: Digest,
    pub message: String,
}

#[derive(Debug)]
pub struct MissingObject {
    pub digest: Digest,
    pub object_type: ObjectKind,
    pub referenced_by: Digest,
}

/// verify every stored object and the references between them
///
/// read-only: nothing in the store is repaired or removed.
pub fn fsck(repo: &Repo) -> Result<FsckReport> {
    let mut report = FsckReport::default();

    for digest in list_objects(repo)? {
        report.objects_checked += 1;

        let object = match read_object(repo, &digest) {
            Ok(object) => object,
            Err(e @ Error::Io { .. }) => return Err(e),
            Err(e) => {
                warn!(digest = %digest, error = %e, "corrupt object");
                report.corrupt_objects.push(CorruptObject {
                    digest,
                    message: e.to_string(),
                });
                continue;
            }
        };

        match references(&object) {
            Ok(refs) => {
                for (kind, target) in refs {
                    if !object_exists(repo, &target) {
                        report.missing_objects.push(MissingObject {
                            digest: target,
                            object_type: kind,
                            referenced_by: digest,
                        });
                    }
                }
            }
            Err(e) => report.corrupt_objects.push(CorruptObject {
                digest,
                message: e.to_string(),
            }),
        }
    }

    info!(
        checked = report.objects_checked,
        corrupt = report.corrupt_objects.len(),
        missing = report.missing_objects.len(),
        "fsck finished"
    );

    Ok(report)
}

/// objects an object points at, with the kind each should be
fn references(object: &Object) -> Result<Vec<(ObjectKind, Digest)>> {
    let mut refs = Vec::new();
    match object {
        Object::Blob(_) => {}
        Object::Tree(tree) => {
            for entry in tree.entries() {
                // submodule commits live in another repository
                if entry.mode != MODE_GITLINK {
                    refs.push((entry.kind(), entry.digest));
                }
            }
        }
        Object::Commit(commit) => {
            refs.push((ObjectKind::Tree, commit.tree()?));
            for parent in commit.parents()? {
                refs.push((ObjectKind::Commit, parent));
            }
        }
        Object::Tag(tag) => {
            refs.push((tag.target_kind()?, tag.object()?));
        }
    }
    Ok(refs)
}

/// list all object digests stored under objects/, in digest order
fn list_objects(repo: &Repo) -> Result<BTreeSet<Digest>> {
    let objects = repo.objects_path();
    let mut digests = BTreeSet::new();

    for entry in WalkDir::new(&objects).min_depth(2).max_depth(2) {
        let entry = entry.map_err(|e| Error::Io {
            path: e.path().map(|p| p.to_path_buf()).unwrap_or_else(|| objects.clone()),
            source: e.into(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let shard = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());
        let name = entry.file_name().to_str();

        match (shard, name) {
            (Some(shard), Some(name)) if shard.len() == 2 && name.len() == 38 => {
                match Digest::from_hex(&format!("{}{}", shard, name)) {
                    Ok(digest) => {
                        digests.insert(digest);
                    }
                    Err(_) => warn!(path = %entry.path().display(), "skipping non-object file"),
                }
            }
            _ => warn!(path = %entry.path().display(), "skipping non-object file"),
        }
    }

    Ok(digests)
}
