use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::object::{read_object, read_tree};
use crate::repo::Repo;
use crate::types::{Object, ObjectKind, Tree, TreeEntry};

/// list tree entry with full path
///
/// `path` is for display; the exact name bytes are in `entry.name`.
#[derive(Debug, Clone)]
pub struct LsTreeEntry {
    pub path: String,
    pub entry: TreeEntry,
}

/// list a tree, or the root tree of a commit
pub fn ls_tree(repo: &Repo, digest: &Digest, recursive: bool) -> Result<Vec<LsTreeEntry>> {
    let tree = match read_object(repo, digest)? {
        Object::Tree(tree) => tree,
        Object::Commit(commit) => read_tree(repo, &commit.tree()?)?,
        other => {
            return Err(Error::UnexpectedType {
                digest: *digest,
                expected: ObjectKind::Tree,
                found: other.kind(),
            })
        }
    };

    let mut entries = Vec::new();
    ls_tree_impl(repo, &tree, "", recursive, &mut entries)?;
    Ok(entries)
}

fn ls_tree_impl(
    repo: &Repo,
    tree: &Tree,
    prefix: &str,
    recursive: bool,
    entries: &mut Vec<LsTreeEntry>,
) -> Result<()> {
    for entry in tree.entries() {
        let path = if prefix.is_empty() {
            entry.name_str().into_owned()
        } else {
            format!("{}/{}", prefix, entry.name_str())
        };

        // recursive listings show leaves only, like git
        if recursive && entry.is_dir() {
            let subtree = read_tree(repo, &entry.digest)?;
            ls_tree_impl(repo, &subtree, &path, recursive, entries)?;
            continue;
        }

        entries.push(LsTreeEntry {
            path,
            entry: entry.clone(),
        });
    }

    Ok(())
}

impl std::fmt::Display for LsTreeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}\t{}",
            self.entry.padded_mode(),
            self.entry.kind(),
            self.entry.digest,
            self.path
        )
    }
}
