//! tig - content-addressed object store
//!
//! the object layer of a git-style version-control store: immutable, typed,
//! hash-identified records kept one file per object inside a repository.
//!
//! # Core concepts
//!
//! - **Blob**: opaque file content
//! - **Tree**: a directory listing of `(mode, name, digest)` entries
//! - **Commit**: a snapshot of a tree with parents, identities and a message
//! - **Tag**: a named, annotated pointer to another object
//!
//! commits and tags share the [`Kvlm`] text format: `key value` lines, with
//! continuation lines indented by one space, a blank line, then the message.
//!
//! # Storage format
//!
//! canonical form = `<kind> <decimal length>\0<payload>`
//!
//! digest = SHA-1(canonical form), stored zlib-compressed at
//! `objects/<first 2 hex>/<remaining 38 hex>`.
//!
//! # Example usage
//!
//! ```no_run
//! use tig::{read_object, write_object, Blob, Object, Repo};
//! use std::path::Path;
//!
//! // initialize a repository
//! let repo = Repo::init(Path::new("/path/to/repo/.tig")).unwrap();
//!
//! // store a blob and read it back
//! let blob = Object::Blob(Blob::new(b"hello\n".to_vec()));
//! let digest = write_object(Some(&repo), &blob).unwrap();
//! assert_eq!(digest.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
//! assert_eq!(read_object(&repo, &digest).unwrap(), blob);
//! ```

mod config;
mod error;
mod hash;
mod kvlm;
mod object;
mod repo;

pub mod ops;
pub mod types;

pub use config::{Config, CoreConfig, DEFAULT_COMPRESSION_LEVEL, REPOSITORY_FORMAT_VERSION};
pub use error::{Error, Result};
pub use hash::{compute_object_hash, Digest, ObjectHasher, DIGEST_LEN};
pub use kvlm::{Kvlm, Values};
pub use object::{
    object_digest, object_exists, object_path, read_blob, read_commit, read_object, read_raw,
    read_tag, read_tree, try_read_object, write_object, write_raw,
};
pub use repo::{Repo, REPO_DIR};
pub use types::{Blob, Commit, Object, ObjectKind, Tag, Tree, TreeEntry};
