mod blob;
mod commit;
mod object;
mod tag;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use object::{Object, ObjectKind};
pub use tag::Tag;
pub use tree::{
    Tree, TreeEntry, MODE_DIR, MODE_EXECUTABLE, MODE_FILE, MODE_GITLINK, MODE_SYMLINK,
};
