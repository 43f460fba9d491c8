//! high-level operations on tig repositories

mod cat_file;
mod fsck;
mod hash_object;
mod log;
mod ls_tree;

pub use cat_file::cat_file;
pub use fsck::{fsck, CorruptObject, FsckReport, MissingObject};
pub use hash_object::{hash_file, hash_object};
pub use log::{log, LogEntry};
pub use ls_tree::{ls_tree, LsTreeEntry};
