mod zlib;
pub mod store;

pub use zlib::{compress, decompress};
pub use store::{
    object_digest, object_exists, object_path, read_blob, read_commit, read_object, read_raw,
    read_tag, read_tree, try_read_object, write_object, write_raw,
};
