use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::object::read_raw;
use crate::repo::Repo;
use crate::types::ObjectKind;

/// payload bytes of a stored object, optionally requiring its kind
pub fn cat_file(repo: &Repo, digest: &Digest, expected: Option<ObjectKind>) -> Result<Vec<u8>> {
    let (kind, payload) = read_raw(repo, digest)?;

    if let Some(expected) = expected {
        if kind != expected {
            return Err(Error::UnexpectedType {
                digest: *digest,
                expected,
                found: kind,
            });
        }
    }

    Ok(payload)
}
