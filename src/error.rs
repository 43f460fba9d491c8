use std::path::PathBuf;

use crate::types::ObjectKind;
use crate::Digest;

/// error type for tig operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("repository not found at {0}")]
    NoRepo(PathBuf),

    #[error("repository already exists at {0}")]
    RepoExists(PathBuf),

    #[error("directory is not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("unsupported repository format version {0}")]
    UnsupportedFormatVersion(u32),

    #[error("object not found: {0}")]
    ObjectNotFound(Digest),

    #[error("corrupt object {digest}: {reason}")]
    CorruptObject { digest: Digest, reason: String },

    #[error("object {digest} is a {found}, expected a {expected}")]
    UnexpectedType {
        digest: Digest,
        expected: ObjectKind,
        found: ObjectKind,
    },

    #[error("unknown object type: {0}")]
    UnknownType(String),

    #[error("malformed {kind} object at byte {offset}: {reason}")]
    MalformedObject {
        kind: &'static str,
        offset: usize,
        reason: String,
    },

    #[error("malformed key-value list at byte {offset}: {reason}")]
    MalformedKvlm { offset: usize, reason: String },

    #[error("{kind} is missing field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("invalid tree entry name: {0}")]
    InvalidEntryName(String),

    #[error("duplicate tree entry name: {0}")]
    DuplicateEntryName(String),

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

impl Error {
    pub(crate) fn malformed_kvlm(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedKvlm {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(digest: Digest, reason: impl Into<String>) -> Self {
        Error::CorruptObject {
            digest,
            reason: reason.into(),
        }
    }

    /// true when the error means the object is simply absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ObjectNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
