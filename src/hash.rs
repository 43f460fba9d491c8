use serde::{Deserialize, Serialize};
use sha1::{Digest as _, Sha1};
use std::fmt;

use crate::types::ObjectKind;
use crate::Error;

/// length of a raw digest in bytes
pub const DIGEST_LEN: usize = 20;

/// SHA-1 digest used for content addressing
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// zero digest (useful as sentinel)
    pub const ZERO: Digest = Digest([0u8; DIGEST_LEN]);

    /// create from raw bytes
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// create from a raw slice, which must be exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// parse from hex string
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        Self::from_hex_bytes(s.as_bytes())
    }

    /// parse from hex text held as raw bytes, e.g. a commit field value
    pub fn from_hex_bytes(text: &[u8]) -> crate::Result<Self> {
        let invalid = || Error::InvalidHashHex(String::from_utf8_lossy(text).into_owned());
        let bytes = hex::decode(text).map_err(|_| invalid())?;
        Self::from_slice(&bytes).ok_or_else(invalid)
    }

    /// get raw bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// split into path components for object store
    /// returns (first 2 hex chars, remaining 38 hex chars)
    pub fn to_path_components(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..12])
    }
}

impl std::str::FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// build the canonical header `<kind> <len>\0`
pub fn object_header(kind: ObjectKind, payload_len: usize) -> Vec<u8> {
    format!("{} {}\0", kind, payload_len).into_bytes()
}

/// compute the digest of an object from its kind and payload
///
/// the digest covers the canonical header followed by the payload, so
/// the same bytes stored as a blob and as a tree hash differently.
pub fn compute_object_hash(kind: ObjectKind, payload: &[u8]) -> Digest {
    let mut hasher = ObjectHasher::new(kind, payload.len());
    hasher.update(payload);
    hasher.finalize()
}

/// hash of an already assembled canonical byte form
pub fn compute_canonical_hash(canonical: &[u8]) -> Digest {
    Digest(Sha1::digest(canonical).into())
}

/// streaming object hasher for payloads that arrive in pieces
pub struct ObjectHasher {
    hasher: Sha1,
}

impl ObjectHasher {
    /// create new hasher, writing the header immediately
    pub fn new(kind: ObjectKind, payload_len: usize) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(object_header(kind, payload_len));
        Self { hasher }
    }

    /// feed payload bytes
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// finalize and return digest
    pub fn finalize(self) -> Digest {
        Digest(self.hasher.finalize().into())
    }
}
