//! key-value list with message
//!
//! the line-oriented text format shared by commit and tag objects:
//!
//! ```text
//! tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147
//! parent 206941306e8a8af65b66eaaaea388a7ae24d49a0
//! author Someone <someone@example.com> 1527025023 +0200
//! gpgsig -----BEGIN PGP SIGNATURE-----
//!  iQIzBAABCAAdFiEExwXquOM8bWb4Q2zVGxM2FxoLkGQFAlsEjZQACgkQGxM2FxoL
//!  -----END PGP SIGNATURE-----
//!
//! message text
//! ```
//!
//! a value continues onto the next line when that line starts with a single
//! space. a key may repeat; its values are kept in source order.
//!
//! keys, values and the message are raw bytes and need not be UTF-8.

use std::fmt;

use crate::error::{Error, Result};

/// one or many values for a single key
///
/// a [`Kvlm`] only promotes to `Many` on a repeated key, so values taken
/// from one always hold at least one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Values {
    One(Vec<u8>),
    Many(Vec<Vec<u8>>),
}

impl Values {
    /// all values in order
    pub fn as_slice(&self) -> &[Vec<u8>] {
        match self {
            Values::One(v) => std::slice::from_ref(v),
            Values::Many(vs) => vs,
        }
    }

    /// first value, if any
    pub fn first(&self) -> Option<&[u8]> {
        self.as_slice().first().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, value: Vec<u8>) {
        match self {
            Values::One(existing) => {
                let first = std::mem::take(existing);
                *self = Values::Many(vec![first, value]);
            }
            Values::Many(vs) => vs.push(value),
        }
    }
}

/// ordered, duplicate-aware key/value mapping plus a trailing message
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kvlm {
    fields: Vec<(Vec<u8>, Values)>,
    message: Vec<u8>,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// parse a key-value list from raw bytes
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut kvlm = Kvlm::new();
        let mut pos = 0;

        loop {
            let space = find_byte(raw, pos, b' ');
            let newline = find_byte(raw, pos, b'\n');

            // a newline before any space marks the blank separator line
            let space = match (space, newline) {
                (Some(s), Some(n)) if s < n => s,
                (Some(s), None) => s,
                _ => {
                    if newline != Some(pos) {
                        return Err(Error::malformed_kvlm(
                            pos,
                            "expected blank line before message",
                        ));
                    }
                    kvlm.message = raw[pos + 1..].to_vec();
                    return Ok(kvlm);
                }
            };

            if space == pos {
                return Err(Error::malformed_kvlm(pos, "empty key"));
            }

            let value_start = space + 1;
            let end = find_value_end(raw, value_start)
                .ok_or_else(|| Error::malformed_kvlm(value_start, "unterminated value"))?;

            kvlm.append(&raw[pos..space], unfold(&raw[value_start..end]));

            pos = end + 1;
        }
    }

    /// serialize back to the on-disk byte form
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();

        for (key, values) in &self.fields {
            for value in values.as_slice() {
                out.extend_from_slice(key);
                out.push(b' ');
                fold(value, &mut out);
                out.push(b'\n');
            }
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    /// append a value, promoting an existing key to many values
    pub fn append(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((key, Values::One(value))),
        }
    }

    /// replace all values for a key, keeping its position if present
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = Values::One(value.into());
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => *values = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Values> {
        let key = key.as_ref();
        self.fields
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, v)| v)
    }

    /// first value for a key
    pub fn get_one(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.get(key).and_then(Values::first)
    }

    /// every value for a key, empty if absent
    pub fn get_all(&self, key: impl AsRef<[u8]>) -> &[Vec<u8>] {
        self.get(key).map(Values::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.get(key).is_some()
    }

    /// keys in first-occurrence order
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.fields.iter().map(|(k, _)| k.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Values)> {
        self.fields.iter().map(|(k, v)| (k.as_slice(), v))
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<Vec<u8>>) {
        self.message = message.into();
    }

    pub fn with_message(mut self, message: impl Into<Vec<u8>>) -> Self {
        self.message = message.into();
        self
    }

    /// number of distinct keys
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Kvlm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.serialize()))
    }
}

fn find_byte(raw: &[u8], from: usize, byte: u8) -> Option<usize> {
    raw.get(from..)?
        .iter()
        .position(|&b| b == byte)
        .map(|i| from + i)
}

/// index of the newline ending the value that starts at `start`
///
/// a newline followed by a space is a continuation, not a terminator.
fn find_value_end(raw: &[u8], start: usize) -> Option<usize> {
    let mut from = start;
    loop {
        let nl = find_byte(raw, from, b'\n')?;
        if raw.get(nl + 1) != Some(&b' ') {
            return Some(nl);
        }
        from = nl + 1;
    }
}

/// strip the space that opens each continuation line
fn unfold(folded: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(folded.len());
    let mut bytes = folded.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        value.push(b);
        if b == b'\n' && bytes.peek() == Some(&b' ') {
            bytes.next();
        }
    }
    value
}

/// indent every line after the first by one space
fn fold(value: &[u8], out: &mut Vec<u8>) {
    for &b in value {
        out.push(b);
        if b == b'\n' {
            out.push(b' ');
        }
    }
}
