//! # Binary
//!
//! [`Binary`] is the byte buffer every other module builds on. It is a thin
//! owned wrapper around `Vec<u8>` that knows how to render itself as
//! base58, base64, hex and UTF-8, and how to hash itself with SHA-256.
//!
//! Every transform (`slice`, `reverse`, `concat`) returns a new buffer; no
//! view mutates the bytes it was derived from.
//!
//! The [`codec`] submodule holds the field-level encoders shared by the
//! transaction and message wire layouts.

pub mod codec;
pub mod error;

use std::fmt;
use std::ops::Deref;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::crypto::hash::sha256;

pub use codec::FieldReader;
pub use error::CodecError;

/// An owned byte sequence with multi-encoding accessors.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Binary(Vec<u8>);

impl Binary {
    /// An empty buffer.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wraps raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// UTF-8 encodes `s`.
    pub fn from_string(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }

    /// A zero-filled buffer of `len` bytes.
    pub fn from_length(len: usize) -> Self {
        Self(vec![0u8; len])
    }

    pub fn from_base58(s: &str) -> Result<Self, CodecError> {
        bs58::decode(s)
            .into_vec()
            .map(Self)
            .map_err(|e| CodecError::decode("base58", e))
    }

    pub fn from_base64(s: &str) -> Result<Self, CodecError> {
        BASE64
            .decode(s)
            .map(Self)
            .map_err(|e| CodecError::decode("base64", e))
    }

    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| CodecError::decode("hex", e))
    }

    /// Big-endian 16-bit integer.
    pub fn from_int16(value: u16) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    /// Big-endian 32-bit integer.
    pub fn from_int32(value: u32) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    /// Encodes a non-negative integer big-endian in exactly `width` bytes.
    ///
    /// Fails with [`CodecError::Overflow`] when `value` needs more than
    /// `width` bytes. Widths outside `1..=8` are rejected.
    pub fn from_fixed_width_integer(value: u64, width: usize) -> Result<Self, CodecError> {
        if width == 0 || width > 8 {
            return Err(CodecError::InvalidLength {
                field: "integer width",
                expected: 8,
                got: width,
            });
        }
        if width < 8 && value >> (8 * width) != 0 {
            return Err(CodecError::Overflow { value, width });
        }
        Ok(Self(value.to_be_bytes()[8 - width..].to_vec()))
    }

    /// Ordered concatenation of `parts` into a fresh buffer.
    pub fn concat<T: AsRef<[u8]>>(parts: &[T]) -> Self {
        let len = parts.iter().map(|p| p.as_ref().len()).sum();
        let mut out = Vec::with_capacity(len);
        for part in parts {
            out.extend_from_slice(part.as_ref());
        }
        Self(out)
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Decodes the bytes as UTF-8, replacing invalid sequences with U+FFFD.
    pub fn to_utf8_string(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// SHA-256 digest of the contents.
    pub fn hash(&self) -> Binary {
        Self(sha256(&self.0))
    }

    /// Copies `start..end` into a new buffer. Bounds are clamped to the
    /// buffer length, so an out-of-range slice is empty rather than a panic.
    pub fn slice(&self, start: usize, end: usize) -> Binary {
        let end = end.min(self.0.len());
        let start = start.min(end);
        Self(self.0[start..end].to_vec())
    }

    /// A reversed copy.
    pub fn reverse(&self) -> Binary {
        Self(self.0.iter().rev().copied().collect())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Binary {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Binary {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Binary {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Binary {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Binary {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<Binary> for Vec<u8> {
    fn from(binary: Binary) -> Self {
        binary.0
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binary({})", self.to_hex())
    }
}
