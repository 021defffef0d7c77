//! Error types for byte-level encoding and decoding.

use thiserror::Error;

/// Errors raised while converting between text encodings, raw bytes and
/// the fixed/length-prefixed fields of the wire layouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Malformed base58/base64/hex text (bad alphabet, odd-length hex, ...).
    #[error("invalid {encoding} input: {reason}")]
    Decode {
        /// Which text encoding was being decoded.
        encoding: &'static str,
        /// Decoder-supplied detail.
        reason: String,
    },

    /// A read ran past the end of the buffer.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Bytes the field declared (or the fixed width required).
        needed: usize,
        /// Bytes actually left in the buffer.
        available: usize,
    },

    /// An integer does not fit the fixed width it is encoded into.
    #[error("value {value} does not fit in {width} bytes")]
    Overflow {
        /// The offending value.
        value: u64,
        /// The field width in bytes.
        width: usize,
    },

    /// A variable-length field is longer than its 16-bit length prefix allows.
    #[error("field of {len} bytes exceeds the 65535 byte length prefix")]
    FieldTooLong {
        /// Length of the field that was rejected.
        len: usize,
    },

    /// A fixed-width field (public key, address) has the wrong size.
    #[error("invalid {field} length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Field name, for diagnostics.
        field: &'static str,
        /// Width the layout hardcodes.
        expected: usize,
        /// Width actually supplied.
        got: usize,
    },

    /// A string field did not contain valid UTF-8.
    #[error("field is not valid UTF-8")]
    InvalidUtf8,
}

impl CodecError {
    pub(crate) fn decode(encoding: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            encoding,
            reason: reason.to_string(),
        }
    }
}
