//! Field encoders and decoders shared by every wire layout.
//!
//! Variable-length fields carry a 16-bit big-endian length prefix. Integers
//! are fixed-width big-endian. Public keys (32 bytes), addresses (26 bytes)
//! and key-type tags (1 byte) are written without any prefix, so decoders
//! read them at their hardcoded widths.

use super::CodecError;

/// Appends `len(bytes)` as a 16-bit big-endian prefix followed by `bytes`.
pub fn put_length_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), CodecError> {
    let len = u16::try_from(bytes.len()).map_err(|_| CodecError::FieldTooLong { len: bytes.len() })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// `len(bytes) || bytes` as a new vector.
pub fn length_prefixed_bytes(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    put_length_prefixed(&mut out, bytes)?;
    Ok(out)
}

/// UTF-8 encodes `s` and length-prefixes it.
pub fn length_prefixed_string(s: &str) -> Result<Vec<u8>, CodecError> {
    length_prefixed_bytes(s.as_bytes())
}

/// Reads a length-prefixed field at `offset`.
///
/// Returns the field contents and the offset just past it
/// (`offset + 2 + length`).
pub fn decode_length_prefixed(buf: &[u8], offset: usize) -> Result<(&[u8], usize), CodecError> {
    let mut reader = FieldReader::at(buf, offset);
    let field = reader.read_length_prefixed()?;
    Ok((field, reader.position()))
}

/// 8-byte big-endian encoding used for timestamps, fees, amounts and
/// expirations. The network reads these as signed longs; every value below
/// 2^63 has the same bit pattern either way.
pub fn long_to_bytes(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Inverse of [`long_to_bytes`]. Reads the first 8 bytes of `bytes`.
pub fn bytes_to_long(bytes: &[u8]) -> Result<u64, CodecError> {
    FieldReader::new(bytes).read_u64()
}

/// Bounds-checked cursor over an encoded buffer.
///
/// Every read either returns exactly the requested bytes or fails with
/// [`CodecError::TruncatedInput`]; nothing reads past the end.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, pos: offset }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let available = self.remaining();
        if len > available || self.pos > self.buf.len() {
            return Err(CodecError::TruncatedInput {
                needed: len,
                available,
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Reads a 16-bit length and then that many bytes. On truncation the
    /// cursor is left where it was.
    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8], CodecError> {
        let start = self.pos;
        let len = self.read_u16()? as usize;
        match self.read_bytes(len) {
            Ok(field) => Ok(field),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    pub fn read_length_prefixed_string(&mut self) -> Result<String, CodecError> {
        let bytes = self.read_length_prefixed()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    /// Everything from the cursor to the end of the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let start = self.pos.min(self.buf.len());
        self.pos = self.buf.len();
        &self.buf[start..]
    }
}
