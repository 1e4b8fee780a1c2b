//! Byte streams used by stub element types to encode their payloads.
//!
//! Integers are LEB128-style varints (7-bit groups, MSB marks continuation),
//! strings and byte blobs are varint-length-prefixed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unexpected end of stream at byte {at}")]
    UnexpectedEof { at: usize },
    #[error("varint too long at byte {at}")]
    VarintOverflow { at: usize },
    #[error("invalid utf-8 at byte {at}")]
    InvalidUtf8 { at: usize },
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Default, Clone)]
pub struct StubOutputStream {
    buf: Vec<u8>,
}

impl StubOutputStream {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn write_var_u32(&mut self, v: u32) {
        self.write_var_u64(v as u64);
    }

    pub fn write_var_u64(&mut self, mut v: u64) {
        while v >= 0x80 {
            self.buf.push((v as u8 & 0x7F) | 0x80);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }

    /// Zigzag-encoded signed varint.
    pub fn write_var_i64(&mut self, v: i64) {
        self.write_var_u64(((v << 1) ^ (v >> 63)) as u64);
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_opt_str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.write_bool(true);
                self.write_str(s);
            }
            None => self.write_bool(false),
        }
    }

    /// Length-prefixed blob.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_var_u64(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Raw bytes, no prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug, Clone)]
pub struct StubInputStream<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> StubInputStream<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(CodecError::UnexpectedEof { at: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidValue(format!("bool byte {other}"))),
        }
    }

    pub fn read_var_u32(&mut self) -> CodecResult<u32> {
        let at = self.pos;
        let v = self.read_var_u64()?;
        u32::try_from(v).map_err(|_| CodecError::VarintOverflow { at })
    }

    pub fn read_var_u64(&mut self) -> CodecResult<u64> {
        let at = self.pos;
        let mut shift = 0u32;
        let mut out = 0u64;
        loop {
            let b = self.read_u8()?;
            out |= ((b & 0x7F) as u64) << shift;
            if b & 0x80 == 0 {
                return Ok(out);
            }
            shift += 7;
            if shift >= 64 {
                return Err(CodecError::VarintOverflow { at });
            }
        }
    }

    pub fn read_var_i64(&mut self) -> CodecResult<i64> {
        let v = self.read_var_u64()?;
        Ok(((v >> 1) as i64) ^ -((v & 1) as i64))
    }

    pub fn read_str(&mut self) -> CodecResult<&'a str> {
        let at = self.pos;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { at })
    }

    pub fn read_string(&mut self) -> CodecResult<String> {
        self.read_str().map(str::to_string)
    }

    pub fn read_opt_string(&mut self) -> CodecResult<Option<String>> {
        if self.read_bool()? {
            self.read_string().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_bytes(&mut self) -> CodecResult<&'a [u8]> {
        let at = self.pos;
        let len = self.read_var_u64()?;
        let len = usize::try_from(len).map_err(|_| CodecError::VarintOverflow { at })?;
        self.read_raw(len)
    }

    pub fn read_raw(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(CodecError::UnexpectedEof {
                at: self.bytes.len(),
            })?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_boundaries() {
        let mut out = StubOutputStream::new();
        for v in [0u64, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            out.write_var_u64(v);
        }
        let bytes = out.into_bytes();
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 127);
        assert_eq!(&bytes[2..4], &[0x80, 0x01]);

        let mut input = StubInputStream::new(&bytes);
        for v in [0u64, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(input.read_var_u64().unwrap(), v);
        }
        assert!(input.is_at_end());
    }

    #[test]
    fn zigzag_signed() {
        let mut out = StubOutputStream::new();
        out.write_var_i64(-1);
        out.write_var_i64(i64::MIN);
        out.write_var_i64(63);
        let bytes = out.into_bytes();
        assert_eq!(bytes[0], 1);

        let mut input = StubInputStream::new(&bytes);
        assert_eq!(input.read_var_i64().unwrap(), -1);
        assert_eq!(input.read_var_i64().unwrap(), i64::MIN);
        assert_eq!(input.read_var_i64().unwrap(), 63);
    }

    #[test]
    fn truncated_string_is_eof() {
        let mut out = StubOutputStream::new();
        out.write_str("hello");
        let bytes = out.into_bytes();
        let mut input = StubInputStream::new(&bytes[..3]);
        assert!(matches!(
            input.read_str(),
            Err(CodecError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn optional_strings_and_bools() {
        let mut out = StubOutputStream::new();
        out.write_opt_str(Some("v"));
        out.write_opt_str(None);
        out.write_u8(7);
        let bytes = out.into_bytes();

        let mut input = StubInputStream::new(&bytes);
        assert_eq!(input.read_opt_string().unwrap().as_deref(), Some("v"));
        assert_eq!(input.read_opt_string().unwrap(), None);
        assert!(input.read_bool().is_err());
    }

    #[test]
    fn overlong_varint_is_rejected() {
        let bytes = [0xFFu8; 11];
        let mut input = StubInputStream::new(&bytes);
        assert!(matches!(
            input.read_var_u64(),
            Err(CodecError::VarintOverflow { .. })
        ));
    }
}
