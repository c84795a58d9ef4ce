//! Bounds-checked big-endian reader

use std::io::{self, Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use super::check_width;
use crate::error::{Error, Result};

/// Sequential reader over a source of known length.
///
/// Every read checks the remaining byte count first, so a short source fails
/// with [`Error::TruncatedInput`] before anything is consumed or allocated.
pub struct BinaryReader<R: Read> {
    inner: R,
    position: u64,
    len: u64,
}

impl<'a> BinaryReader<Cursor<&'a [u8]>> {
    /// Create a reader over an in-memory buffer
    #[must_use]
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(Cursor::new(data), data.len() as u64)
    }
}

impl<R: Read> BinaryReader<R> {
    /// Wrap a source positioned at offset 0 that holds `len` bytes
    pub fn new(inner: R, len: u64) -> Self {
        Self {
            inner,
            position: 0,
            len,
        }
    }

    /// Current absolute offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left before the end of the source.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    fn ensure(&self, needed: u64) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(Error::TruncatedInput {
                offset: self.position,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// A short read from the inner source means it is smaller than `len`.
    fn map_io(&self, err: io::Error, needed: u64) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::TruncatedInput {
                offset: self.position,
                needed,
                available: 0,
            }
        } else {
            Error::Io(err)
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let value = self.inner.read_u8().map_err(|e| self.map_io(e, 1))?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let value = self
            .inner
            .read_u16::<BigEndian>()
            .map_err(|e| self.map_io(e, 2))?;
        self.position += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        let value = self
            .inner
            .read_u32::<BigEndian>()
            .map_err(|e| self.map_io(e, 4))?;
        self.position += 4;
        Ok(value)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        let value = self
            .inner
            .read_u64::<BigEndian>()
            .map_err(|e| self.map_io(e, 8))?;
        self.position += 8;
        Ok(value)
    }

    /// Read an unsigned integer of 1, 2, 4 or 8 bytes
    pub fn read_uint(&mut self, width: usize) -> Result<u64> {
        check_width(width)?;
        match width {
            1 => self.read_u8().map(u64::from),
            2 => self.read_u16().map(u64::from),
            4 => self.read_u32().map(u64::from),
            _ => self.read_u64(),
        }
    }

    /// Read an IEEE-754 single-precision float
    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        let value = self
            .inner
            .read_f32::<BigEndian>()
            .map_err(|e| self.map_io(e, 4))?;
        self.position += 4;
        Ok(value)
    }

    /// Read `n` raw bytes
    pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        self.ensure(n)?;
        let size = usize::try_from(n).map_err(|_| Error::TruncatedInput {
            offset: self.position,
            needed: n,
            available: self.remaining(),
        })?;
        let mut buf = vec![0u8; size];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| self.map_io(e, n))?;
        self.position += n;
        Ok(buf)
    }

    /// Read exactly `n` bytes and require every one of them to be ASCII
    pub fn read_fixed_ascii(&mut self, n: u64) -> Result<String> {
        let start = self.position;
        let bytes = self.read_bytes(n)?;
        if let Some(index) = bytes.iter().position(|b| !b.is_ascii()) {
            return Err(Error::InvalidEncoding {
                offset: start + index as u64,
                byte: bytes[index],
            });
        }
        Ok(bytes.into_iter().map(char::from).collect())
    }

    /// Read an 8-byte length followed by that many ASCII bytes
    pub fn read_length_prefixed_ascii(&mut self) -> Result<String> {
        let len = self.read_u64()?;
        self.read_fixed_ascii(len)
    }

    /// Advance past `n` bytes without interpreting them
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.ensure(n)?;
        let copied = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        if copied != n {
            return Err(Error::TruncatedInput {
                offset: self.position + copied,
                needed: n - copied,
                available: 0,
            });
        }
        self.position += n;
        Ok(())
    }
}
