//! Big-endian writer mirroring [`BinaryReader`](super::BinaryReader)

use std::io::{self, Read, Write};

use byteorder::{BigEndian, WriteBytesExt};

use super::{COPY_BUFFER_SIZE, check_width};
use crate::error::{Error, Result};

/// Sequential big-endian writer that tracks its absolute position.
pub struct BinaryWriter<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        self.position += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u16::<BigEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u32::<BigEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.inner.write_u64::<BigEndian>(value)?;
        self.position += 8;
        Ok(())
    }

    /// Write `value` as an unsigned integer of 1, 2, 4 or 8 bytes
    pub fn write_uint(&mut self, value: u64, width: usize) -> Result<()> {
        check_width(width)?;
        let out_of_range = || Error::ValueOutOfRange { value, width };
        match width {
            1 => self.write_u8(u8::try_from(value).map_err(|_| out_of_range())?),
            2 => self.write_u16(u16::try_from(value).map_err(|_| out_of_range())?),
            4 => self.write_u32(u32::try_from(value).map_err(|_| out_of_range())?),
            _ => self.write_u64(value),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Write an 8-byte length followed by the ASCII bytes of `s`
    pub fn write_length_prefixed_ascii(&mut self, s: &str) -> Result<()> {
        if let Some(byte) = s.bytes().find(|b| !b.is_ascii()) {
            return Err(Error::InvalidEncoding { offset: 0, byte });
        }
        self.write_u64(s.len() as u64)?;
        self.write_bytes(s.as_bytes())
    }

    /// Write `count` zero bytes
    pub fn write_zeros(&mut self, count: u64) -> Result<()> {
        let copied = io::copy(&mut io::repeat(0).take(count), &mut self.inner)?;
        self.position += copied;
        Ok(())
    }

    /// Copy everything from `source` through a fixed-size buffer
    ///
    /// Returns the number of bytes copied.
    pub fn copy_from<R: Read>(&mut self, source: &mut R) -> Result<u64> {
        let mut buf = [0u8; COPY_BUFFER_SIZE];
        let mut total = 0u64;
        loop {
            let read = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.write_bytes(&buf[..read])?;
            total += read as u64;
        }
        Ok(total)
    }
}
