//! Big-endian binary cursor shared by every Reverge format reader
//!
//! Every multi-byte value in the GFS family is big-endian, and every string is
//! an 8-byte length followed by that many ASCII bytes.

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

use crate::error::{Error, Result};

/// Size of the length prefix in front of every string.
pub const STRING_LENGTH_PREFIX: u64 = 8;

/// Chunk size used when streaming payloads.
pub const COPY_BUFFER_SIZE: usize = 4096;

/// Validate an integer width used by [`BinaryReader::read_uint`] and
/// [`BinaryWriter::write_uint`].
pub(crate) fn check_width(width: usize) -> Result<()> {
    match width {
        1 | 2 | 4 | 8 => Ok(()),
        other => Err(Error::UnsupportedWidth(other)),
    }
}

/// Serialized size of a length-prefixed string.
#[must_use]
pub fn length_prefixed_size(s: &str) -> u64 {
    STRING_LENGTH_PREFIX + s.len() as u64
}
