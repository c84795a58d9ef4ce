//! GFS container reader
//!
//! Metadata decoding never touches payload bytes; payloads are fetched later
//! with positioned reads, so a subset of entries can be pulled out of a large
//! container cheaply.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::alignment::{PaddingRule, align_offset};
use super::{
    ENTRY_RECORD_OVERHEAD, FILE_IDENTIFIER, FormatVersion, GfsEntry, GfsHeader, GfsMetadata,
    MIN_DATA_OFFSET,
};
use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};

/// Decode the header and entry table from a cursor positioned at offset 0
///
/// # Errors
///
/// Returns [`Error::HeaderTooShort`] if the data offset is below 48.
/// Returns [`Error::NotAGfsFile`] if the identifier length or text is wrong.
/// Returns [`Error::UnsupportedVersion`] for versions other than `1.1`.
/// Returns [`Error::TruncatedInput`] if the header ends early.
/// Returns [`Error::InvalidAlignment`] for an entry alignment of 0.
pub fn read_metadata<R: Read>(reader: &mut BinaryReader<R>) -> Result<GfsMetadata> {
    let data_offset = reader.read_u32()?;
    if data_offset < MIN_DATA_OFFSET {
        return Err(Error::HeaderTooShort {
            data_offset,
            minimum: MIN_DATA_OFFSET,
        });
    }

    // Length first, so a garbage length never drives a read
    let identifier_len = reader.read_u64()?;
    if identifier_len != FILE_IDENTIFIER.len() as u64 {
        return Err(Error::not_gfs(format!(
            "identifier length {identifier_len}, expected {}",
            FILE_IDENTIFIER.len()
        )));
    }
    let identifier = reader.read_bytes(identifier_len)?;
    if identifier != FILE_IDENTIFIER.as_bytes() {
        return Err(Error::not_gfs(format!(
            "identifier {:?}, expected {FILE_IDENTIFIER:?}",
            String::from_utf8_lossy(&identifier)
        )));
    }

    let version_str = reader.read_length_prefixed_ascii()?;
    let version = FormatVersion::parse(&version_str).ok_or_else(|| Error::UnsupportedVersion {
        found: version_str.clone(),
        supported: FormatVersion::supported_list(),
    })?;

    let entry_count = reader.read_u64()?;
    let header = GfsHeader {
        data_offset,
        version,
        entry_count,
    };

    // Each record is at least 20 bytes, which caps the allocation for bogus counts
    let capacity = entry_count.min(reader.remaining() / ENTRY_RECORD_OVERHEAD);
    let mut entries = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));

    let mut running_offset = u64::from(data_offset);
    for _ in 0..entry_count {
        let path = reader.read_length_prefixed_ascii()?;
        let length = reader.read_u64()?;
        let alignment = reader.read_u32()?;
        if alignment == 0 {
            return Err(Error::InvalidAlignment { path, alignment });
        }

        let Some(offset) = align_offset(running_offset, alignment, PaddingRule::Canonical) else {
            return Err(Error::OffsetOverflow { path });
        };
        let Some(next) = offset.checked_add(length) else {
            return Err(Error::OffsetOverflow { path });
        };
        running_offset = next;

        tracing::debug!("GFS entry {path}: offset {offset}, {length} bytes, align {alignment}");
        entries.push(GfsEntry {
            path,
            offset,
            length,
            alignment,
        });
    }

    let header_bytes_read = reader.position();
    if header_bytes_read != u64::from(data_offset) {
        tracing::warn!(
            "GFS header is {header_bytes_read} bytes but declares data offset {data_offset}"
        );
    }

    Ok(GfsMetadata {
        header,
        entries,
        header_bytes_read,
    })
}

/// Decode the metadata of an in-memory container
///
/// # Errors
/// See [`read_metadata`].
pub fn decode(data: &[u8]) -> Result<GfsMetadata> {
    read_metadata(&mut BinaryReader::from_slice(data))
}

/// Borrow an entry's payload out of an in-memory container
///
/// # Errors
/// Returns [`Error::TruncatedInput`] if the payload runs past the end of `data`.
pub fn entry_bytes<'a>(data: &'a [u8], entry: &GfsEntry) -> Result<&'a [u8]> {
    check_bounds(entry, data.len() as u64)?;
    let start = usize::try_from(entry.offset).map_err(|_| truncated(entry, data.len() as u64))?;
    let end = usize::try_from(entry.end()).map_err(|_| truncated(entry, data.len() as u64))?;
    Ok(&data[start..end])
}

fn truncated(entry: &GfsEntry, container_len: u64) -> Error {
    Error::TruncatedInput {
        offset: entry.offset,
        needed: entry.length,
        available: container_len.saturating_sub(entry.offset),
    }
}

fn check_bounds(entry: &GfsEntry, container_len: u64) -> Result<()> {
    match entry.offset.checked_add(entry.length) {
        Some(end) if end <= container_len => Ok(()),
        _ => Err(truncated(entry, container_len)),
    }
}

/// GFS container reader over any seekable source
pub struct GfsReader<R: Read + Seek> {
    reader: R,
    len: u64,
    /// Container path, used to derive the default output directory
    path: Option<PathBuf>,
    metadata: Option<GfsMetadata>,
}

impl GfsReader<File> {
    /// Open a container on disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            reader: file,
            len,
            path: Some(path.to_path_buf()),
            metadata: None,
        })
    }
}

impl<R: Read + Seek> GfsReader<R> {
    /// Create a reader over a source holding `len` bytes
    pub fn new(reader: R, len: u64) -> Self {
        Self {
            reader,
            len,
            path: None,
            metadata: None,
        }
    }

    /// Total container length.
    pub fn container_len(&self) -> u64 {
        self.len
    }

    /// Directory the container extracts to by default: its path without the extension.
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.path.as_deref().map(super::GfsOperations::output_dir_for)
    }

    /// Read and validate the header and entry table (cached after the first call)
    ///
    /// # Errors
    /// See [`read_metadata`].
    pub fn read_metadata(&mut self) -> Result<&GfsMetadata> {
        let metadata = match self.metadata.take() {
            Some(metadata) => metadata,
            None => {
                self.reader.seek(SeekFrom::Start(0))?;
                let mut cursor = BinaryReader::new(BufReader::new(&mut self.reader), self.len);
                let metadata = read_metadata(&mut cursor)?;
                tracing::debug!(
                    "Read GFS header: {} entries, data offset {}",
                    metadata.entries.len(),
                    metadata.header.data_offset
                );
                metadata
            }
        };
        Ok(self.metadata.insert(metadata))
    }

    /// Entry table, decoding it first if needed
    pub fn entries(&mut self) -> Result<&[GfsEntry]> {
        Ok(&self.read_metadata()?.entries)
    }

    /// Look up an entry by exact path
    pub fn find_entry(&mut self, path: &str) -> Result<GfsEntry> {
        self.read_metadata()?
            .find(path)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))
    }

    /// Stream one entry's payload into `out`
    ///
    /// # Errors
    /// Returns [`Error::TruncatedInput`] if the payload extends past the container end.
    pub fn copy_entry<W: Write>(&mut self, entry: &GfsEntry, out: W) -> Result<u64> {
        check_bounds(entry, self.len)?;
        self.reader.seek(SeekFrom::Start(entry.offset))?;

        let mut writer = BinaryWriter::new(out);
        let copied = writer.copy_from(&mut (&mut self.reader).take(entry.length))?;
        writer.flush()?;
        if copied != entry.length {
            return Err(Error::TruncatedInput {
                offset: entry.offset + copied,
                needed: entry.length - copied,
                available: 0,
            });
        }
        Ok(copied)
    }

    /// Read one entry's payload into memory
    pub fn read_entry(&mut self, entry: &GfsEntry) -> Result<Vec<u8>> {
        check_bounds(entry, self.len)?;
        let capacity = usize::try_from(entry.length).map_err(|_| truncated(entry, self.len))?;
        let mut data = Vec::with_capacity(capacity);
        self.copy_entry(entry, &mut data)?;
        Ok(data)
    }

    /// Read raw bytes at an absolute offset (used to inspect padding)
    pub(crate) fn read_at(&mut self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let region = GfsEntry {
            path: String::new(),
            offset,
            length,
            alignment: 1,
        };
        self.read_entry(&region)
    }
}
