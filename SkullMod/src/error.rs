//! Error types for `SkullMod`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `SkullMod` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Binary Cursor Errors ====================
    /// Ran out of bytes in the middle of a read.
    #[error("truncated input: needed {needed} bytes at offset {offset}, only {available} available")]
    TruncatedInput {
        /// Absolute offset where the read started.
        offset: u64,
        /// Number of bytes the read required.
        needed: u64,
        /// Number of bytes left in the source.
        available: u64,
    },

    /// A string field contained bytes outside the ASCII range.
    #[error("invalid encoding at offset {offset}: expected ASCII, found byte 0x{byte:02X}")]
    InvalidEncoding {
        /// Absolute offset of the offending byte (0 for writer-side strings).
        offset: u64,
        /// The first non-ASCII byte encountered.
        byte: u8,
    },

    /// Integer width other than 1, 2, 4 or 8 bytes.
    #[error("unsupported integer width: {0} bytes")]
    UnsupportedWidth(usize),

    /// A value does not fit in the requested integer width.
    #[error("value {value} does not fit in {width} bytes")]
    ValueOutOfRange {
        /// The value that was to be written.
        value: u64,
        /// The requested width in bytes.
        width: usize,
    },

    // ==================== GFS Container Errors ====================
    /// The declared data offset is smaller than the smallest possible header.
    #[error("header too short: data offset {data_offset} is below the minimum of {minimum}")]
    HeaderTooShort {
        /// The data offset read from the container.
        data_offset: u32,
        /// The smallest accepted data offset.
        minimum: u32,
    },

    /// The identifier length or identifier string does not match.
    #[error("not a GFS file: {reason}")]
    NotAGfsFile {
        /// Which part of the identifier check failed.
        reason: String,
    },

    /// The container declares a version this library cannot read.
    #[error("unsupported GFS version: {found:?} (supported: {supported})")]
    UnsupportedVersion {
        /// The version string found in the container.
        found: String,
        /// Comma-separated list of supported versions.
        supported: String,
    },

    /// An entry declares an alignment of zero.
    #[error("entry {path:?} has invalid alignment {alignment}")]
    InvalidAlignment {
        /// Path of the entry inside the container.
        path: String,
        /// The alignment value that was rejected.
        alignment: u32,
    },

    /// Offset arithmetic left the 64-bit range.
    #[error("offset overflow while laying out entry {path:?}")]
    OffsetOverflow {
        /// Path of the entry being laid out.
        path: String,
    },

    /// An entry path would escape the extraction directory.
    #[error("unsafe entry path in container: {0}")]
    UnsafeEntryPath(String),

    /// The requested entry is not in the container.
    #[error("entry not found in GFS: {0}")]
    EntryNotFound(String),

    /// Extraction finished but some entries failed.
    #[error("extraction failed for {failed} of {total} entries: {first_error}")]
    ExtractionPartialFailure {
        /// Number of entries attempted.
        total: usize,
        /// Number of entries that failed.
        failed: usize,
        /// The first error message encountered.
        first_error: String,
    },

    // ==================== Packing Errors ====================
    /// A directory already exists where the container should be written.
    #[error("destination conflict: {path} is an existing directory")]
    DestinationConflict {
        /// The requested output path.
        path: PathBuf,
    },

    /// The packing source is missing or is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that was expected to be a directory.
        path: PathBuf,
    },

    /// A source file changed size between layout and streaming.
    #[error("source file changed while packing: {path} (expected {expected} bytes, copied {actual})")]
    SourceChanged {
        /// The file that changed.
        path: PathBuf,
        /// Size recorded in the header.
        expected: u64,
        /// Bytes actually copied.
        actual: u64,
    },

    // ==================== File System Errors ====================
    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

impl Error {
    /// Shorthand for an [`Error::NotAGfsFile`] with the given reason.
    pub(crate) fn not_gfs(reason: impl Into<String>) -> Self {
        Error::NotAGfsFile {
            reason: reason.into(),
        }
    }
}

// Add conversion from walkdir::Error
impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

/// A specialized Result type for `SkullMod` operations.
pub type Result<T> = std::result::Result<T, Error>;
