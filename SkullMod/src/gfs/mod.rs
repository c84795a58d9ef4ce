//! GFS container ("Reverge Package File") reader/writer
//!
//! A `.gfs` container is a big-endian header listing every packed file
//! (path, length, alignment) followed by the concatenated payloads. Payload
//! offsets are not stored; they are derived while walking the header.

pub mod alignment;
mod batch;
mod operations;
mod options;
mod reader;
mod types;
mod writer;

pub use alignment::{PaddingRule, align_offset, padding_for};
pub use batch::{
    BatchGfsResult, batch_create, batch_extract, find_gfs_files, find_packable_folders,
};
pub use operations::{GfsOperations, ProgressCallback};
pub use options::{GfsExtractOptions, GfsWriteOptions};
pub use reader::{GfsReader, decode, entry_bytes, read_metadata};
pub use types::*;
pub use writer::{GfsLayout, GfsWriter, SourceFile, compute_layout, header_length};

/// Identifier string every container starts with.
pub const FILE_IDENTIFIER: &str = "Reverge Package File";

/// File extension of containers (without the dot).
pub const FILE_EXTENSION: &str = "gfs";

/// Smallest `data_offset` a well-formed container can declare.
pub const MIN_DATA_OFFSET: u32 = 48;

/// Header size with zero entries: data offset (4), identifier (8 + 20),
/// version (8 + 3), entry count (8).
pub const FIXED_HEADER_SIZE: u64 = 51;

/// Per-entry header overhead excluding the path bytes: path length (8),
/// byte length (8), alignment (4).
pub const ENTRY_RECORD_OVERHEAD: u64 = 20;

/// Alignment used by the game for streamed packages.
pub const ALIGNED: u32 = 4096;

/// Alignment meaning "no padding".
pub const UNALIGNED: u32 = 1;

/// Container format versions this library understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum FormatVersion {
    /// Version `1.1`, the only one shipped by the game.
    #[default]
    #[serde(rename = "1.1")]
    V1_1,
}

impl FormatVersion {
    /// Every recognized version, newest last.
    pub const ALL: &'static [FormatVersion] = &[FormatVersion::V1_1];

    /// The version string as stored in the container.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FormatVersion::V1_1 => "1.1",
        }
    }

    /// Match a version string read from a container
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }

    /// Comma-separated list of supported versions, for error messages.
    #[must_use]
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
