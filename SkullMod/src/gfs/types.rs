//! Types for GFS container handling

use std::path::PathBuf;

use serde::Serialize;

use super::FormatVersion;

/// Parsed fixed part of a container header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GfsHeader {
    /// Absolute offset where payload data begins
    pub data_offset: u32,
    /// Format version
    pub version: FormatVersion,
    /// Number of entries in the table
    pub entry_count: u64,
}

/// One packed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GfsEntry {
    /// Path inside the container, `/` separated
    pub path: String,
    /// Absolute offset of the payload (derived, not stored)
    pub offset: u64,
    /// Payload size in bytes
    pub length: u64,
    /// Alignment the payload start satisfies
    pub alignment: u32,
}

impl GfsEntry {
    /// Offset one past the last payload byte.
    ///
    /// Entries produced by the reader never overflow here.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }

    /// Whether the payload start honors the entry's alignment.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.offset % u64::from(self.alignment.max(1)) == 0
    }

    /// Last path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Header plus entry table of a decoded container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GfsMetadata {
    pub header: GfsHeader,
    pub entries: Vec<GfsEntry>,
    /// Bytes consumed by the header and entry table.
    ///
    /// Equal to `header.data_offset` in well-formed containers.
    pub header_bytes_read: u64,
}

impl GfsMetadata {
    /// Find an entry by its exact path
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&GfsEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Sum of all payload lengths.
    #[must_use]
    pub fn total_payload(&self) -> u64 {
        self.entries.iter().map(|e| e.length).sum()
    }

    /// End of the last payload, or the data offset for an empty container.
    #[must_use]
    pub fn payload_end(&self) -> u64 {
        self.entries
            .last()
            .map_or(u64::from(self.header.data_offset), GfsEntry::end)
    }
}

/// Summary of a container on disk
#[derive(Debug, Clone, Serialize)]
pub struct GfsArchiveInfo {
    pub path: PathBuf,
    /// Directory the container extracts to by default
    pub output_dir: PathBuf,
    pub container_len: u64,
    pub header: GfsHeader,
    pub header_bytes_read: u64,
    pub total_payload: u64,
    /// Distinct alignment values used by the entries, ascending
    pub alignments: Vec<u32>,
    pub largest: Vec<GfsEntry>,
}

/// Result of [`GfsOperations::verify`](super::GfsOperations::verify)
#[derive(Debug, Clone, Default, Serialize)]
pub struct GfsVerifyReport {
    pub entry_count: usize,
    /// Header bytes consumed vs. declared data offset, when they differ
    pub header_mismatch: Option<(u64, u32)>,
    /// Entries whose payload runs past the end of the container
    pub out_of_bounds: Vec<String>,
    /// Entries whose start violates their alignment
    pub misaligned: Vec<String>,
    /// Padding regions (start offset, length) containing non-zero bytes
    pub dirty_padding: Vec<(u64, u64)>,
    /// Bytes after the last padded payload
    pub trailing_bytes: u64,
}

impl GfsVerifyReport {
    /// No problems were found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.header_mismatch.is_none()
            && self.out_of_bounds.is_empty()
            && self.misaligned.is_empty()
            && self.dirty_padding.is_empty()
            && self.trailing_bytes == 0
    }
}

/// Progress information during GFS operations
#[derive(Debug, Clone)]
pub struct GfsProgress {
    /// Current operation phase
    pub phase: GfsPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Current file being processed (if applicable)
    pub current_file: Option<String>,
}

impl GfsProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: GfsPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    /// Create a progress update with a file/item name
    #[must_use]
    pub fn with_file(
        phase: GfsPhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }

    /// Get the progress percentage (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Phase of a GFS operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfsPhase {
    /// Reading header and entry table
    ReadingHeader,
    /// Scanning files in a directory (during packing)
    ScanningFiles,
    /// Computing header size and payload offsets
    ComputingLayout,
    /// Writing header to the container
    WritingHeader,
    /// Streaming payloads into the container
    WritingPayloads,
    /// Writing files to disk (during extraction)
    ExtractingFiles,
    /// Operation complete
    Complete,
}

impl GfsPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadingHeader => "Reading header",
            Self::ScanningFiles => "Scanning files",
            Self::ComputingLayout => "Computing layout",
            Self::WritingHeader => "Writing header",
            Self::WritingPayloads => "Writing payloads",
            Self::ExtractingFiles => "Extracting files",
            Self::Complete => "Complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, offset: u64, length: u64, alignment: u32) -> GfsEntry {
        GfsEntry {
            path: path.to_string(),
            offset,
            length,
            alignment,
        }
    }

    #[test]
    fn test_entry_helpers() {
        let e = entry("data/sprites/a.spr.msb", 4096, 10, 4096);
        assert_eq!(e.end(), 4106);
        assert!(e.is_aligned());
        assert_eq!(e.file_name(), "a.spr.msb");
        assert!(!entry("x", 100, 1, 4096).is_aligned());
    }

    #[test]
    fn test_metadata_totals() {
        let metadata = GfsMetadata {
            header: GfsHeader {
                data_offset: 80,
                version: FormatVersion::V1_1,
                entry_count: 2,
            },
            entries: vec![entry("a", 80, 3, 1), entry("b", 83, 5, 1)],
            header_bytes_read: 80,
        };
        assert_eq!(metadata.total_payload(), 8);
        assert_eq!(metadata.payload_end(), 88);
        assert_eq!(metadata.find("b").map(|e| e.offset), Some(83));
        assert!(metadata.find("c").is_none());
    }

    #[test]
    fn test_progress_percentage() {
        assert!((GfsProgress::new(GfsPhase::Complete, 0, 0).percentage() - 1.0).abs() < f32::EPSILON);
        let p = GfsProgress::with_file(GfsPhase::ExtractingFiles, 1, 4, "a.txt");
        assert!((p.percentage() - 0.25).abs() < f32::EPSILON);
        assert_eq!(p.current_file.as_deref(), Some("a.txt"));
    }
}
