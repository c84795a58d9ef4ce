//! GFS container writer
//!
//! Packing runs in two passes: the whole layout (header length and every
//! payload offset) is computed from file sizes first, then the header and the
//! payloads are streamed out. The stream position is checked against the
//! layout for every entry.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use super::alignment::{PaddingRule, align_offset, padding_for};
use super::{
    ENTRY_RECORD_OVERHEAD, FILE_IDENTIFIER, FIXED_HEADER_SIZE, FormatVersion, GfsEntry,
    GfsPhase, GfsProgress, GfsWriteOptions,
};
use crate::binary::BinaryWriter;
use crate::error::{Error, Result};
use crate::utils::path::relative_path;

/// Progress callback type for write operations
pub type WriteProgressCallback<'a> = &'a dyn Fn(&GfsProgress);

/// A file on disk that will become one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path inside the container, `/` separated
    pub relative_path: String,
    /// Where the bytes come from
    pub source_path: PathBuf,
    /// Size recorded during the scan
    pub size: u64,
}

/// Header length and payload offsets computed before anything is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfsLayout {
    /// Size of the header region, written as `data_offset`
    pub header_length: u32,
    /// Alignment shared by every entry
    pub alignment: u32,
    /// Padding formula used
    pub padding_rule: PaddingRule,
    /// Entries in write order, with their computed offsets
    pub entries: Vec<GfsEntry>,
    /// Total container size including trailing padding
    pub total_size: u64,
}

/// Header length for a set of entry paths.
#[must_use]
pub fn header_length<'a, I>(paths: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    FIXED_HEADER_SIZE
        + paths
            .into_iter()
            .map(|p| ENTRY_RECORD_OVERHEAD + p.len() as u64)
            .sum::<u64>()
}

/// Compute header length and payload offsets for `files`
///
/// # Errors
///
/// Returns [`Error::ValueOutOfRange`] if the header does not fit the 4-byte
/// data offset field, and [`Error::OffsetOverflow`] if offsets leave the
/// 64-bit range.
pub fn compute_layout(
    files: &[SourceFile],
    alignment: u32,
    padding_rule: PaddingRule,
) -> Result<GfsLayout> {
    let length = header_length(files.iter().map(|f| f.relative_path.as_str()));
    let header_length = u32::try_from(length).map_err(|_| Error::ValueOutOfRange {
        value: length,
        width: 4,
    })?;

    let mut entries = Vec::with_capacity(files.len());
    let mut running_offset = u64::from(header_length);
    for file in files {
        let overflow = || Error::OffsetOverflow {
            path: file.relative_path.clone(),
        };
        let offset = align_offset(running_offset, alignment, padding_rule).ok_or_else(overflow)?;
        running_offset = offset.checked_add(file.size).ok_or_else(overflow)?;
        entries.push(GfsEntry {
            path: file.relative_path.clone(),
            offset,
            length: file.size,
            alignment,
        });
    }

    // Trailing padding follows the last payload, or the header when empty
    let total_size = align_offset(running_offset, alignment, padding_rule).ok_or_else(|| {
        Error::OffsetOverflow {
            path: String::new(),
        }
    })?;

    Ok(GfsLayout {
        header_length,
        alignment,
        padding_rule,
        entries,
        total_size,
    })
}

/// GFS container writer
pub struct GfsWriter {
    /// Directory being packed
    root_path: PathBuf,
    /// Files to include, in write order
    files: Vec<SourceFile>,
    options: GfsWriteOptions,
}

impl GfsWriter {
    /// Scan `root_path` with default options (unaligned, sorted)
    pub fn new(root_path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(root_path, GfsWriteOptions::default())
    }

    /// Scan `root_path` for every regular file
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotADirectory`] if `root_path` is not a directory.
    /// Returns [`Error::InvalidEncoding`] if a relative path is not ASCII.
    pub fn with_options(root_path: impl Into<PathBuf>, options: GfsWriteOptions) -> Result<Self> {
        let root_path = root_path.into();
        if !root_path.is_dir() {
            return Err(Error::NotADirectory { path: root_path });
        }
        let files = Self::collect_files(&root_path, options.sort_entries)?;

        Ok(Self {
            root_path,
            files,
            options,
        })
    }

    /// Collect all regular files below `root`, with their sizes
    fn collect_files(root: &Path, sort: bool) -> Result<Vec<SourceFile>> {
        tracing::info!("Scanning directory: {}", root.display());

        let mut files = Vec::new();
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = relative_path(path, root)
                .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
            if let Some(byte) = relative.bytes().find(|b| !b.is_ascii()) {
                return Err(Error::InvalidEncoding { offset: 0, byte });
            }

            files.push(SourceFile {
                relative_path: relative,
                source_path: path.to_path_buf(),
                size: entry.metadata()?.len(),
            });
        }

        if sort {
            files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        }

        tracing::info!("Found {} files", files.len());
        Ok(files)
    }

    /// Get the number of files that will be written
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Get the root path
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Files in write order
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Layout the container will have
    pub fn layout(&self) -> Result<GfsLayout> {
        compute_layout(
            &self.files,
            self.options.alignment(),
            self.options.padding_rule,
        )
    }

    /// Write the container to `output_path`
    pub fn write(self, output_path: impl AsRef<Path>) -> Result<GfsLayout> {
        self.write_with_progress(output_path, &|_| {})
    }

    /// Write the container to `output_path` with progress callback
    ///
    /// The container is staged in a temporary file next to `output_path` and
    /// only moved into place once every payload has been written, so a failed
    /// write leaves an existing container untouched. A previous container that
    /// sits inside the source tree is not packed into the new one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DestinationConflict`] if `output_path` is a directory.
    /// Returns [`Error::SourceChanged`] if a source file changed size after the scan.
    pub fn write_with_progress(
        mut self,
        output_path: impl AsRef<Path>,
        progress: WriteProgressCallback,
    ) -> Result<GfsLayout> {
        let output_path = output_path.as_ref();

        if output_path.is_dir() {
            return Err(Error::DestinationConflict {
                path: output_path.to_path_buf(),
            });
        }
        if output_path.exists() {
            tracing::warn!("{} will be overwritten", output_path.display());
            self.exclude_output(output_path);
        }

        // Create parent directories if needed
        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut staged = NamedTempFile::new_in(parent)?;
        let layout = {
            let mut output = BufWriter::new(staged.as_file_mut());
            let layout = self.write_to(&mut output, progress)?;
            output.flush()?;
            layout
        };
        staged.persist(output_path).map_err(|e| Error::Io(e.error))?;

        tracing::info!(
            "GFS created: {} ({} entries, {} bytes)",
            output_path.display(),
            layout.entries.len(),
            layout.total_size
        );
        Ok(layout)
    }

    /// Drop the output container from the file list when it lies in the source tree
    fn exclude_output(&mut self, output_path: &Path) {
        let Ok(target) = output_path.canonicalize() else {
            return;
        };
        self.files.retain(|file| {
            let is_output = file
                .source_path
                .canonicalize()
                .is_ok_and(|path| path == target);
            if is_output {
                tracing::warn!("Not packing {}: it is the output container", file.relative_path);
            }
            !is_output
        });
    }

    /// Write the container into any sink
    pub fn write_to<W: Write>(&self, out: W, progress: WriteProgressCallback) -> Result<GfsLayout> {
        let total_files = self.files.len();

        progress(&GfsProgress::new(GfsPhase::ComputingLayout, 0, total_files));
        let layout = self.layout()?;
        let alignment = layout.alignment;
        let rule = layout.padding_rule;

        progress(&GfsProgress::new(GfsPhase::WritingHeader, 0, total_files));
        let mut writer = BinaryWriter::new(out);
        writer.write_u32(layout.header_length)?;
        writer.write_length_prefixed_ascii(FILE_IDENTIFIER)?;
        writer.write_length_prefixed_ascii(FormatVersion::default().as_str())?;
        writer.write_u64(total_files as u64)?;
        for entry in &layout.entries {
            writer.write_length_prefixed_ascii(&entry.path)?;
            writer.write_u64(entry.length)?;
            writer.write_u32(entry.alignment)?;
        }
        debug_assert_eq!(writer.position(), u64::from(layout.header_length));

        writer.write_zeros(padding_for(writer.position(), alignment, rule))?;

        for (i, (file, entry)) in self.files.iter().zip(&layout.entries).enumerate() {
            progress(&GfsProgress::with_file(
                GfsPhase::WritingPayloads,
                i + 1,
                total_files,
                entry.file_name(),
            ));
            debug_assert_eq!(writer.position(), entry.offset);

            Self::stream_file(&mut writer, file)?;
            writer.write_zeros(padding_for(writer.position(), alignment, rule))?;
        }
        writer.flush()?;

        progress(&GfsProgress::new(GfsPhase::Complete, total_files, total_files));
        Ok(layout)
    }

    /// Copy one source file, checking it still has the size the header records
    fn stream_file<W: Write>(writer: &mut BinaryWriter<W>, file: &SourceFile) -> Result<()> {
        let source = File::open(&file.source_path)?;
        let current_size = source.metadata()?.len();
        if current_size != file.size {
            return Err(Error::SourceChanged {
                path: file.source_path.clone(),
                expected: file.size,
                actual: current_size,
            });
        }

        let copied = writer.copy_from(&mut source.take(file.size))?;
        if copied != file.size {
            return Err(Error::SourceChanged {
                path: file.source_path.clone(),
                expected: file.size,
                actual: copied,
            });
        }
        tracing::debug!("Packed {} ({} bytes)", file.relative_path, copied);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str, size: u64) -> SourceFile {
        SourceFile {
            relative_path: path.to_string(),
            source_path: PathBuf::from(path),
            size,
        }
    }

    #[test]
    fn test_header_length() {
        assert_eq!(header_length([]), 51);
        assert_eq!(header_length(["a.txt"]), 51 + 8 + 5 + 8 + 4);
        assert_eq!(header_length(["a", "dir/b"]), 51 + 21 + 25);
    }

    #[test]
    fn test_layout_unaligned() {
        let files = [source("a.txt", 3), source("b", 10)];
        let layout = compute_layout(&files, 1, PaddingRule::Canonical).unwrap();
        assert_eq!(layout.header_length, 51 + 25 + 21);
        assert_eq!(layout.entries[0].offset, 97);
        assert_eq!(layout.entries[1].offset, 100);
        assert_eq!(layout.total_size, 110);
    }

    #[test]
    fn test_layout_aligned() {
        let files = [source("a", 1), source("b", 4096), source("c", 0), source("d", 5)];
        let layout = compute_layout(&files, 4096, PaddingRule::Canonical).unwrap();
        let offsets: Vec<u64> = layout.entries.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![4096, 8192, 12288, 12288]);
        assert_eq!(layout.total_size, 16384);
    }

    #[test]
    fn test_layout_legacy_rule() {
        let files = [source("a", 1)];
        let layout = compute_layout(&files, 4096, PaddingRule::Legacy).unwrap();
        // header 72 bytes, legacy pads by 72 instead of reaching 4096
        assert_eq!(layout.header_length, 72);
        assert_eq!(layout.entries[0].offset, 144);
        assert!(!layout.entries[0].is_aligned());
    }

    #[test]
    fn test_layout_empty() {
        let layout = compute_layout(&[], 4096, PaddingRule::Canonical).unwrap();
        assert_eq!(layout.header_length, 51);
        assert!(layout.entries.is_empty());
        assert_eq!(layout.total_size, 4096);
    }

    #[test]
    fn test_layout_overflow() {
        let files = [source("a", u64::MAX)];
        assert!(matches!(
            compute_layout(&files, 1, PaddingRule::Canonical),
            Err(Error::OffsetOverflow { .. })
        ));
    }

    #[test]
    fn test_output_inside_source_is_not_repacked() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("mods");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.txt"), b"abc").unwrap();
        let output = root.join("mods.gfs");

        let first = GfsWriter::new(&root).unwrap().write(&output).unwrap();
        let first_bytes = std::fs::read(&output).unwrap();
        assert_eq!(first.total_size, 79);

        let second = GfsWriter::new(&root).unwrap().write(&output).unwrap();
        assert_eq!(second, first);
        assert_eq!(std::fs::read(&output).unwrap(), first_bytes);
    }

    #[test]
    fn test_failed_write_keeps_previous_container() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("src");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.txt"), b"abc").unwrap();
        let output = dir.path().join("out.gfs");

        GfsWriter::new(&root).unwrap().write(&output).unwrap();
        let before = std::fs::read(&output).unwrap();

        let writer = GfsWriter::new(&root).unwrap();
        std::fs::write(root.join("a.txt"), b"grown").unwrap();
        assert!(matches!(
            writer.write(&output),
            Err(Error::SourceChanged {
                expected: 3,
                actual: 5,
                ..
            })
        ));

        assert_eq!(std::fs::read(&output).unwrap(), before);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 2, "{leftovers:?}");
    }

    mod round_trip {
        use super::super::*;
        use crate::gfs::{ALIGNED, decode, entry_bytes};
        use proptest::prelude::*;
        use proptest::test_runner::TestCaseError;

        /// Up to a dozen files, each at depth 0, 1 or 2
        fn file_set() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
            prop::collection::vec(
                (0u8..3, prop::collection::vec(any::<u8>(), 0..3000)),
                0..12,
            )
            .prop_map(|files| {
                files
                    .into_iter()
                    .enumerate()
                    .map(|(i, (depth, data))| {
                        let path = match depth {
                            0 => format!("f{i}.bin"),
                            1 => format!("dir/f{i}.bin"),
                            _ => format!("dir/sub{i}/f{i}.bin"),
                        };
                        (path, data)
                    })
                    .collect()
            })
        }

        fn check(
            files: &[(String, Vec<u8>)],
            aligned: bool,
        ) -> std::result::Result<(), TestCaseError> {
            let fail = |e: Error| TestCaseError::fail(e.to_string());

            let dir = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
            for (path, data) in files {
                let full = dir.path().join(path);
                std::fs::create_dir_all(full.parent().unwrap()).unwrap();
                std::fs::write(full, data).unwrap();
            }

            let options = GfsWriteOptions::new().with_aligned(aligned);
            let writer = GfsWriter::with_options(dir.path(), options).map_err(fail)?;
            let mut bytes = Vec::new();
            let layout = writer.write_to(&mut bytes, &|_| {}).map_err(fail)?;
            prop_assert_eq!(bytes.len() as u64, layout.total_size);

            let metadata = decode(&bytes).map_err(fail)?;
            let mut expected: Vec<&(String, Vec<u8>)> = files.iter().collect();
            expected.sort_by(|a, b| a.0.cmp(&b.0));
            prop_assert_eq!(metadata.entries.len(), expected.len());

            let alignment = if aligned { u64::from(ALIGNED) } else { 1 };
            for (entry, (path, data)) in metadata.entries.iter().zip(expected) {
                prop_assert_eq!(&entry.path, path);
                prop_assert_eq!(entry.length, data.len() as u64);
                prop_assert_eq!(u64::from(entry.alignment), alignment);
                prop_assert_eq!(entry.offset % alignment, 0);
                prop_assert_eq!(entry_bytes(&bytes, entry).map_err(fail)?, data.as_slice());
            }
            Ok(())
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(48))]

            #[test]
            fn unaligned_round_trip(files in file_set()) {
                check(&files, false)?;
            }

            #[test]
            fn aligned_round_trip(files in file_set()) {
                check(&files, true)?;
            }
        }
    }
}
