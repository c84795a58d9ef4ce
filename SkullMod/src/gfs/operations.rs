//! High-level GFS container operations

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::{
    FILE_EXTENSION, GfsArchiveInfo, GfsEntry, GfsExtractOptions, GfsLayout, GfsPhase,
    GfsProgress, GfsReader, GfsVerifyReport, GfsWriteOptions, GfsWriter,
};
use crate::error::{Error, Result};
use crate::utils::path::{entry_matches, entry_output_path};

/// Progress callback for GFS operations.
///
/// Receives a [`GfsProgress`] struct with phase, current/total counts, and optional filename.
///
/// # Example
/// ```ignore
/// use skullmod::gfs::{GfsOperations, GfsPhase};
///
/// GfsOperations::extract_with_progress(gfs, dest, &|progress| {
///     if progress.phase == GfsPhase::ExtractingFiles {
///         println!("{}/{}: {:?}", progress.current, progress.total, progress.current_file);
///     }
/// })?;
/// ```
pub type ProgressCallback<'a> = &'a dyn Fn(&GfsProgress);

/// Padding regions larger than this are not scanned by [`GfsOperations::verify`].
const MAX_PADDING_SCAN: u64 = 1 << 20;

/// High-level GFS container operations.
pub struct GfsOperations;

impl GfsOperations {
    /// Directory a container extracts to by default: its path without the extension
    #[must_use]
    pub fn output_dir_for(gfs_path: &Path) -> PathBuf {
        gfs_path.with_extension("")
    }

    /// Container path a directory packs to by default: `<dir>.gfs`
    #[must_use]
    pub fn default_container_path(source_dir: &Path) -> PathBuf {
        let mut path = source_dir.as_os_str().to_owned();
        path.push(".");
        path.push(FILE_EXTENSION);
        PathBuf::from(path)
    }

    /// List entry paths of a container
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the container cannot be opened.
    /// Returns [`Error::NotAGfsFile`], [`Error::UnsupportedVersion`],
    /// [`Error::HeaderTooShort`] or [`Error::TruncatedInput`] if the header is invalid.
    pub fn list<P: AsRef<Path>>(gfs_path: P) -> Result<Vec<String>> {
        Ok(Self::list_detailed(gfs_path)?
            .into_iter()
            .map(|e| e.path)
            .collect())
    }

    /// List entries with offsets, lengths and alignments
    pub fn list_detailed<P: AsRef<Path>>(gfs_path: P) -> Result<Vec<GfsEntry>> {
        let mut reader = GfsReader::open(gfs_path)?;
        Ok(reader.entries()?.to_vec())
    }

    /// Summarize a container without extracting it
    pub fn inspect<P: AsRef<Path>>(gfs_path: P) -> Result<GfsArchiveInfo> {
        let gfs_path = gfs_path.as_ref();
        let mut reader = GfsReader::open(gfs_path)?;
        let container_len = reader.container_len();
        let metadata = reader.read_metadata()?;

        let alignments: BTreeSet<u32> = metadata.entries.iter().map(|e| e.alignment).collect();
        let mut largest: Vec<GfsEntry> = metadata.entries.clone();
        largest.sort_by_key(|e| std::cmp::Reverse(e.length));
        largest.truncate(10);

        Ok(GfsArchiveInfo {
            path: gfs_path.to_path_buf(),
            output_dir: Self::output_dir_for(gfs_path),
            container_len,
            header: metadata.header.clone(),
            header_bytes_read: metadata.header_bytes_read,
            total_payload: metadata.total_payload(),
            alignments: alignments.into_iter().collect(),
            largest,
        })
    }

    /// Extract a container to a directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the container cannot be opened or the output directory cannot be created.
    /// Returns a header error ([`Error::NotAGfsFile`] etc.) if the container is invalid.
    /// Returns [`Error::UnsafeEntryPath`] or [`Error::TruncatedInput`] before writing
    /// anything if any entry is unsafe or out of bounds.
    /// Returns [`Error::ExtractionPartialFailure`] if some entries could not be written.
    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(gfs_path: P, output_dir: Q) -> Result<()> {
        Self::extract_with_progress(gfs_path, output_dir, &|_| {})
    }

    /// Extract a container to a directory with progress callback
    pub fn extract_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
        gfs_path: P,
        output_dir: Q,
        progress: ProgressCallback,
    ) -> Result<()> {
        Self::extract_with_options(gfs_path, output_dir, &GfsExtractOptions::default(), progress)
            .map(|_| ())
    }

    /// Extract into the container's default directory (its path without extension)
    ///
    /// Returns the directory written to.
    pub fn extract_to_default_dir<P: AsRef<Path>>(gfs_path: P) -> Result<PathBuf> {
        let output_dir = Self::output_dir_for(gfs_path.as_ref());
        Self::extract(gfs_path.as_ref(), &output_dir)?;
        Ok(output_dir)
    }

    /// Extract entries selected by `options`
    ///
    /// Returns the number of files written.
    pub fn extract_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
        gfs_path: P,
        output_dir: Q,
        options: &GfsExtractOptions,
        progress: ProgressCallback,
    ) -> Result<usize> {
        let mut reader = GfsReader::open(gfs_path.as_ref())?;

        progress(&GfsProgress::new(GfsPhase::ReadingHeader, 1, 1));
        let selected: Vec<GfsEntry> = reader
            .entries()?
            .iter()
            .filter(|e| {
                options
                    .filter
                    .as_deref()
                    .is_none_or(|pattern| entry_matches(pattern, &e.path))
            })
            .cloned()
            .collect();

        Self::extract_entries(&mut reader, &selected, output_dir.as_ref(), options.overwrite, progress)
    }

    /// Extract only the named entries
    ///
    /// Names that are not in the container are skipped with a warning.
    ///
    /// # Errors
    /// Returns [`Error::EntryNotFound`] if none of the names exist.
    pub fn extract_files<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<str>>(
        gfs_path: P,
        output_dir: Q,
        names: &[S],
        progress: ProgressCallback,
    ) -> Result<usize> {
        let mut reader = GfsReader::open(gfs_path.as_ref())?;

        progress(&GfsProgress::new(GfsPhase::ReadingHeader, 1, 1));
        let metadata = reader.read_metadata()?;
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref().replace('\\', "/");
            match metadata.find(&name) {
                Some(entry) => selected.push(entry.clone()),
                None => tracing::warn!("Entry not found in GFS: {name}"),
            }
        }
        if selected.is_empty() {
            let requested: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
            return Err(Error::EntryNotFound(requested.join(", ")));
        }

        Self::extract_entries(&mut reader, &selected, output_dir.as_ref(), true, progress)
    }

    /// Validate every selected entry, then write them out one by one
    fn extract_entries(
        reader: &mut GfsReader<File>,
        entries: &[GfsEntry],
        output_dir: &Path,
        overwrite: bool,
        progress: ProgressCallback,
    ) -> Result<usize> {
        // A corrupt table is rejected before any file is created
        let container_len = reader.container_len();
        let mut targets = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.offset.checked_add(entry.length).is_none_or(|end| end > container_len) {
                return Err(Error::TruncatedInput {
                    offset: entry.offset,
                    needed: entry.length,
                    available: container_len.saturating_sub(entry.offset),
                });
            }
            targets.push(entry_output_path(output_dir, &entry.path)?);
        }

        std::fs::create_dir_all(output_dir)?;

        let total = entries.len();
        let mut written = 0usize;
        let mut errors: Vec<(String, String)> = Vec::new();

        for (i, (entry, target)) in entries.iter().zip(&targets).enumerate() {
            progress(&GfsProgress::with_file(
                GfsPhase::ExtractingFiles,
                i + 1,
                total,
                entry.file_name(),
            ));

            if !overwrite && target.exists() {
                tracing::warn!("Skipping existing file: {}", target.display());
                continue;
            }

            match Self::extract_one(reader, entry, target) {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!("Failed to extract {}: {}", entry.path, e);
                    errors.push((entry.path.clone(), e.to_string()));
                }
            }
        }

        progress(&GfsProgress::new(GfsPhase::Complete, total, total));

        if let Some((path, message)) = errors.first() {
            return Err(Error::ExtractionPartialFailure {
                total,
                failed: errors.len(),
                first_error: format!("{path}: {message}"),
            });
        }

        tracing::info!("Extracted {written} files to {}", output_dir.display());
        Ok(written)
    }

    fn extract_one(reader: &mut GfsReader<File>, entry: &GfsEntry, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if target.is_dir() {
            return Err(Error::DestinationConflict {
                path: target.to_path_buf(),
            });
        }
        let file = File::create(target)?;
        reader.copy_entry(entry, BufWriter::new(file))?;
        Ok(())
    }

    /// Read a single entry's bytes without extracting anything
    ///
    /// # Errors
    /// Returns [`Error::EntryNotFound`] if no entry has this path.
    pub fn read_file_bytes<P: AsRef<Path>>(gfs_path: P, entry_path: &str) -> Result<Vec<u8>> {
        let mut reader = GfsReader::open(gfs_path)?;
        let entry = reader.find_entry(&entry_path.replace('\\', "/"))?;
        reader.read_entry(&entry)
    }

    /// Pack a directory into a container
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotADirectory`] if `source_dir` is not a directory.
    /// Returns [`Error::DestinationConflict`] if `output` is an existing directory.
    /// Returns [`Error::InvalidEncoding`] if a file path is not ASCII.
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(
        source_dir: P,
        output: Q,
        aligned: bool,
    ) -> Result<GfsLayout> {
        Self::create_with_options(source_dir, output, &GfsWriteOptions::new().with_aligned(aligned))
    }

    /// Pack a directory with explicit options
    pub fn create_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
        source_dir: P,
        output: Q,
        options: &GfsWriteOptions,
    ) -> Result<GfsLayout> {
        Self::create_with_progress(source_dir, output, options, &|_| {})
    }

    /// Pack a directory with explicit options and progress callback
    pub fn create_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
        source_dir: P,
        output: Q,
        options: &GfsWriteOptions,
        progress: ProgressCallback,
    ) -> Result<GfsLayout> {
        progress(&GfsProgress::new(GfsPhase::ScanningFiles, 0, 1));
        let writer = GfsWriter::with_options(source_dir.as_ref(), *options)?;
        writer.write_with_progress(output, progress)
    }

    /// Check a container for layout problems
    ///
    /// Header errors are returned as `Err`; layout problems are collected in
    /// the report.
    pub fn verify<P: AsRef<Path>>(gfs_path: P) -> Result<GfsVerifyReport> {
        let mut reader = GfsReader::open(gfs_path)?;
        let container_len = reader.container_len();
        let metadata = reader.read_metadata()?.clone();

        let mut report = GfsVerifyReport {
            entry_count: metadata.entries.len(),
            ..GfsVerifyReport::default()
        };

        let data_offset = metadata.header.data_offset;
        if metadata.header_bytes_read != u64::from(data_offset) {
            report.header_mismatch = Some((metadata.header_bytes_read, data_offset));
        }

        // Walk the gaps: header end -> first payload, payload -> payload
        let mut cursor = u64::from(data_offset).max(metadata.header_bytes_read);
        for entry in &metadata.entries {
            if !entry.is_aligned() {
                report.misaligned.push(entry.path.clone());
            }
            if entry.end() > container_len {
                report.out_of_bounds.push(entry.path.clone());
                continue;
            }
            Self::check_padding(&mut reader, cursor, entry.offset, &mut report)?;
            cursor = entry.end();
        }

        // Trailing padding after the last payload is expected; more than that is not.
        // An out-of-bounds entry leaves the cursor behind, so its bytes are not recounted.
        if report.out_of_bounds.is_empty() {
            let last_alignment = metadata
                .entries
                .last()
                .map_or(super::ALIGNED, |e| e.alignment);
            let padded_end =
                super::align_offset(cursor, last_alignment, super::PaddingRule::Canonical)
                    .unwrap_or(u64::MAX);
            if container_len > padded_end {
                report.trailing_bytes = container_len - padded_end;
            }
            Self::check_padding(&mut reader, cursor, padded_end.min(container_len), &mut report)?;
        }

        if report.is_ok() {
            tracing::info!("GFS verified: {} entries", report.entry_count);
        } else {
            tracing::warn!("GFS verification found problems: {report:?}");
        }
        Ok(report)
    }

    fn check_padding(
        reader: &mut GfsReader<File>,
        start: u64,
        end: u64,
        report: &mut GfsVerifyReport,
    ) -> Result<()> {
        if end <= start {
            return Ok(());
        }
        let length = end - start;
        if length > MAX_PADDING_SCAN {
            report.dirty_padding.push((start, length));
            return Ok(());
        }
        let bytes = reader.read_at(start, length)?;
        if bytes.iter().any(|&b| b != 0) {
            report.dirty_padding.push((start, length));
        }
        Ok(())
    }
}
