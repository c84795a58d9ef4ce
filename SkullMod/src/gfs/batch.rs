//! Batch GFS operations
//!
//! Discovery of containers and packable folders, and batch extraction and
//! creation. Containers are processed one after another.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{FILE_EXTENSION, GfsOperations, GfsPhase, GfsProgress, GfsWriteOptions};

/// Result of a batch GFS operation
#[derive(Debug, Clone, Default)]
pub struct BatchGfsResult {
    /// Number of successful operations
    pub success_count: usize,
    /// Number of failed operations
    pub fail_count: usize,
    /// Messages for each item processed
    pub results: Vec<String>,
}

impl BatchGfsResult {
    fn succeeded(&mut self, message: String) {
        self.success_count += 1;
        self.results.push(message);
    }

    fn failed(&mut self, message: String) {
        tracing::warn!("{message}");
        self.fail_count += 1;
        self.results.push(message);
    }
}

/// Find all .gfs files in a directory recursively
///
/// # Returns
/// A sorted list of paths to .gfs files found in the directory tree.
pub fn find_gfs_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut gfs_files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(FILE_EXTENSION))
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    gfs_files.sort();
    gfs_files
}

/// Find all packable folders (immediate subdirectories that contain files)
///
/// Each returned folder becomes one container holding all of its contents.
pub fn find_packable_folders<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut folders: Vec<_> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_dir() && contains_files_recursive(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();

    folders.sort();
    folders
}

fn contains_files_recursive(dir: &Path) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .any(|e| e.file_type().is_file())
}

/// Batch extract GFS files
///
/// Each container is extracted into a subdirectory named after it (without
/// extension), placed at the container's path relative to `source_base`.
pub fn batch_extract<F>(
    gfs_files: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
    progress: F,
) -> BatchGfsResult
where
    F: Fn(&GfsProgress),
{
    let total = gfs_files.len();
    let mut result = BatchGfsResult::default();

    for (i, gfs_path) in gfs_files.iter().enumerate() {
        let relative_path = gfs_path
            .strip_prefix(source_base)
            .unwrap_or(gfs_path.as_path());
        let display_path = relative_path.to_string_lossy();

        progress(&GfsProgress::with_file(
            GfsPhase::ExtractingFiles,
            i + 1,
            total,
            display_path.to_string(),
        ));

        let gfs_dest = GfsOperations::output_dir_for(&dest_base.join(relative_path));

        match GfsOperations::extract(gfs_path, &gfs_dest) {
            Ok(()) => result.succeeded(format!("Extracted: {display_path}")),
            Err(e) => result.failed(format!("Failed {display_path}: {e}")),
        }
    }

    progress(&GfsProgress::new(GfsPhase::Complete, total, total));
    result
}

/// Batch create GFS files
///
/// Each folder is packed into `<folder>.gfs`, placed at the folder's path
/// relative to `source_base`.
pub fn batch_create<F>(
    folders: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
    options: &GfsWriteOptions,
    progress: F,
) -> BatchGfsResult
where
    F: Fn(&GfsProgress),
{
    let total = folders.len();
    let mut result = BatchGfsResult::default();

    for (i, folder_path) in folders.iter().enumerate() {
        let relative_path = folder_path
            .strip_prefix(source_base)
            .unwrap_or(folder_path.as_path());
        let display_path = relative_path.to_string_lossy();

        progress(&GfsProgress::with_file(
            GfsPhase::WritingPayloads,
            i + 1,
            total,
            display_path.to_string(),
        ));

        let gfs_path = GfsOperations::default_container_path(&dest_base.join(relative_path));

        match GfsOperations::create_with_options(folder_path, &gfs_path, options) {
            Ok(layout) => result.succeeded(format!(
                "Created: {display_path}.{FILE_EXTENSION} ({} entries)",
                layout.entries.len()
            )),
            Err(e) => result.failed(format!("Failed {display_path}: {e}")),
        }
    }

    progress(&GfsProgress::new(GfsPhase::Complete, total, total));
    result
}
