//! CLI commands for GFS inspection and batch operations

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::gfs::{
    BatchGfsResult, GfsOperations, GfsWriteOptions, batch_create, batch_extract, find_gfs_files,
    find_packable_folders,
};

/// Show header and payload statistics of a GFS file
pub fn info(gfs: &Path) -> anyhow::Result<()> {
    let info = GfsOperations::inspect(gfs)?;

    println!("GFS Information: {}", info.path.display());
    println!();
    println!("Version: {}", info.header.version);
    println!("Entries: {}", info.header.entry_count);
    println!("Data offset: {}", info.header.data_offset);
    if info.header_bytes_read != u64::from(info.header.data_offset) {
        println!(
            "  {} header is {} bytes",
            style("warning:").yellow(),
            info.header_bytes_read
        );
    }
    println!(
        "Container size: {} ({} bytes)",
        format_size(info.container_len),
        info.container_len
    );
    println!(
        "Payload size: {} ({} bytes)",
        format_size(info.total_payload),
        info.total_payload
    );
    let alignments: Vec<String> = info.alignments.iter().map(u32::to_string).collect();
    println!("Alignments: {}", alignments.join(", "));
    println!("Extracts to: {}", info.output_dir.display());
    println!();

    if !info.largest.is_empty() {
        println!("Largest files:");
        for entry in &info.largest {
            println!("  {:>10}  {}", format_size(entry.length), entry.path);
        }
    }

    Ok(())
}

/// Check a GFS file and print any layout problems
pub fn verify(gfs: &Path) -> anyhow::Result<()> {
    let report = GfsOperations::verify(gfs)?;

    if report.is_ok() {
        println!(
            "{} {} ({} entries)",
            style("OK").green().bold(),
            gfs.display(),
            report.entry_count
        );
        return Ok(());
    }

    println!("{} {}", style("PROBLEMS").red().bold(), gfs.display());
    if let Some((read, declared)) = report.header_mismatch {
        println!("  Header is {read} bytes but data offset says {declared}");
    }
    for path in &report.out_of_bounds {
        println!("  Out of bounds: {path}");
    }
    for path in &report.misaligned {
        println!("  Misaligned: {path}");
    }
    for (offset, length) in &report.dirty_padding {
        println!("  Non-zero padding: {length} bytes at {offset}");
    }
    if report.trailing_bytes > 0 {
        println!("  Trailing bytes: {}", report.trailing_bytes);
    }

    anyhow::bail!("{} failed verification", gfs.display())
}

/// Find all GFS files in a directory
pub fn find(dir: &Path) -> anyhow::Result<()> {
    let containers = find_gfs_files(dir);

    if containers.is_empty() {
        println!("No GFS files found in: {}", dir.display());
    } else {
        println!("Found {} GFS files:", containers.len());
        for gfs in &containers {
            let display = gfs.strip_prefix(dir).unwrap_or(gfs.as_path()).display();
            println!("  {display}");
        }
    }

    Ok(())
}

/// Batch extract GFS files
pub fn batch_extract_cmd(source: &Path, dest: &Path) -> anyhow::Result<()> {
    let containers = find_gfs_files(source);

    if containers.is_empty() {
        println!("No GFS files found in: {}", source.display());
        return Ok(());
    }

    println!("Found {} GFS files to extract", containers.len());

    let pb = batch_bar(containers.len() as u64)?;
    let result = batch_extract(&containers, source, dest, |progress| {
        pb.set_position(progress.current as u64);
        if let Some(ref name) = progress.current_file {
            pb.set_message(name.clone());
        }
    });
    pb.finish_and_clear();

    print_batch_summary("Extraction", &result);
    Ok(())
}

/// Batch create GFS files
pub fn batch_create_cmd(source: &Path, dest: &Path, aligned: bool) -> anyhow::Result<()> {
    let folders = find_packable_folders(source);

    if folders.is_empty() {
        println!("No packable folders found in: {}", source.display());
        return Ok(());
    }

    println!("Found {} folders to pack", folders.len());

    let options = GfsWriteOptions::new().with_aligned(aligned);
    let pb = batch_bar(folders.len() as u64)?;
    let result = batch_create(&folders, source, dest, &options, |progress| {
        pb.set_position(progress.current as u64);
        if let Some(ref name) = progress.current_file {
            pb.set_message(name.clone());
        }
    });
    pb.finish_and_clear();

    print_batch_summary("Creation", &result);
    Ok(())
}

fn batch_bar(total: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

fn print_batch_summary(what: &str, result: &BatchGfsResult) {
    println!();
    println!("{what} complete:");
    println!("  Success: {}", result.success_count);
    println!("  Failed: {}", result.fail_count);

    if result.fail_count > 0 {
        println!();
        println!("Failures:");
        for msg in result.results.iter().filter(|m| m.starts_with("Failed")) {
            println!("  {msg}");
        }
    }
}

/// Format byte size for display
pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(4096), "4.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.50 MB");
    }
}
