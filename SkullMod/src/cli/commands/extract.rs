//! CLI command for GFS extraction

use std::path::Path;

use crate::cli::progress::{LOOKING_GLASS, PACKAGE, print_done, print_step, simple_bar};
use crate::gfs::{GfsExtractOptions, GfsOperations, GfsPhase, GfsProgress};

pub fn execute(
    source: &Path,
    destination: Option<&Path>,
    filter: Option<&str>,
    files: &[String],
    progress: bool,
) -> anyhow::Result<()> {
    let started = std::time::Instant::now();
    let destination = destination.map_or_else(|| GfsOperations::output_dir_for(source), Path::to_path_buf);

    // Named files
    if !files.is_empty() {
        println!("Extracting {} file(s) from {}", files.len(), source.display());
        let written = GfsOperations::extract_files(source, &destination, files, &|_| {})?;
        println!("Extracted {written} file(s) to {}", destination.display());
        return Ok(());
    }

    let options = GfsExtractOptions::new().with_filter(filter.map(str::to_string));

    if !progress {
        let written = GfsOperations::extract_with_options(source, &destination, &options, &|_| {})?;
        println!("Extracted {written} file(s) to {}", destination.display());
        return Ok(());
    }

    print_step(1, 2, LOOKING_GLASS, &format!("Reading {}", source.display()));
    let entries = GfsOperations::list(source)?;
    let total = match filter {
        Some(pattern) => entries
            .iter()
            .filter(|e| crate::utils::entry_matches(pattern, e))
            .count(),
        None => entries.len(),
    };
    if total == 0 {
        if let Some(pattern) = filter {
            println!("No files match pattern: {pattern}");
        } else {
            println!("Container is empty");
        }
        return Ok(());
    }

    print_step(
        2,
        2,
        PACKAGE,
        &format!("Extracting {total} files to {}", destination.display()),
    );
    let pb = simple_bar(total as u64, "Extracting");
    let on_progress = |p: &GfsProgress| {
        if p.phase == GfsPhase::ExtractingFiles {
            pb.set_position(p.current as u64);
            if let Some(name) = &p.current_file {
                pb.set_message(name.clone());
            }
        }
    };
    let result = GfsOperations::extract_with_options(source, &destination, &options, &on_progress);
    pb.finish_and_clear();

    let written = result?;
    println!("Extracted {written} file(s)");
    print_done(started.elapsed());
    Ok(())
}
