//! CLI command for GFS creation

use std::path::Path;

use crate::cli::progress::{DISK, LOOKING_GLASS, print_done, print_step, simple_bar, simple_spinner};
use crate::gfs::{GfsOperations, GfsPhase, GfsProgress, GfsWriteOptions};

pub fn execute(
    source: &Path,
    destination: Option<&Path>,
    aligned: bool,
    sort_entries: bool,
    progress: bool,
) -> anyhow::Result<()> {
    let started = std::time::Instant::now();
    let destination = destination.map_or_else(
        || GfsOperations::default_container_path(source),
        Path::to_path_buf,
    );
    let options = GfsWriteOptions::new()
        .with_aligned(aligned)
        .with_sort_entries(sort_entries);

    println!(
        "Creating GFS from {} to {} (alignment: {})",
        source.display(),
        destination.display(),
        options.alignment()
    );

    if !progress {
        let layout = GfsOperations::create_with_options(source, &destination, &options)?;
        println!(
            "GFS created successfully ({} entries, {} bytes)",
            layout.entries.len(),
            layout.total_size
        );
        return Ok(());
    }

    print_step(1, 2, LOOKING_GLASS, "Scanning files...");
    let spinner = simple_spinner("Scanning");
    let pb = simple_bar(0, "Writing");

    let on_progress = |p: &GfsProgress| match p.phase {
        GfsPhase::ComputingLayout => {
            spinner.finish_and_clear();
            print_step(2, 2, DISK, &format!("Writing {} files...", p.total));
            pb.set_length(p.total as u64);
        }
        GfsPhase::WritingPayloads => {
            pb.set_position(p.current as u64);
            if let Some(name) = &p.current_file {
                pb.set_message(name.clone());
            }
        }
        _ => {}
    };
    let result = GfsOperations::create_with_progress(source, &destination, &options, &on_progress);
    spinner.finish_and_clear();
    pb.finish_and_clear();

    let layout = result?;
    println!(
        "GFS created successfully ({} entries, {} bytes)",
        layout.entries.len(),
        layout.total_size
    );
    print_done(started.elapsed());
    Ok(())
}
