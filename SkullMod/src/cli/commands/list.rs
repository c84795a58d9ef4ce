//! CLI command for listing GFS contents

use std::path::Path;

use super::gfs::format_size;
use crate::gfs::{GfsEntry, GfsOperations};
use crate::utils::entry_matches;

pub fn execute(
    source: &Path,
    detailed: bool,
    json: bool,
    filter: Option<&str>,
    count: bool,
) -> anyhow::Result<()> {
    let entries = GfsOperations::list_detailed(source)?;

    let filtered: Vec<&GfsEntry> = match filter {
        Some(pattern) => entries
            .iter()
            .filter(|e| entry_matches(pattern, &e.path))
            .collect(),
        None => entries.iter().collect(),
    };

    if count {
        println!("{}", filtered.len());
        return Ok(());
    }

    if json {
        if detailed {
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        } else {
            let paths: Vec<&str> = filtered.iter().map(|e| e.path.as_str()).collect();
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
        return Ok(());
    }

    if !detailed {
        for entry in filtered {
            println!("{}", entry.path);
        }
        return Ok(());
    }

    println!("{:>12}  {:>10}  {:>5}  PATH", "OFFSET", "SIZE", "ALIGN");
    for entry in &filtered {
        println!(
            "{:>12}  {:>10}  {:>5}  {}",
            entry.offset,
            format_size(entry.length),
            entry.alignment,
            entry.path
        );
    }

    let total: u64 = filtered.iter().map(|e| e.length).sum();
    println!();
    println!("{} files, {} total", filtered.len(), format_size(total));

    Ok(())
}
