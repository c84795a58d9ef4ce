use clap::Subcommand;
use std::path::PathBuf;

pub mod create;
pub mod extract;
pub mod gfs;
pub mod list;

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a GFS container
    Extract {
        /// Source GFS file
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory (defaults to the container path without extension)
        #[arg(short, long)]
        destination: Option<PathBuf>,

        /// Only extract files matching glob pattern (e.g., "*.lvl", "data/sprites/*")
        #[arg(long, conflicts_with = "file")]
        filter: Option<String>,

        /// Extract a single file by internal path (repeatable)
        #[arg(long, conflicts_with = "filter")]
        file: Vec<String>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Pack a directory into a GFS container
    Create {
        /// Source directory
        #[arg(short, long)]
        source: PathBuf,

        /// Output GFS file (defaults to `<source>.gfs`)
        #[arg(short, long)]
        destination: Option<PathBuf>,

        /// Align every payload to 4096 bytes
        #[arg(long)]
        aligned: bool,

        /// Keep directory walk order instead of sorting entries by path
        #[arg(long)]
        keep_walk_order: bool,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// List contents of a GFS container
    List {
        /// Source GFS file
        #[arg(short, long)]
        source: PathBuf,

        /// Show offsets, sizes and alignment
        #[arg(long)]
        detailed: bool,

        /// Print entries as JSON
        #[arg(long, conflicts_with = "count")]
        json: bool,

        /// Only list files matching glob pattern
        #[arg(long)]
        filter: Option<String>,

        /// Only print the number of matching files
        #[arg(long)]
        count: bool,
    },

    /// Show header and payload statistics of a GFS container
    Info {
        /// Source GFS file
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Check a GFS container for layout problems
    Verify {
        /// Source GFS file
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Find GFS containers in a directory
    Find {
        /// Directory to search
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Extract every GFS container found below a directory
    BatchExtract {
        /// Directory to search for GFS files
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,
    },

    /// Pack every non-empty subdirectory into its own GFS container
    BatchCreate {
        /// Directory whose subdirectories are packed
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,

        /// Align every payload to 4096 bytes
        #[arg(long)]
        aligned: bool,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Extract {
                source,
                destination,
                filter,
                file,
                quiet,
            } => extract::execute(
                source,
                destination.as_deref(),
                filter.as_deref(),
                file,
                !*quiet,
            ),
            Commands::Create {
                source,
                destination,
                aligned,
                keep_walk_order,
                quiet,
            } => create::execute(
                source,
                destination.as_deref(),
                *aligned,
                !*keep_walk_order,
                !*quiet,
            ),
            Commands::List {
                source,
                detailed,
                json,
                filter,
                count,
            } => list::execute(source, *detailed, *json, filter.as_deref(), *count),
            Commands::Info { source } => gfs::info(source),
            Commands::Verify { source } => gfs::verify(source),
            Commands::Find { source } => gfs::find(source),
            Commands::BatchExtract {
                source,
                destination,
            } => gfs::batch_extract_cmd(source, destination),
            Commands::BatchCreate {
                source,
                destination,
                aligned,
            } => gfs::batch_create_cmd(source, destination, *aligned),
        }
    }
}
