//! # SkullMod
//!
//! A pure-Rust library for Skullgirls / Reverge Labs GFS containers
//! ("Reverge Package File").
//!
//! ## Supported Operations
//!
//! - **Unpack** - Decode the header and extract every packed file
//! - **Pack** - Build a container from a directory tree, optionally 4096-byte aligned
//! - **Inspect** - List entries, summarize and verify container layout
//!
//! ## Quick Start
//!
//! ```no_run
//! use skullmod::gfs::GfsOperations;
//!
//! // List contents of a GFS file
//! let files = GfsOperations::list("core.gfs")?;
//! println!("Found {} files", files.len());
//!
//! // Extract next to the container (core.gfs -> core/)
//! GfsOperations::extract_to_default_dir("core.gfs")?;
//!
//! // Repack with 4096-byte alignment
//! GfsOperations::create("core", "core-new.gfs", true)?;
//!
//! // Read a specific file without extracting
//! let data = GfsOperations::read_file_bytes("core.gfs", "levels/stage.lvl")?;
//! # Ok::<(), skullmod::Error>(())
//! ```
//!
//! Decoding also works on in-memory bytes:
//!
//! ```
//! let metadata = skullmod::gfs::decode(&[0u8; 4]);
//! assert!(metadata.is_err());
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `skullmod` command-line binary

pub mod binary;
pub mod error;
pub mod gfs;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::binary::{BinaryReader, BinaryWriter};
    pub use crate::error::{Error, Result};
    pub use crate::gfs::{
        BatchGfsResult, GfsEntry, GfsExtractOptions, GfsMetadata, GfsOperations, GfsPhase,
        GfsProgress, GfsReader, GfsWriteOptions, GfsWriter, PaddingRule, batch_create,
        batch_extract, find_gfs_files, find_packable_folders,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
