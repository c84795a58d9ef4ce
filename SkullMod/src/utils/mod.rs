//! Utility functions

pub mod path;

pub use path::{entry_matches, entry_output_path, matches_glob, normalize_path, relative_path};
