//! Path utilities

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Normalize path separators to forward slashes (for GFS entries)
pub fn normalize_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Get relative path and normalize separators
pub fn relative_path<P: AsRef<Path>, B: AsRef<Path>>(path: P, base: B) -> Option<String> {
    let rel = path.as_ref().strip_prefix(base.as_ref()).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(normalize_path(parts.join("/")))
}

/// Resolve an entry path below `output_dir`, refusing anything that escapes it
///
/// # Errors
/// Returns [`Error::UnsafeEntryPath`] for empty, absolute, drive-prefixed or `..` paths.
pub fn entry_output_path(output_dir: &Path, entry_path: &str) -> Result<PathBuf> {
    let normalized = entry_path.replace('\\', "/");
    let mut out = output_dir.to_path_buf();
    let mut depth = 0usize;

    for part in normalized.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(Error::UnsafeEntryPath(entry_path.to_string())),
            _ => {
                // Reject drive prefixes and roots smuggled into a single component
                let mut components = Path::new(part).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => {}
                    _ => return Err(Error::UnsafeEntryPath(entry_path.to_string())),
                }
                out.push(part);
                depth += 1;
            }
        }
    }

    if depth == 0 || normalized.starts_with('/') {
        return Err(Error::UnsafeEntryPath(entry_path.to_string()));
    }
    Ok(out)
}

/// Simple glob pattern matching (supports * and ?), case-insensitive
pub fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();
    matches_glob_recursive(&pattern_chars, &text_chars, 0, 0)
}

fn matches_glob_recursive(pattern: &[char], text: &[char], pi: usize, ti: usize) -> bool {
    if pi == pattern.len() {
        return ti == text.len();
    }

    match pattern[pi] {
        '*' => (ti..=text.len()).any(|i| matches_glob_recursive(pattern, text, pi + 1, i)),
        '?' => ti < text.len() && matches_glob_recursive(pattern, text, pi + 1, ti + 1),
        c => {
            ti < text.len()
                && text[ti].eq_ignore_ascii_case(&c)
                && matches_glob_recursive(pattern, text, pi + 1, ti + 1)
        }
    }
}

/// Match a glob against an entry's full path or its file name
pub fn entry_matches(pattern: &str, entry_path: &str) -> bool {
    let file_name = entry_path.rsplit('/').next().unwrap_or(entry_path);
    matches_glob(pattern, file_name) || matches_glob(pattern, entry_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let base = Path::new("root");
        let path = base.join("data").join("sprites").join("a.spr.msb");
        assert_eq!(
            relative_path(&path, base).as_deref(),
            Some("data/sprites/a.spr.msb")
        );
        assert_eq!(relative_path(base, base), None);
        assert_eq!(relative_path(Path::new("elsewhere/x"), base), None);
    }

    #[test]
    fn test_normalize_backslashes() {
        assert_eq!(normalize_path("a\\b\\c.txt"), "a/b/c.txt");
    }

    #[test]
    fn test_entry_output_path() {
        let out = Path::new("out");
        assert_eq!(
            entry_output_path(out, "data/levels/stage.lvl").unwrap(),
            out.join("data").join("levels").join("stage.lvl")
        );
        assert_eq!(entry_output_path(out, "./a.txt").unwrap(), out.join("a.txt"));
    }

    #[test]
    fn test_entry_output_path_rejects_escapes() {
        let out = Path::new("out");
        for bad in ["../evil", "a/../../evil", "/etc/passwd", "", "a/..", "\\abs"] {
            assert!(
                matches!(entry_output_path(out, bad), Err(Error::UnsafeEntryPath(_))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn test_matches_glob() {
        assert!(matches_glob("*.msb", "char.sgm.msb"));
        assert!(matches_glob("a?c", "ABC"));
        assert!(!matches_glob("*.msb", "char.sgm"));
        assert!(matches_glob("*", ""));
        assert!(!matches_glob("?", ""));
    }

    #[test]
    fn test_entry_matches() {
        assert!(entry_matches("*.lvl", "levels/stage.lvl"));
        assert!(entry_matches("levels/*", "levels/stage.lvl"));
        assert!(!entry_matches("*.spr", "levels/stage.lvl"));
    }
}
