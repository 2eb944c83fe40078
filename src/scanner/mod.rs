use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collects files below `root` whose extension matches
/// `extension` (case-insensitive, without the dot).
///
/// Paths are returned sorted so every run visits files in the same order.
/// Entries that can't be read are logged and skipped; a missing root yields
/// an empty list.
pub fn discover(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_extension(e.path(), extension))
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

/// Check if a path has the given extension, ignoring case
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
