use std::path::PathBuf;

pub mod prompt;

/// Collapses a root list so no entry is nested inside another; scanning a
/// parent already covers its children, and overlapping roots would count
/// (and place) files twice.
pub fn non_overlapping_directories(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for dir in dirs {
        if result.iter().any(|kept| dir.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !kept.starts_with(&dir));
        result.push(dir);
    }

    result
}
