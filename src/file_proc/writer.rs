use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceAction {
    Move,
    Copy,
}

/// Puts `source` into `destination_dir` without ever overwriting anything:
/// the candidate name is the source's file name, and an occupied candidate
/// gets `_1`, `_2`, ... appended to the stem until a free path turns up.
/// The existence check is not atomic; each job is assumed to be the sole
/// writer into its destination tree for its duration.
pub fn place(source: &Path, destination_dir: &Path, action: PlaceAction) -> io::Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"))?;

    fs::create_dir_all(destination_dir)?;
    let target = next_free_path(destination_dir, file_name);

    match action {
        PlaceAction::Move => move_file(source, &target)?,
        PlaceAction::Copy => copy_file(source, &target)?,
    }

    debug!(source = %source.display(), target = %target.display(), "placed file");
    Ok(target)
}

fn next_free_path(destination_dir: &Path, file_name: &OsStr) -> PathBuf {
    let candidate = destination_dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = name.extension().map(|e| e.to_string_lossy().into_owned());

    let mut counter = 1u64;
    loop {
        let next_name = match &extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = destination_dir.join(next_name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Rename where possible; a rename across filesystems fails, so fall back to
/// copy-then-remove.
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_file(source, target)?;
            fs::remove_file(source)
        }
    }
}

/// `fs::copy` carries permissions; the modification time is carried over
/// separately, best-effort.
fn copy_file(source: &Path, target: &Path) -> io::Result<()> {
    fs::copy(source, target)?;
    if let Ok(metadata) = fs::metadata(source) {
        let mtime = FileTime::from_last_modification_time(&metadata);
        let _ = filetime::set_file_mtime(target, mtime);
    }
    Ok(())
}
