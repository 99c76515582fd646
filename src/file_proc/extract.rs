use std::path::PathBuf;

use tracing::info;

use super::cancel::CancellationToken;
use super::classify;
use super::job_log::JobLog;
use super::scan;
use super::status::{
    FileErrorStatusMessage, FileProgressStatusMessage, FilesStartStatusMessage, StatusMessage,
};
use super::writer::{self, PlaceAction};
use super::StatusSender;
use crate::model::{ExtractOptions, JobKind, JobOutcome, JobSummary};

/// Copies every allow-listed file into the repository tree, preserving its
/// path relative to the root it was found under. Collisions inside the
/// repository are renamed, never overwritten.
pub fn run(
    roots: &[PathBuf],
    options: &ExtractOptions,
    token: &CancellationToken,
    tx_status: &StatusSender,
    log: &JobLog,
) -> JobSummary {
    let mut extracted: Vec<PathBuf> = Vec::new();
    let mut errors = 0usize;
    let mut cancelled = false;

    // (root, file) pairs so each copy can be made relative to its own root
    let mut candidates: Vec<(PathBuf, PathBuf)> = Vec::new();
    for root in roots {
        let collected = scan::collect_files(
            std::slice::from_ref(root),
            true,
            Some(options.repository_root.as_path()),
            token,
            log,
        );
        errors += collected.errors;
        if collected.cancelled {
            cancelled = true;
            break;
        }
        candidates.extend(
            collected
                .files
                .into_iter()
                .filter(|file| classify::matches_extension(file, &options.extensions))
                .map(|file| (root.clone(), file)),
        );
    }

    let total = candidates.len();
    log.info(&format!("Extracting {} code files...", total));
    tx_status(StatusMessage::FilesStart(FilesStartStatusMessage { total }));

    for (index, (root, file)) in candidates.iter().enumerate() {
        if token.is_cancelled() {
            cancelled = true;
            break;
        }

        let relative = file.strip_prefix(root).unwrap_or(file.as_path());
        let target_dir = match relative.parent() {
            Some(parent) => options.repository_root.join(parent),
            None => options.repository_root.clone(),
        };

        match writer::place(file, &target_dir, PlaceAction::Copy) {
            Ok(_) => extracted.push(relative.to_path_buf()),
            Err(err) => {
                errors += 1;
                log.error(&format!("Error extracting {}: {}", file.display(), err));
                tx_status(StatusMessage::FileError(FileErrorStatusMessage {
                    file_path: file.clone(),
                    message: err.to_string(),
                }));
            }
        }

        tx_status(StatusMessage::FileProgress(FileProgressStatusMessage {
            processed: index + 1,
            total,
        }));
    }

    info!(extracted = extracted.len(), errors, "extract pass finished");
    log.info(&format!("Extracted {} code files", extracted.len()));

    JobSummary {
        kind: JobKind::Extract,
        cancelled,
        errors,
        outcome: JobOutcome::Extract { extracted },
    }
}
