use std::fs;
use std::path::PathBuf;

use chrono::Local;
use tracing::info;

use super::cancel::CancellationToken;
use super::classify;
use super::job_log::JobLog;
use super::scan;
use super::status::{
    FileErrorStatusMessage, FileProgressStatusMessage, FilesStartStatusMessage, StatusMessage,
};
use super::StatusSender;
use crate::model::{ConsolidateOptions, JobKind, JobOutcome, JobSummary};

const HEADER_RULE: &str = "============================================================";

/// Concatenates every allow-listed file into one document, each file under a
/// path-labeled header, and persists it under a timestamped name once the
/// pass completes. A cancelled pass persists nothing.
pub fn run(
    roots: &[PathBuf],
    options: &ConsolidateOptions,
    token: &CancellationToken,
    tx_status: &StatusSender,
    log: &JobLog,
) -> JobSummary {
    let mut document = String::new();
    let mut files = 0usize;
    let mut errors = 0usize;
    let mut cancelled = false;

    let mut candidates: Vec<(PathBuf, PathBuf)> = Vec::new();
    for root in roots {
        let collected = scan::collect_files(std::slice::from_ref(root), true, None, token, log);
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
    log.info(&format!("Consolidating {} files for review...", total));
    tx_status(StatusMessage::FilesStart(FilesStartStatusMessage { total }));

    for (index, (root, file)) in candidates.iter().enumerate() {
        if token.is_cancelled() {
            cancelled = true;
            break;
        }

        let relative = file.strip_prefix(root).unwrap_or(file.as_path());
        match fs::read(file) {
            Ok(bytes) => {
                document.push('\n');
                document.push_str(HEADER_RULE);
                document.push('\n');
                document.push_str(&format!("File: {}\n", relative.display()));
                document.push_str(HEADER_RULE);
                document.push_str("\n\n");
                document.push_str(&String::from_utf8_lossy(&bytes));
                document.push('\n');
                files += 1;
            }
            Err(err) => {
                errors += 1;
                log.error(&format!("Error reading {}: {}", file.display(), err));
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

    let output = if cancelled {
        None
    } else {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let output_path = options.output_dir.join(format!("CONSOLIDATED_{}.txt", stamp));
        match fs::create_dir_all(&options.output_dir)
            .and_then(|_| fs::write(&output_path, document.as_bytes()))
        {
            Ok(()) => {
                log.info(&format!("Consolidated document saved to {}", output_path.display()));
                Some(output_path)
            }
            Err(err) => {
                errors += 1;
                log.error(&format!("Error saving consolidated document: {}", err));
                None
            }
        }
    };

    info!(files, bytes = document.len(), errors, "consolidate pass finished");

    JobSummary {
        kind: JobKind::Consolidate,
        cancelled,
        errors,
        outcome: JobOutcome::Consolidate {
            files,
            bytes: document.len() as u64,
            output,
        },
    }
}
