use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use super::cancel::CancellationToken;
use super::classify;
use super::job_log::JobLog;
use super::scan;
use super::schema;
use super::status::{
    FileErrorStatusMessage, FilePlacedStatusMessage, FileProgressStatusMessage,
    FilesStartStatusMessage, StatusMessage,
};
use super::writer::{self, PlaceAction};
use super::StatusSender;
use crate::model::{JobKind, JobOutcome, JobSummary, OrganizeOptions};

/// Classifies every file under the roots and places it into the organized
/// tree, counting per category. Files already inside the organized tree are
/// left alone so re-running the job does not churn its own output.
pub fn run(
    roots: &[PathBuf],
    options: &OrganizeOptions,
    token: &CancellationToken,
    tx_status: &StatusSender,
    log: &JobLog,
) -> JobSummary {
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut placed = 0usize;
    let mut errors = 0usize;

    if let Err(err) = schema::ensure_destination_tree(&options.organized_root, options.create_subfolders)
    {
        log.error(&format!("Cannot prepare destination tree: {}", err));
        errors += 1;
    }

    let collected = scan::collect_files(
        roots,
        options.deep_scan,
        Some(options.organized_root.as_path()),
        token,
        log,
    );
    errors += collected.errors;
    let mut cancelled = collected.cancelled;
    let total = collected.files.len();

    log.info(&format!("Organizing {} files...", total));
    tx_status(StatusMessage::FilesStart(FilesStartStatusMessage { total }));

    let action = if options.move_files {
        PlaceAction::Move
    } else {
        PlaceAction::Copy
    };

    for (index, file) in collected.files.iter().enumerate() {
        if token.is_cancelled() {
            cancelled = true;
            break;
        }

        let result = classify::classify_for_organize(file, options.keyword_routing);
        if !options.enabled_categories.is_empty()
            && !options
                .enabled_categories
                .iter()
                .any(|name| name == result.category.name)
        {
            tx_status(StatusMessage::FileProgress(FileProgressStatusMessage {
                processed: index + 1,
                total,
            }));
            continue;
        }

        let destination_dir = options.organized_root.join(&result.destination);
        match writer::place(file, &destination_dir, action) {
            Ok(final_path) => {
                placed += 1;
                *category_counts
                    .entry(result.category.name.to_string())
                    .or_insert(0) += 1;
                tx_status(StatusMessage::FilePlaced(FilePlacedStatusMessage {
                    category: result.category.name.to_string(),
                    destination: final_path,
                }));
            }
            Err(err) => {
                errors += 1;
                log.error(&format!("Error organizing {}: {}", file.display(), err));
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

    info!(placed, errors, cancelled, "organize pass finished");
    log.info(&format!(
        "Organization complete: {} placed, {} errors",
        placed, errors
    ));

    JobSummary {
        kind: JobKind::Organize,
        cancelled,
        errors,
        outcome: JobOutcome::Organize {
            category_counts,
            placed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn noop_sender() -> StatusSender {
        Arc::new(|_| {})
    }

    fn test_log() -> (TempDir, JobLog) {
        let dir = TempDir::new().unwrap();
        let log = JobLog::new(dir.path());
        (dir, log)
    }

    fn options(organized_root: PathBuf) -> OrganizeOptions {
        OrganizeOptions {
            organized_root,
            move_files: false,
            keyword_routing: true,
            enabled_categories: Vec::new(),
            create_subfolders: false,
            deep_scan: true,
        }
    }

    #[test]
    fn files_land_in_their_destination_folders() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(dir.path().join("my_resume_2024.docx"), b"cv").unwrap();
        fs::write(dir.path().join("photo.jpg"), b"jpeg").unwrap();
        fs::write(dir.path().join("unknown.zzz"), b"???").unwrap();

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &options(out.path().to_path_buf()),
            &token,
            &noop_sender(),
            &log,
        );

        assert!(out.path().join("Career/my_resume_2024.docx").is_file());
        assert!(out.path().join("Images/photo.jpg").is_file());
        assert!(out.path().join("Other/unknown.zzz").is_file());

        let JobOutcome::Organize {
            category_counts,
            placed,
        } = &summary.outcome
        else {
            panic!("wrong outcome kind");
        };
        assert_eq!(*placed, 3);
        assert_eq!(category_counts.get("Documents"), Some(&1));
        assert_eq!(category_counts.get("Images"), Some(&1));
        assert_eq!(category_counts.get("Other"), Some(&1));
        // copy mode leaves sources in place
        assert!(dir.path().join("photo.jpg").is_file());
    }

    #[test]
    fn move_mode_removes_the_sources() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(dir.path().join("track.mp3"), b"audio").unwrap();

        let mut opts = options(out.path().to_path_buf());
        opts.move_files = true;

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        run(
            &[dir.path().to_path_buf()],
            &opts,
            &token,
            &noop_sender(),
            &log,
        );

        assert!(!dir.path().join("track.mp3").exists());
        assert!(out.path().join("Audio/track.mp3").is_file());
    }

    #[test]
    fn disabled_categories_are_skipped() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        fs::write(dir.path().join("photo.png"), b"img").unwrap();

        let mut opts = options(out.path().to_path_buf());
        opts.keyword_routing = false;
        opts.enabled_categories = vec!["Images".to_string()];

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &opts,
            &token,
            &noop_sender(),
            &log,
        );

        let JobOutcome::Organize { placed, .. } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(*placed, 1);
        assert!(out.path().join("Images/photo.png").is_file());
        assert!(!out.path().join("Documents/notes.txt").exists());
    }

    #[test]
    fn organized_root_inside_a_scanned_root_is_not_rescanned() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("ORGANIZED");
        fs::write(dir.path().join("doc.pdf"), b"pdf").unwrap();

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let mut opts = options(out.clone());
        opts.keyword_routing = false;

        let first = run(
            &[dir.path().to_path_buf()],
            &opts,
            &token,
            &noop_sender(),
            &log,
        );
        let JobOutcome::Organize { placed, .. } = &first.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(*placed, 1);

        // a second pass only sees the untouched source again, not the copy
        let second = run(
            &[dir.path().to_path_buf()],
            &opts,
            &token,
            &noop_sender(),
            &log,
        );
        let JobOutcome::Organize { placed, .. } = &second.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(*placed, 1);
        assert!(out.join("Documents/doc.pdf").is_file());
        assert!(out.join("Documents/doc_1.pdf").is_file());
        assert!(!out.join("Documents/doc_2.pdf").exists());
    }

    #[test]
    fn cancelling_mid_job_keeps_partial_counts() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();

        // cancel as soon as the first file reports progress; the loop must
        // observe the flag before touching the second file
        let token = Arc::new(CancellationToken::new());
        let tx_token = Arc::clone(&token);
        let tx: StatusSender = Arc::new(move |msg| {
            if let StatusMessage::FileProgress(_) = msg {
                tx_token.cancel();
            }
        });

        let (_log_dir, log) = test_log();
        let mut opts = options(out.path().to_path_buf());
        opts.keyword_routing = false;
        let summary = run(&[dir.path().to_path_buf()], &opts, &token, &tx, &log);

        assert!(summary.cancelled);
        let JobOutcome::Organize { placed, .. } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(*placed, 1);
        assert_eq!(fs::read_dir(out.path().join("Documents")).unwrap().count(), 1);
    }

    #[test]
    fn pre_cancelled_job_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(dir.path().join("doc.pdf"), b"pdf").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &options(out.path().to_path_buf()),
            &token,
            &noop_sender(),
            &log,
        );

        assert!(summary.cancelled);
        let JobOutcome::Organize { placed, .. } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(*placed, 0);
        assert!(!out.path().join("Documents/doc.pdf").exists());
    }
}
