use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use tracing::{debug, info};

use super::cancel::CancellationToken;
use super::hash;
use super::job_log::JobLog;
use super::scan::{self, SizeBuckets};
use super::status::{
    HashProgressStatusMessage, HashStartStatusMessage, PairFoundStatusMessage, StatusMessage,
};
use super::writer::{self, PlaceAction};
use super::StatusSender;
use crate::model::{DuplicateOptions, DuplicatePair, FileRecord, JobKind, JobOutcome, JobSummary};

/// Runs both phases of duplicate detection over the given roots. Phase 1 is
/// cheap stat calls (size bucketing); phase 2 hashes only files that share a
/// size with at least one other file. Detection mutates nothing; deletion is
/// a separate, explicitly confirmed step.
pub fn run(
    roots: &[PathBuf],
    options: &DuplicateOptions,
    token: &CancellationToken,
    tx_status: &StatusSender,
    log: &JobLog,
) -> JobSummary {
    log.info(&format!(
        "Duplicate scan starting (min size: {}KB, hash: {})",
        options.min_file_size_kb, options.algorithm
    ));

    let buckets = scan::build_size_buckets(
        roots,
        options.min_file_size_kb,
        &options.ignore_patterns,
        token,
        tx_status,
        log,
    );
    info!(
        files = buckets.files_seen,
        bytes = buckets.bytes_seen,
        candidates = buckets.multi_member_total(),
        "size bucketing complete"
    );

    let mut errors = buckets.errors;
    let mut cancelled = buckets.cancelled;

    let pairs = if cancelled {
        Vec::new()
    } else {
        let outcome = pair_duplicates(&buckets, options, token, tx_status, log);
        errors += outcome.errors;
        cancelled = outcome.cancelled;
        outcome.pairs
    };

    log.info(&format!("Found {} duplicate pairs", pairs.len()));

    JobSummary {
        kind: JobKind::Duplicates,
        cancelled,
        errors,
        outcome: JobOutcome::Duplicates { pairs },
    }
}

#[derive(Debug, Default)]
struct PairOutcome {
    pairs: Vec<DuplicatePair>,
    errors: usize,
    cancelled: bool,
}

/// Phase 2: hash every member of every multi-member bucket in encounter
/// order. The first record to produce a given hash becomes the original for
/// that hash; each later record with an equal hash pairs against it. A
/// record whose hash fails is excluded outright, becoming neither original
/// nor duplicate. Pairing never crosses buckets.
fn pair_duplicates(
    buckets: &SizeBuckets,
    options: &DuplicateOptions,
    token: &CancellationToken,
    tx_status: &StatusSender,
    log: &JobLog,
) -> PairOutcome {
    let total = buckets.multi_member_total();
    let mut outcome = PairOutcome::default();
    let mut processed = 0usize;

    tx_status(StatusMessage::HashStart(HashStartStatusMessage {
        total_candidates: total,
    }));

    'buckets: for (size, records) in buckets.iter_multi() {
        let mut originals: AHashMap<String, &FileRecord> = AHashMap::new();

        for record in records {
            if token.is_cancelled() {
                outcome.cancelled = true;
                break 'buckets;
            }

            let hash_value = match hash::hash_file(&record.path, options.algorithm) {
                Ok(hash_value) => Some(hash_value),
                Err(err) => {
                    log.warning(&format!("Hash failed for {}: {}", record.path.display(), err));
                    outcome.errors += 1;
                    None
                }
            };

            processed += 1;
            tx_status(StatusMessage::HashProgress(HashProgressStatusMessage {
                processed,
                total,
            }));

            let Some(hash_value) = hash_value else {
                continue;
            };

            if let Some(original) = originals.get(hash_value.as_str()) {
                let mut duplicate = record.clone();
                duplicate.hash = Some(hash_value.clone());
                let mut original = (*original).clone();
                original.hash = Some(hash_value);

                tx_status(StatusMessage::PairFound(PairFoundStatusMessage {
                    original: original.path.clone(),
                    duplicate: duplicate.path.clone(),
                    file_size: size,
                }));
                debug!(
                    original = %original.path.display(),
                    duplicate = %duplicate.path.display(),
                    "duplicate pair"
                );

                outcome.pairs.push(DuplicatePair {
                    original,
                    duplicate,
                    reason: format!("identical size ({} bytes) and {} hash", size, options.algorithm),
                });
            } else {
                originals.insert(hash_value, record);
            }
        }
    }

    tx_status(StatusMessage::HashFinish);
    outcome
}

/// The destructive half, decoupled from detection and gated behind explicit
/// confirmation by the caller. Only the `duplicate` side of each pair is
/// touched; with a quarantine directory configured the file is moved there
/// (conflict-safe) instead of being deleted.
pub fn remove_duplicates(
    pairs: &[DuplicatePair],
    quarantine: Option<&Path>,
    log: &JobLog,
) -> (usize, usize) {
    let mut removed = 0usize;
    let mut errors = 0usize;

    for pair in pairs {
        let path = &pair.duplicate.path;
        let result = match quarantine {
            Some(quarantine_dir) => writer::place(path, quarantine_dir, PlaceAction::Move).map(|_| ()),
            None => fs::remove_file(path),
        };
        match result {
            Ok(()) => {
                removed += 1;
                log.info(&format!("Removed duplicate: {}", path.display()));
            }
            Err(err) => {
                errors += 1;
                log.error(&format!("Error removing {}: {}", path.display(), err));
            }
        }
    }

    (removed, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_proc::hash::HashAlgorithm;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn noop_sender() -> StatusSender {
        Arc::new(|_| {})
    }

    fn options() -> DuplicateOptions {
        DuplicateOptions {
            min_file_size_kb: 0,
            algorithm: HashAlgorithm::Strong,
            ignore_patterns: Vec::new(),
        }
    }

    fn test_log() -> (TempDir, JobLog) {
        let dir = TempDir::new().unwrap();
        let log = JobLog::new(dir.path());
        (dir, log)
    }

    #[test]
    fn identical_files_form_exactly_one_pair() {
        let dir = TempDir::new().unwrap();
        let contents = vec![42u8; 500];
        fs::write(dir.path().join("report.txt"), &contents).unwrap();
        fs::write(dir.path().join("report_copy.txt"), &contents).unwrap();

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &options(),
            &token,
            &noop_sender(),
            &log,
        );

        let JobOutcome::Duplicates { pairs } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(pairs.len(), 1);
        assert_eq!(summary.errors, 0);
        assert!(!summary.cancelled);

        let pair = &pairs[0];
        assert_eq!(pair.original.size, pair.duplicate.size);
        assert_eq!(pair.original.hash, pair.duplicate.hash);
        assert!(pair.original.hash.is_some());
        assert_ne!(pair.original.path, pair.duplicate.path);
    }

    #[test]
    fn the_first_record_in_the_bucket_is_the_original() {
        // Two roots, scanned in the order given: whatever sits under the
        // first root is encountered first and must come out as original.
        let first_root = TempDir::new().unwrap();
        let second_root = TempDir::new().unwrap();
        let contents = b"identical bytes".to_vec();
        let first = first_root.path().join("a.bin");
        fs::write(&first, &contents).unwrap();
        let second = second_root.path().join("b.bin");
        fs::write(&second, &contents).unwrap();

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[
                first_root.path().to_path_buf(),
                second_root.path().to_path_buf(),
            ],
            &options(),
            &token,
            &noop_sender(),
            &log,
        );

        let JobOutcome::Duplicates { pairs } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].original.path, first);
        assert_eq!(pairs[0].duplicate.path, second);
    }

    #[test]
    fn same_size_different_content_does_not_pair() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bin"), vec![1u8; 300]).unwrap();
        fs::write(dir.path().join("b.bin"), vec![2u8; 300]).unwrap();

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &options(),
            &token,
            &noop_sender(),
            &log,
        );

        let JobOutcome::Duplicates { pairs } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert!(pairs.is_empty());
    }

    #[test]
    fn three_identical_files_pair_against_one_original() {
        let dir = TempDir::new().unwrap();
        let contents = b"threepeat".to_vec();
        for name in ["one.txt", "two.txt", "three.txt"] {
            fs::write(dir.path().join(name), &contents).unwrap();
        }

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &options(),
            &token,
            &noop_sender(),
            &log,
        );

        let JobOutcome::Duplicates { pairs } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].original.path, pairs[1].original.path);
    }

    fn record(path: &std::path::Path, size: u64) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            size,
            modified: None,
            hash: None,
        }
    }

    #[test]
    fn failed_hash_is_excluded_from_pairing() {
        // A bucket of three same-size records where one file vanished
        // between the phases: the two surviving files still pair, the
        // failure is tallied, and the vanished record pairs with nothing.
        let dir = TempDir::new().unwrap();
        let contents = vec![7u8; 200];
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, &contents).unwrap();
        fs::write(&b, &contents).unwrap();
        let vanished = dir.path().join("vanished.bin");

        let mut buckets = SizeBuckets::default();
        buckets.insert(record(&a, 200));
        buckets.insert(record(&vanished, 200));
        buckets.insert(record(&b, 200));

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let outcome = pair_duplicates(&buckets, &options(), &token, &noop_sender(), &log);

        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.errors, 1);
        assert_eq!(outcome.pairs[0].original.path, a);
        assert_eq!(outcome.pairs[0].duplicate.path, b);
    }

    #[test]
    fn singleton_buckets_are_never_hashed() {
        // A vanished file with a unique size: if phase 2 ever touched it,
        // the hash failure would show up in the error count.
        let dir = TempDir::new().unwrap();
        let lone = dir.path().join("lone.bin");

        let mut buckets = SizeBuckets::default();
        buckets.insert(record(&lone, 333));

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let outcome = pair_duplicates(&buckets, &options(), &token, &noop_sender(), &log);

        assert_eq!(outcome.errors, 0);
        assert!(outcome.pairs.is_empty());
    }

    #[test]
    fn cancelling_mid_hash_returns_a_partial_summary() {
        let dir = TempDir::new().unwrap();
        let contents = vec![8u8; 120];
        fs::write(dir.path().join("a.bin"), &contents).unwrap();
        fs::write(dir.path().join("b.bin"), &contents).unwrap();

        // cancel after the first candidate is hashed; the second is never
        // read, so no pair can form
        let token = Arc::new(CancellationToken::new());
        let tx_token = Arc::clone(&token);
        let tx: StatusSender = Arc::new(move |msg| {
            if let StatusMessage::HashProgress(_) = msg {
                tx_token.cancel();
            }
        });

        let (_log_dir, log) = test_log();
        let summary = run(&[dir.path().to_path_buf()], &options(), &token, &tx, &log);

        assert!(summary.cancelled);
        assert_eq!(summary.errors, 0);
        let JobOutcome::Duplicates { pairs } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert!(pairs.is_empty());
    }

    #[test]
    fn pre_cancelled_job_reports_cancelled_and_finds_nothing() {
        let dir = TempDir::new().unwrap();
        let contents = vec![1u8; 100];
        fs::write(dir.path().join("a.bin"), &contents).unwrap();
        fs::write(dir.path().join("b.bin"), &contents).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &options(),
            &token,
            &noop_sender(),
            &log,
        );

        assert!(summary.cancelled);
        let JobOutcome::Duplicates { pairs } = &summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert!(pairs.is_empty());
    }

    #[test]
    fn progress_counts_every_candidate_once() {
        use std::sync::Mutex;

        let dir = TempDir::new().unwrap();
        let contents = vec![5u8; 150];
        fs::write(dir.path().join("a.bin"), &contents).unwrap();
        fs::write(dir.path().join("b.bin"), &contents).unwrap();
        fs::write(dir.path().join("c.bin"), vec![6u8; 151]).unwrap();

        let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_tx = Arc::clone(&seen);
        let tx: StatusSender = Arc::new(move |msg| {
            if let StatusMessage::HashProgress(p) = msg {
                seen_tx.lock().unwrap().push((p.processed, p.total));
            }
        });

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        run(&[dir.path().to_path_buf()], &options(), &token, &tx, &log);

        let progress = seen.lock().unwrap();
        // c.bin has a unique size, so only the two candidates report
        assert_eq!(*progress, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn remove_duplicates_deletes_only_the_duplicate_side() {
        let dir = TempDir::new().unwrap();
        let contents = vec![3u8; 80];
        fs::write(dir.path().join("keep.bin"), &contents).unwrap();
        fs::write(dir.path().join("drop.bin"), &contents).unwrap();

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &options(),
            &token,
            &noop_sender(),
            &log,
        );
        let JobOutcome::Duplicates { pairs } = summary.outcome else {
            panic!("wrong outcome kind");
        };
        assert_eq!(pairs.len(), 1);

        let (removed, errors) = remove_duplicates(&pairs, None, &log);
        assert_eq!((removed, errors), (1, 0));
        assert!(pairs[0].original.path.exists());
        assert!(!pairs[0].duplicate.path.exists());
    }

    #[test]
    fn remove_duplicates_can_quarantine_instead() {
        let dir = TempDir::new().unwrap();
        let quarantine = TempDir::new().unwrap();
        let contents = vec![4u8; 90];
        fs::write(dir.path().join("keep.bin"), &contents).unwrap();
        fs::write(dir.path().join("drop.bin"), &contents).unwrap();

        let token = CancellationToken::new();
        let (_log_dir, log) = test_log();
        let summary = run(
            &[dir.path().to_path_buf()],
            &options(),
            &token,
            &noop_sender(),
            &log,
        );
        let JobOutcome::Duplicates { pairs } = summary.outcome else {
            panic!("wrong outcome kind");
        };

        let (removed, errors) = remove_duplicates(&pairs, Some(quarantine.path()), &log);
        assert_eq!((removed, errors), (1, 0));
        assert!(!pairs[0].duplicate.path.exists());
        let quarantined: Vec<_> = fs::read_dir(quarantine.path()).unwrap().collect();
        assert_eq!(quarantined.len(), 1);
    }
}
