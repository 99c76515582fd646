use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use glob::Pattern;
use tracing::warn;
use walkdir::WalkDir;

use super::cancel::CancellationToken;
use super::job_log::JobLog;
use super::status::{ScanAddFileStatusMessage, StatusMessage};
use super::StatusSender;
use crate::model::FileRecord;

/// Files grouped by exact byte size, phase 1 of duplicate detection. Bucket
/// members keep traversal encounter order, and the buckets themselves are
/// iterated in first-encounter order of their size, so a run is
/// deterministic for a given enumeration.
#[derive(Debug, Default)]
pub struct SizeBuckets {
    buckets: AHashMap<u64, Vec<FileRecord>>,
    size_order: Vec<u64>,
    pub files_seen: usize,
    pub bytes_seen: u64,
    pub errors: usize,
    pub cancelled: bool,
}

impl SizeBuckets {
    pub(crate) fn insert(&mut self, record: FileRecord) {
        let bucket = self.buckets.entry(record.size).or_insert_with(|| {
            self.size_order.push(record.size);
            Vec::new()
        });
        bucket.push(record);
        self.files_seen += 1;
    }

    /// Total member count across buckets with more than one file; the
    /// denominator for phase-2 progress.
    pub fn multi_member_total(&self) -> usize {
        self.buckets
            .values()
            .filter(|b| b.len() > 1)
            .map(|b| b.len())
            .sum()
    }

    /// Multi-member buckets in first-encounter order. Singleton buckets are
    /// provably unique by size and never surface here.
    pub fn iter_multi(&self) -> impl Iterator<Item = (u64, &[FileRecord])> {
        self.size_order
            .iter()
            .filter_map(|size| self.buckets.get(size).map(|b| (*size, b.as_slice())))
            .filter(|(_, bucket)| bucket.len() > 1)
    }

    #[cfg(test)]
    pub fn bucket(&self, size: u64) -> Option<&[FileRecord]> {
        self.buckets.get(&size).map(|b| b.as_slice())
    }
}

/// Phase 1: enumerate every regular file at or above the size threshold and
/// bucket it by exact size. Cheap stat calls only; nothing is read or
/// hashed here. Cancellation is honored before each directory descent and
/// before each file is recorded, returning whatever was collected so far.
pub fn build_size_buckets(
    roots: &[PathBuf],
    min_size_kb: u64,
    ignore_patterns: &[String],
    token: &CancellationToken,
    tx_status: &StatusSender,
    log: &JobLog,
) -> SizeBuckets {
    let mut buckets = SizeBuckets::default();
    let patterns = compile_patterns(ignore_patterns, log);
    let min_size_bytes = min_size_kb * 1024;

    tx_status(StatusMessage::ScanStart);

    for root in roots {
        if token.is_cancelled() {
            buckets.cancelled = true;
            break;
        }
        visit_dir(
            root,
            min_size_bytes,
            &patterns,
            token,
            tx_status,
            log,
            &mut buckets,
        );
    }

    tx_status(StatusMessage::ScanFinish);
    buckets
}

fn visit_dir(
    dir: &Path,
    min_size_bytes: u64,
    patterns: &[Pattern],
    token: &CancellationToken,
    tx_status: &StatusSender,
    log: &JobLog,
    buckets: &mut SizeBuckets,
) {
    if token.is_cancelled() {
        buckets.cancelled = true;
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log.warning(&format!("Access error for {}: {}", dir.display(), err));
            buckets.errors += 1;
            return;
        }
    };

    for entry_result in entries {
        if token.is_cancelled() {
            buckets.cancelled = true;
            return;
        }

        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                log.warning(&format!("Unreadable entry under {}: {}", dir.display(), err));
                buckets.errors += 1;
                continue;
            }
        };
        let path = entry.path();
        if is_ignored(&path, patterns) {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                log.warning(&format!("Cannot stat {}: {}", path.display(), err));
                buckets.errors += 1;
                continue;
            }
        };

        if file_type.is_dir() {
            visit_dir(
                &path,
                min_size_bytes,
                patterns,
                token,
                tx_status,
                log,
                buckets,
            );
        } else if file_type.is_file() {
            // symlinks are neither descended nor recorded
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    log.warning(&format!("Cannot stat {}: {}", path.display(), err));
                    buckets.errors += 1;
                    continue;
                }
            };
            let size = metadata.len();
            if size == 0 || size < min_size_bytes {
                continue;
            }

            buckets.bytes_seen += size;
            tx_status(StatusMessage::ScanAddFile(ScanAddFileStatusMessage {
                file_path: path.clone(),
                file_size: size,
            }));
            buckets.insert(FileRecord::from_metadata(&path, &metadata));
        }
    }
}

/// Flat file enumeration shared by the organize, extract and consolidate
/// jobs. The full list is collected up front so a total is known before the
/// first file is touched.
#[derive(Debug, Default)]
pub struct CollectedFiles {
    pub files: Vec<PathBuf>,
    pub errors: usize,
    pub cancelled: bool,
}

pub fn collect_files(
    roots: &[PathBuf],
    deep_scan: bool,
    skip_subtree: Option<&Path>,
    token: &CancellationToken,
    log: &JobLog,
) -> CollectedFiles {
    let mut collected = CollectedFiles::default();
    let max_depth = if deep_scan { usize::MAX } else { 1 };

    'roots: for root in roots {
        for entry in WalkDir::new(root).max_depth(max_depth) {
            if token.is_cancelled() {
                collected.cancelled = true;
                break 'roots;
            }
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if let Some(skip) = skip_subtree {
                        if entry.path().starts_with(skip) {
                            continue;
                        }
                    }
                    collected.files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("enumeration error: {}", err);
                    log.warning(&format!("Enumeration error: {}", err));
                    collected.errors += 1;
                }
            }
        }
    }

    collected
}

fn compile_patterns(raw: &[String], log: &JobLog) -> Vec<Pattern> {
    raw.iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                log.warning(&format!("Ignoring bad glob pattern {:?}: {}", p, err));
                None
            }
        })
        .collect()
}

fn is_ignored(path: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches_path(path))
}
