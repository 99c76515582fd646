use std::collections::BTreeMap;
use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::file_proc::hash::HashAlgorithm;

/// One regular file as seen during traversal. The content hash is only
/// filled in once phase 2 of a duplicate scan has touched the file; `None`
/// means not-yet-hashed or hash-failed, and such records never pair.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub hash: Option<String>,
}

impl FileRecord {
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
            hash: None,
        }
    }
}

/// Two same-size files with identical content hashes. `original` is the
/// record the traversal encountered first; the modification time on the
/// records is informational and plays no part in that choice.
#[derive(Debug, Clone)]
pub struct DuplicatePair {
    pub original: FileRecord,
    pub duplicate: FileRecord,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Organize,
    Duplicates,
    Extract,
    Consolidate,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::Organize => "organize",
            JobKind::Duplicates => "duplicates",
            JobKind::Extract => "extract",
            JobKind::Consolidate => "consolidate",
        };
        write!(f, "{}", name)
    }
}

/// A request for one run of the scan engine: the roots to traverse plus the
/// options for exactly one job kind.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub roots: Vec<PathBuf>,
    pub request: JobRequest,
}

impl ScanJob {
    pub fn kind(&self) -> JobKind {
        match self.request {
            JobRequest::Organize(_) => JobKind::Organize,
            JobRequest::Duplicates(_) => JobKind::Duplicates,
            JobRequest::Extract(_) => JobKind::Extract,
            JobRequest::Consolidate(_) => JobKind::Consolidate,
        }
    }
}

/// Options are tagged per job kind so each kind only carries what it uses.
#[derive(Debug, Clone)]
pub enum JobRequest {
    Organize(OrganizeOptions),
    Duplicates(DuplicateOptions),
    Extract(ExtractOptions),
    Consolidate(ConsolidateOptions),
}

#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    /// Root of the organized output tree; destination folders are created
    /// directly beneath it.
    pub organized_root: PathBuf,
    /// Move files into place instead of copying them.
    pub move_files: bool,
    /// Route on filename keywords before falling back to the category folder.
    pub keyword_routing: bool,
    /// Category names the job acts on; empty means all categories.
    pub enabled_categories: Vec<String>,
    /// Create the standard subfolders beneath each destination at job start.
    pub create_subfolders: bool,
    /// Recurse into subdirectories; false scans only the top level of each root.
    pub deep_scan: bool,
}

#[derive(Debug, Clone)]
pub struct DuplicateOptions {
    pub min_file_size_kb: u64,
    pub algorithm: HashAlgorithm,
    /// Glob patterns excluded from traversal.
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Root of the repository tree receiving the copies.
    pub repository_root: PathBuf,
    /// Extension allow-list, lowercase with leading dot.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConsolidateOptions {
    /// Directory the timestamped consolidated document is written to.
    pub output_dir: PathBuf,
    /// Extension allow-list, lowercase with leading dot.
    pub extensions: Vec<String>,
}

/// What a finished (or cancelled) job hands back to its caller. A job never
/// raises; per-file failures end up in `errors`.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub kind: JobKind,
    pub cancelled: bool,
    pub errors: usize,
    pub outcome: JobOutcome,
}

#[derive(Debug, Clone)]
pub enum JobOutcome {
    Organize {
        category_counts: BTreeMap<String, usize>,
        placed: usize,
    },
    Duplicates {
        pairs: Vec<DuplicatePair>,
    },
    Extract {
        /// Paths relative to the scanned root, in extraction order.
        extracted: Vec<PathBuf>,
    },
    Consolidate {
        files: usize,
        bytes: u64,
        /// Absent when the job was cancelled before the document was persisted.
        output: Option<PathBuf>,
    },
}

impl JobOutcome {
    pub fn empty(kind: JobKind) -> JobOutcome {
        match kind {
            JobKind::Organize => JobOutcome::Organize {
                category_counts: BTreeMap::new(),
                placed: 0,
            },
            JobKind::Duplicates => JobOutcome::Duplicates { pairs: Vec::new() },
            JobKind::Extract => JobOutcome::Extract {
                extracted: Vec::new(),
            },
            JobKind::Consolidate => JobOutcome::Consolidate {
                files: 0,
                bytes: 0,
                output: None,
            },
        }
    }
}
