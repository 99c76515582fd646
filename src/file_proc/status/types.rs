use std::path::PathBuf;

use crate::model::JobKind;

#[derive(Debug, Clone)]
pub struct JobStartStatusMessage {
    pub kind: JobKind,
    pub roots: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ScanAddFileStatusMessage {
    pub file_path: PathBuf,
    pub file_size: u64,
}

#[derive(Debug, Default, Clone)]
pub struct HashStartStatusMessage {
    /// Total files sitting in multi-member size buckets, known only once
    /// phase 1 has finished.
    pub total_candidates: usize,
}

#[derive(Debug, Default, Clone)]
pub struct HashProgressStatusMessage {
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct PairFoundStatusMessage {
    pub original: PathBuf,
    pub duplicate: PathBuf,
    pub file_size: u64,
}

#[derive(Debug, Default, Clone)]
pub struct FilesStartStatusMessage {
    pub total: usize,
}

#[derive(Debug, Default, Clone)]
pub struct FileProgressStatusMessage {
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct FilePlacedStatusMessage {
    pub category: String,
    pub destination: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FileErrorStatusMessage {
    pub file_path: PathBuf,
    pub message: String,
}

/// Immutable updates posted by workers onto the status channel. Exactly one
/// consumer drains these; workers never touch presentation state themselves.
#[derive(Debug, Clone)]
pub enum StatusMessage {
    JobStart(JobStartStatusMessage),
    ScanStart,
    ScanAddFile(ScanAddFileStatusMessage),
    ScanFinish,
    HashStart(HashStartStatusMessage),
    HashProgress(HashProgressStatusMessage),
    PairFound(PairFoundStatusMessage),
    HashFinish,
    FilesStart(FilesStartStatusMessage),
    FileProgress(FileProgressStatusMessage),
    FilePlaced(FilePlacedStatusMessage),
    FileError(FileErrorStatusMessage),
    JobCancelled,
    JobFinish,
}
