use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local};
use colored::*;
use indicatif::{HumanBytes, HumanCount, HumanDuration};

use super::status::StatusMessage;
use crate::model::JobKind;

#[derive(Debug, Default, Clone)]
pub struct StatsTimer {
    start_time: Option<Instant>,
    duration: Duration,
}

impl StatsTimer {
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        if let Some(start) = self.start_time {
            self.duration = start.elapsed();
        }
    }

    pub fn get_duration_human(&self) -> String {
        HumanDuration(self.duration).to_string()
    }
}

/// Running totals for one job, fed exclusively by the status-channel
/// consumer so workers never mutate presentation state.
#[derive(Debug, Default, Clone)]
pub struct JobStats {
    pub kind: Option<JobKind>,
    /// The wall-clock time the job started.
    pub run_start_time: Option<SystemTime>,
    pub job_timer: StatsTimer,
    pub scan_timer: StatsTimer,
    pub hash_timer: StatsTimer,

    // phase 1
    pub scan_file_count: usize,
    pub scan_file_size: u64,

    // phase 2
    pub hash_candidate_total: usize,
    pub hash_processed_count: usize,
    pub pair_count: usize,

    // organize / extract / consolidate
    pub files_total: usize,
    pub files_processed: usize,
    pub placed_count: usize,
    pub category_counts: BTreeMap<String, usize>,

    pub error_count: usize,
    pub cancelled: bool,
}

impl JobStats {
    pub fn update(&mut self, message: &StatusMessage) {
        match message {
            StatusMessage::JobStart(msg) => {
                self.kind = Some(msg.kind);
                self.run_start_time = Some(SystemTime::now());
                self.job_timer.start();
            }
            StatusMessage::ScanStart => {
                self.scan_timer.start();
            }
            StatusMessage::ScanAddFile(msg) => {
                self.scan_file_count += 1;
                self.scan_file_size += msg.file_size;
            }
            StatusMessage::ScanFinish => {
                self.scan_timer.finish();
            }
            StatusMessage::HashStart(msg) => {
                self.hash_candidate_total = msg.total_candidates;
                self.hash_timer.start();
            }
            StatusMessage::HashProgress(msg) => {
                self.hash_processed_count = msg.processed;
            }
            StatusMessage::PairFound(_) => {
                self.pair_count += 1;
            }
            StatusMessage::HashFinish => {
                self.hash_timer.finish();
            }
            StatusMessage::FilesStart(msg) => {
                self.files_total = msg.total;
            }
            StatusMessage::FileProgress(msg) => {
                self.files_processed = msg.processed;
            }
            StatusMessage::FilePlaced(msg) => {
                self.placed_count += 1;
                *self.category_counts.entry(msg.category.clone()).or_insert(0) += 1;
            }
            StatusMessage::FileError(_) => {
                self.error_count += 1;
            }
            StatusMessage::JobCancelled => {
                self.cancelled = true;
                self.job_timer.finish();
            }
            StatusMessage::JobFinish => {
                self.job_timer.finish();
            }
        }
    }

    pub fn print(&self) {
        let kind = self
            .kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!();
        println!("{} {}", "Job:".bold(), kind.cyan());
        if let Some(started) = self.run_start_time {
            let started: DateTime<Local> = started.into();
            println!("Started {}", started.format("%Y-%m-%d %H:%M:%S"));
        }
        if self.cancelled {
            println!("{}", "Cancelled by user".yellow().bold());
        }
        if self.scan_file_count > 0 {
            println!(
                "Scanned {} files, total size {} in {}",
                HumanCount(self.scan_file_count as u64).to_string().green(),
                HumanBytes(self.scan_file_size).to_string().green(),
                self.scan_timer.get_duration_human()
            );
        }
        if self.hash_candidate_total > 0 {
            println!(
                "Hashed {} of {} candidates, {} duplicate pairs in {}",
                HumanCount(self.hash_processed_count as u64).to_string().green(),
                HumanCount(self.hash_candidate_total as u64),
                HumanCount(self.pair_count as u64).to_string().red(),
                self.hash_timer.get_duration_human()
            );
        }
        if self.files_total > 0 {
            println!(
                "Processed {} of {} files",
                HumanCount(self.files_processed as u64).to_string().green(),
                HumanCount(self.files_total as u64)
            );
        }
        for (category, count) in &self.category_counts {
            println!("  {}: {}", category, count.to_string().green());
        }
        if self.error_count > 0 {
            println!(
                "{} {}",
                "Errors:".bold(),
                self.error_count.to_string().red()
            );
        }
        println!("Total time: {}", self.job_timer.get_duration_human());
    }

    pub fn write_csv(&self, path: &Path) -> csv::Result<()> {
        let kind = self
            .kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut rows: Vec<(String, String)> = vec![
            ("job_kind".to_string(), kind),
            ("cancelled".to_string(), self.cancelled.to_string()),
            ("scan_file_count".to_string(), self.scan_file_count.to_string()),
            ("scan_file_size".to_string(), self.scan_file_size.to_string()),
            (
                "hash_candidate_total".to_string(),
                self.hash_candidate_total.to_string(),
            ),
            (
                "hash_processed_count".to_string(),
                self.hash_processed_count.to_string(),
            ),
            ("pair_count".to_string(), self.pair_count.to_string()),
            ("files_total".to_string(), self.files_total.to_string()),
            ("files_processed".to_string(), self.files_processed.to_string()),
            ("placed_count".to_string(), self.placed_count.to_string()),
        ];
        for (category, count) in &self.category_counts {
            rows.push((
                format!("category_{}", category.to_lowercase()),
                count.to_string(),
            ));
        }
        rows.push(("error_count".to_string(), self.error_count.to_string()));

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["metric", "value"])?;
        for (metric, value) in rows {
            writer.write_record([metric, value])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_proc::status::{
        FilePlacedStatusMessage, HashProgressStatusMessage, HashStartStatusMessage,
        JobStartStatusMessage, PairFoundStatusMessage, ScanAddFileStatusMessage,
    };
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn messages_accumulate_into_totals() {
        let mut stats = JobStats::default();
        stats.update(&StatusMessage::JobStart(JobStartStatusMessage {
            kind: JobKind::Duplicates,
            roots: vec![PathBuf::from("/tmp")],
        }));
        stats.update(&StatusMessage::ScanStart);
        for size in [100u64, 100, 300] {
            stats.update(&StatusMessage::ScanAddFile(ScanAddFileStatusMessage {
                file_path: PathBuf::from("f"),
                file_size: size,
            }));
        }
        stats.update(&StatusMessage::ScanFinish);
        stats.update(&StatusMessage::HashStart(HashStartStatusMessage {
            total_candidates: 2,
        }));
        stats.update(&StatusMessage::HashProgress(HashProgressStatusMessage {
            processed: 2,
            total: 2,
        }));
        stats.update(&StatusMessage::PairFound(PairFoundStatusMessage {
            original: PathBuf::from("a"),
            duplicate: PathBuf::from("b"),
            file_size: 100,
        }));
        stats.update(&StatusMessage::JobFinish);

        assert_eq!(stats.kind, Some(JobKind::Duplicates));
        assert_eq!(stats.scan_file_count, 3);
        assert_eq!(stats.scan_file_size, 500);
        assert_eq!(stats.hash_processed_count, 2);
        assert_eq!(stats.pair_count, 1);
        assert!(!stats.cancelled);
    }

    #[test]
    fn cancellation_message_flags_the_stats() {
        let mut stats = JobStats::default();
        stats.update(&StatusMessage::JobCancelled);
        assert!(stats.cancelled);
    }

    #[test]
    fn csv_export_round_trips_the_counters() {
        let mut stats = JobStats::default();
        stats.update(&StatusMessage::FilePlaced(FilePlacedStatusMessage {
            category: "Documents".to_string(),
            destination: PathBuf::from("out/doc.pdf"),
        }));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.csv");
        stats.write_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("placed_count,1"));
        assert!(contents.contains("category_documents,1"));
    }
}
