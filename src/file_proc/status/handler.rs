use std::sync::mpsc;
use std::sync::Arc;
use std::sync::Mutex;

use console::style;
use indicatif::{HumanBytes, HumanCount, HumanDuration};

use super::progress_bars::JobStatusBar::*;
use super::progress_bars::{JobProgressBar, JobStatusBars};
use super::types::*;
use crate::file_proc::stats::JobStats;

/// The single consumer of the status channel. All stats mutation and all
/// terminal drawing happens on this thread; the loop ends when every worker
/// sender has been dropped.
pub fn handle_status(rx: mpsc::Receiver<StatusMessage>, stats: Arc<Mutex<JobStats>>) {
    let (bars, _m) = JobStatusBars::new_progress_bars();

    for message in rx {
        {
            let mut stats = stats.lock().unwrap();
            stats.update(&message);
        }
        let stats = stats.lock().unwrap();
        match message {
            StatusMessage::JobStart(msg) => {
                bars[Scan].set_message(format!(
                    "{} job starting over {} root(s)",
                    msg.kind,
                    msg.roots.len()
                ));
            }
            StatusMessage::ScanStart => {
                bars[Scan].set_prefix("Scanning:");
                bars[Scan].enable_steady_tick_default();
            }
            StatusMessage::ScanAddFile(msg) => {
                let message = format!(
                    "Scanned {} files, total size {} ({})",
                    style(HumanCount(stats.scan_file_count as u64)).bold().green(),
                    style(HumanBytes(stats.scan_file_size)).bold().green(),
                    msg.file_path.display()
                );
                bars[Scan].set_message(message);
            }
            StatusMessage::ScanFinish => {
                let message = format!(
                    "Scanned {} files, total size {} in {}",
                    style(HumanCount(stats.scan_file_count as u64)).bold().green(),
                    style(HumanBytes(stats.scan_file_size)).bold().green(),
                    HumanDuration(bars[Scan].elapsed())
                );
                bars[Scan].finish_with_finish_style(message);
            }
            StatusMessage::HashStart(msg) => {
                bars[Hash].set_prefix("Hashing:");
                bars[Hash].enable_steady_tick_default();
                bars[HashBar].set_length(msg.total_candidates as u64);
            }
            StatusMessage::HashProgress(msg) => {
                bars[HashBar].set_length(msg.total as u64);
                bars[HashBar].set_position(msg.processed as u64);
            }
            StatusMessage::PairFound(msg) => {
                let message = format!(
                    "{} pairs, last {} ({} ~ {})",
                    style(HumanCount(stats.pair_count as u64)).bold().red(),
                    HumanBytes(msg.file_size),
                    msg.original.display(),
                    msg.duplicate.display()
                );
                bars[Hash].set_message(message);
            }
            StatusMessage::HashFinish => {
                let message = format!(
                    "Hashed {} candidates, {} duplicate pairs in {}",
                    style(HumanCount(stats.hash_processed_count as u64)).bold().green(),
                    style(HumanCount(stats.pair_count as u64)).bold().red(),
                    HumanDuration(bars[Hash].elapsed())
                );
                bars[HashBar].finish_and_clear();
                bars[Hash].finish_with_finish_style(message);
            }
            StatusMessage::FilesStart(msg) => {
                bars[FileBar].set_prefix("Processing:");
                bars[FileBar].set_length(msg.total as u64);
            }
            StatusMessage::FileProgress(msg) => {
                bars[FileBar].set_length(msg.total as u64);
                bars[FileBar].set_position(msg.processed as u64);
            }
            StatusMessage::FilePlaced(msg) => {
                bars[FileBar].set_message(format!(
                    "{} -> {}",
                    msg.category,
                    msg.destination.display()
                ));
            }
            StatusMessage::FileError(msg) => {
                bars[FileBar].set_message(format!(
                    "{} {}: {}",
                    style("error:").bold().red(),
                    msg.file_path.display(),
                    msg.message
                ));
            }
            StatusMessage::JobCancelled => {
                let message = format!("{}", style("Cancelled by user").bold().yellow());
                bars[FileBar].finish_and_clear();
                bars[Scan].finish_with_finish_style(message);
            }
            StatusMessage::JobFinish => {
                if stats.files_total > 0 {
                    let message = format!(
                        "Processed {} of {} files",
                        style(HumanCount(stats.files_processed as u64)).bold().green(),
                        HumanCount(stats.files_total as u64)
                    );
                    bars[FileBar].finish_with_finish_style(message);
                }
            }
        }
    }
}
