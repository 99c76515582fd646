use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use dashmap::DashMap;
use tracing::{error, info};

pub mod cancel;
pub mod classify;
pub mod consolidate;
pub mod dupes;
pub mod extract;
pub mod hash;
pub mod job_log;
pub mod organize;
pub mod scan;
pub mod schema;
pub mod stats;
pub mod status;
pub mod writer;

pub use self::cancel::CancellationToken;
pub use self::job_log::JobLog;

use crate::error::{Error, Result};
use crate::model::{JobKind, JobOutcome, JobRequest, JobSummary, ScanJob};
use self::stats::JobStats;
use self::status::{JobStartStatusMessage, StatusMessage};

/// Workers report through this; the far end is the status channel's single
/// consumer, so posting a message is the only way a worker touches
/// presentation state.
pub type StatusSender = Arc<dyn Fn(StatusMessage) + Send + Sync>;

pub type JobId = u64;

/// Owns the job registry: one worker thread per submitted job, one
/// cancellation token per job id, and the shared job log. Cancellation is
/// addressed by id so a cancel action always reaches the job it was aimed
/// at, however many jobs are in flight.
pub struct Orchestrator {
    log: Arc<JobLog>,
    next_job_id: AtomicU64,
    active_tokens: Arc<DashMap<JobId, Arc<CancellationToken>>>,
}

pub struct JobHandle {
    pub id: JobId,
    pub kind: JobKind,
    token: Arc<CancellationToken>,
    stats: Arc<Mutex<JobStats>>,
    registry: Arc<DashMap<JobId, Arc<CancellationToken>>>,
    worker: thread::JoinHandle<JobSummary>,
    status_handle: thread::JoinHandle<()>,
}

impl JobHandle {
    pub fn token(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.token)
    }

    pub fn stats(&self) -> Arc<Mutex<JobStats>> {
        Arc::clone(&self.stats)
    }

    /// Blocks until the worker and the status consumer are both done. A
    /// panicking worker is absorbed into an errored summary; the job
    /// boundary never re-raises.
    pub fn join(self) -> JobSummary {
        let summary = self.worker.join().unwrap_or_else(|_| {
            error!("worker thread panicked");
            JobSummary {
                kind: self.kind,
                cancelled: false,
                errors: 1,
                outcome: JobOutcome::empty(self.kind),
            }
        });
        let _ = self.status_handle.join();
        self.registry.remove(&self.id);
        summary
    }
}

impl Orchestrator {
    pub fn new(log: Arc<JobLog>) -> Orchestrator {
        Orchestrator {
            log,
            next_job_id: AtomicU64::new(1),
            active_tokens: Arc::new(DashMap::new()),
        }
    }

    /// Validates the request, registers a fresh token, and spawns the
    /// worker plus the status consumer. Only setup problems (no roots, a
    /// root that is not a directory) surface here; everything after
    /// submission is absorbed into the summary.
    pub fn submit(&self, job: ScanJob) -> Result<JobHandle> {
        validate_roots(&job)?;

        let id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
        let kind = job.kind();
        let token = Arc::new(CancellationToken::new());
        self.active_tokens.insert(id, Arc::clone(&token));

        let stats = Arc::new(Mutex::new(JobStats::default()));
        let (tx, rx) = mpsc::channel::<StatusMessage>();

        let status_stats = Arc::clone(&stats);
        let status_handle = thread::spawn(move || {
            status::handle_status(rx, status_stats);
        });

        let tx_status: StatusSender = Arc::new(move |msg| {
            let _ = tx.send(msg);
        });
        let worker_token = Arc::clone(&token);
        let log = Arc::clone(&self.log);
        let worker = thread::spawn(move || run_job(job, &worker_token, &tx_status, &log));

        info!(id, %kind, "job submitted");
        Ok(JobHandle {
            id,
            kind,
            token,
            stats,
            registry: Arc::clone(&self.active_tokens),
            worker,
            status_handle,
        })
    }

    /// Flags the token of the addressed job; returns false once the job has
    /// been joined and its token retired.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.active_tokens.get(&id) {
            Some(token) => {
                token.cancel();
                info!(id, "cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn active_jobs(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.active_tokens.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }
}

fn run_job(
    job: ScanJob,
    token: &CancellationToken,
    tx_status: &StatusSender,
    log: &JobLog,
) -> JobSummary {
    let kind = job.kind();
    tx_status(StatusMessage::JobStart(JobStartStatusMessage {
        kind,
        roots: job.roots.clone(),
    }));
    log.info(&format!(
        "Starting {} job over {} root(s)",
        kind,
        job.roots.len()
    ));

    let summary = match &job.request {
        JobRequest::Organize(options) => organize::run(&job.roots, options, token, tx_status, log),
        JobRequest::Duplicates(options) => dupes::run(&job.roots, options, token, tx_status, log),
        JobRequest::Extract(options) => extract::run(&job.roots, options, token, tx_status, log),
        JobRequest::Consolidate(options) => {
            consolidate::run(&job.roots, options, token, tx_status, log)
        }
    };

    if summary.cancelled {
        log.info(&format!("{} job cancelled by user", kind));
        tx_status(StatusMessage::JobCancelled);
    } else {
        log.info(&format!(
            "{} job finished with {} errors",
            kind, summary.errors
        ));
        tx_status(StatusMessage::JobFinish);
    }

    summary
}

fn validate_roots(job: &ScanJob) -> Result<()> {
    if job.roots.is_empty() {
        return Err(Error::JobSetup("no root paths given".to_string()));
    }
    for root in &job.roots {
        if !root.is_dir() {
            return Err(Error::JobSetup(format!(
                "root path {} is not a directory",
                root.display()
            )));
        }
    }
    Ok(())
}
