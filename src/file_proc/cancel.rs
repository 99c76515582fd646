use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative abort flag shared between a worker and whoever asked for the
/// job. The flag is monotonic: once set it stays set, and there is no reset,
/// so a token serves exactly one job.
#[derive(Debug, Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken {
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
