use thiserror::Error;

/// Failures that can escape the engine to a caller. Per-file problems are
/// absorbed into the job summary's error count and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("job setup error: {0}")]
    JobSetup(String),
}

pub type Result<T> = std::result::Result<T, Error>;
