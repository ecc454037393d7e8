use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur while analyzing an input
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Invalid worker count or other configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input could not be opened or sized
    #[error("Source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A worker's positioned read failed
    #[error("Worker {worker} read failed at offset {offset}: {source}")]
    Read {
        worker: usize,
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// A worker could not obtain its private buffer
    #[error("Worker {worker} could not allocate {bytes} bytes")]
    Allocation { worker: usize, bytes: u64 },

    /// Thread spawn or join error
    #[error("Thread error: {0}")]
    Thread(String),
}
