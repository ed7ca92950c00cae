use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A descriptor line could not be parsed
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Process {pid} has no more addresses")]
    ExhaustedTrace { pid: usize },

    /// The faulting process holds no frame that could be reused
    #[error("No frame available for process {pid}")]
    NoFrameAvailable { pid: usize },

    #[error("No eligible victim among candidate frames")]
    NoVictim,

    #[error("Frame count {frames} is not a multiple of process count {processes}")]
    FrameCountNotMultiple { processes: usize, frames: usize },

    #[error("Expected {expected} processes but loaded {loaded}")]
    ProcessCountMismatch { expected: usize, loaded: usize },

    #[error("Unknown process {0}")]
    UnknownProcess(usize),
}
