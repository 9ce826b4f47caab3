//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the analysis engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Analyzer already running")]
    AlreadyRunning,

    #[error("Analyzer not running")]
    NotRunning,

    #[error("Analysis worker did not stop within the timeout")]
    WorkerJoinTimeout,

    #[error("Failed to spawn analysis worker: {0}")]
    WorkerSpawnError(String),

    #[error("DSP error: {0}")]
    DspError(#[from] spectra_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
