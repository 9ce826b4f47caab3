//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while configuring the analysis pipeline
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Invalid transform size selector: {0} (must be 1-7)")]
    InvalidSizeSelector(usize),

    #[error("Invalid window method selector: {0} (must be 0-6)")]
    InvalidWindowSelector(usize),
}
