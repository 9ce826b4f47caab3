//! Spectra DSP - Signal Processing Primitives
//!
//! This crate provides the pure analysis building blocks for Spectra:
//! - Forward FFT plans for seven power-of-two sizes (1024 to 65536)
//! - Precomputed window tables (rectangular through flat-top)
//! - Incremental-mean averaging buffer over recent spectrum frames
//! - Feature extractors: peak, harmonic series, octave bands
//! - Level-to-colour gradient and render-path geometry
//!
//! # Architecture
//!
//! Everything here is single-threaded and allocation-predictable: plans,
//! windows and buffers are built on control paths, while the per-frame
//! entry points (transform, averaging, extraction) reuse preallocated
//! storage. Threading and locking live in `spectra_core`.

mod average;
mod bands;
mod error;
mod features;
mod gradient;
mod path;
mod plan;
mod window;

pub use average::{AveragingBuffer, AVERAGER_HISTORY, AVERAGER_ROWS};
pub use bands::OctaveBands;
pub use error::DspError;
pub use features::{
    bin_to_frequency, find_harmonics, find_peak, frequency_to_bin, magnitude_db, peak_level_db,
    Harmonic, Peak, PeakAverager, DB_FLOOR, HARMONIC_STEP, PEAK_AVERAGE_DEPTH,
};
pub use gradient::{gain_to_db, LevelGradient, GRADIENT_FLOOR_DB};
pub use path::{build_outline, build_outline_default_range, Rect, PATH_MAX_DB, PATH_MIN_DB};
pub use plan::{FftSize, TransformPlanSet};
pub use window::{WindowMethod, WindowTable};
