//! Transform Plan Set
//!
//! Precomputed forward-FFT execution plans for every supported power-of-two
//! size. All seven plans are built once at construction and owned for the
//! lifetime of the engine; switching the active size is a pointer rebind,
//! never a replan.
//!
//! The transform is magnitude-only: callers get `|X[k]|` for the first
//! `size / 2` bins, which is all the downstream feature extractors need.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::error::DspError;

/// The supported transform sizes. Only this fixed menu of power-of-two
/// sizes exists; arbitrary sizes are deliberately not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FftSize {
    S1024,
    S2048,
    S4096,
    S8192,
    S16384,
    S32768,
    S65536,
}

impl FftSize {
    /// All sizes, smallest first.
    pub const ALL: [FftSize; 7] = [
        FftSize::S1024,
        FftSize::S2048,
        FftSize::S4096,
        FftSize::S8192,
        FftSize::S16384,
        FftSize::S32768,
        FftSize::S65536,
    ];

    /// The largest supported size (backing buffers are allocated for this).
    pub const MAX: FftSize = FftSize::S65536;

    /// Map a 1-based UI selector (1..=7) onto a size.
    pub fn from_selector(selector: usize) -> Result<Self, DspError> {
        match selector {
            1 => Ok(FftSize::S1024),
            2 => Ok(FftSize::S2048),
            3 => Ok(FftSize::S4096),
            4 => Ok(FftSize::S8192),
            5 => Ok(FftSize::S16384),
            6 => Ok(FftSize::S32768),
            7 => Ok(FftSize::S65536),
            other => Err(DspError::InvalidSizeSelector(other)),
        }
    }

    /// 1-based selector for this size.
    pub fn selector(self) -> usize {
        self.index() + 1
    }

    /// Zero-based index into [`FftSize::ALL`].
    pub const fn index(self) -> usize {
        match self {
            FftSize::S1024 => 0,
            FftSize::S2048 => 1,
            FftSize::S4096 => 2,
            FftSize::S8192 => 3,
            FftSize::S16384 => 4,
            FftSize::S32768 => 5,
            FftSize::S65536 => 6,
        }
    }

    /// Transform length in samples.
    pub const fn samples(self) -> usize {
        1024 << self.index()
    }

    /// Number of magnitude bins produced: `samples / 2`.
    pub const fn bins(self) -> usize {
        self.samples() / 2
    }

    /// Width of one frequency bin in Hz.
    pub fn bin_width(self, sample_rate: f32) -> f32 {
        sample_rate / self.samples() as f32
    }
}

impl Default for FftSize {
    fn default() -> Self {
        FftSize::S4096
    }
}

/// The full set of forward transform plans, one per supported size.
pub struct TransformPlanSet {
    plans: [Arc<dyn Fft<f32>>; 7],
    /// Complex working buffer, sized for the largest plan.
    work: Vec<Complex<f32>>,
    /// rustfft in-place scratch, sized for the hungriest plan.
    scratch: Vec<Complex<f32>>,
}

impl TransformPlanSet {
    /// Build all seven forward plans. Call once at engine construction;
    /// this allocates and must never run on the audio callback.
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let plans = FftSize::ALL.map(|size| planner.plan_fft_forward(size.samples()));

        let scratch_len = plans
            .iter()
            .map(|p| p.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);

        Self {
            plans,
            work: vec![Complex::new(0.0, 0.0); FftSize::MAX.samples()],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Magnitude-only forward transform.
    ///
    /// Reads `size.samples()` values from `samples` and writes
    /// `size.bins()` non-negative magnitudes into `out`. Runs on the
    /// analysis worker thread; reuses internal scratch, no allocation.
    pub fn magnitude_transform(&mut self, size: FftSize, samples: &[f32], out: &mut [f32]) {
        let n = size.samples();
        debug_assert!(samples.len() >= n);
        debug_assert!(out.len() >= size.bins());

        let work = &mut self.work[..n];
        for (slot, &sample) in work.iter_mut().zip(samples) {
            *slot = Complex::new(sample, 0.0);
        }

        self.plans[size.index()].process_with_scratch(work, &mut self.scratch);

        for (mag, c) in out[..size.bins()].iter_mut().zip(work.iter()) {
            *mag = c.norm();
        }
    }
}

impl Default for TransformPlanSet {
    fn default() -> Self {
        Self::new()
    }
}
