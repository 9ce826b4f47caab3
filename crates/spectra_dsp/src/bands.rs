//! Octave Band Partitioning
//!
//! Splits the magnitude spectrum into logarithmically spaced bands of
//! roughly a tenth of a decade each, the familiar 1/3-octave analyzer
//! layout. The band edges depend only on (min, max, sample rate, transform
//! size), so the engine computes them once per configuration and reuses
//! them for every frame.

use crate::features::frequency_to_bin;

/// One band: a tenth of a decade wide, `lower * 10^0.05 == central` and
/// `central * 10^0.05 == upper`.
const DECADE_RATIO: f32 = 1.258_925_4; // 10^0.1
const HALF_STEP: f32 = 1.122_018_5; // 10^0.05

/// Precomputed octave-band layout for one analyzer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OctaveBands {
    lower: Vec<f32>,
    central: Vec<f32>,
    upper: Vec<f32>,
    /// Bin boundary of each band, plus a final entry at `fft_size / 2`.
    band_starts: Vec<usize>,
    min_hz: f32,
    max_hz: f32,
    sample_rate: f32,
    fft_size: usize,
}

impl OctaveBands {
    /// Lay out bands covering `min_hz..max_hz`. Malformed parameters
    /// (min >= max, non-positive rate or size) yield an empty layout.
    pub fn compute(min_hz: f32, max_hz: f32, sample_rate: f32, fft_size: usize) -> Self {
        let mut bands = Self {
            lower: Vec::new(),
            central: Vec::new(),
            upper: Vec::new(),
            band_starts: Vec::new(),
            min_hz,
            max_hz,
            sample_rate,
            fft_size,
        };

        if !(min_hz > 0.0) || !(max_hz > min_hz) || !(sample_rate > 0.0) || fft_size == 0 {
            return bands;
        }

        let mut lower = min_hz;
        while lower < max_hz {
            let central = lower * HALF_STEP;
            let upper = lower * DECADE_RATIO;
            bands.lower.push(lower);
            bands.central.push(central);
            bands.upper.push(upper);
            bands
                .band_starts
                .push(frequency_to_bin(lower, sample_rate, fft_size).min(fft_size / 2));
            lower = upper;
        }
        bands.band_starts.push(fft_size / 2);

        // Bin granularity can collapse neighbouring low bands onto the
        // same start; keep the boundaries non-decreasing regardless.
        for i in 1..bands.band_starts.len() {
            if bands.band_starts[i] < bands.band_starts[i - 1] {
                bands.band_starts[i] = bands.band_starts[i - 1];
            }
        }

        bands
    }

    /// Whether this layout was computed for the given parameters.
    pub fn matches(&self, min_hz: f32, max_hz: f32, sample_rate: f32, fft_size: usize) -> bool {
        self.min_hz == min_hz
            && self.max_hz == max_hz
            && self.sample_rate == sample_rate
            && self.fft_size == fft_size
    }

    pub fn len(&self) -> usize {
        self.central.len()
    }

    pub fn is_empty(&self) -> bool {
        self.central.is_empty()
    }

    /// Central frequency of each band, in Hz.
    pub fn central_frequencies(&self) -> &[f32] {
        &self.central
    }

    /// Per-band level: the mean magnitude of the member bins.
    ///
    /// Empty bands divide by one instead of zero, and any non-finite or
    /// negative result is sanitized to zero.
    pub fn aggregate(&self, spectrum: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0_f32; self.len()];
        for (band, level) in out.iter_mut().enumerate() {
            let start = self.band_starts[band].min(spectrum.len());
            let end = self.band_starts[band + 1].min(spectrum.len());

            let sum: f32 = spectrum[start..end].iter().sum();
            let count = (end - start).max(1);
            let value = sum / count as f32;
            *level = if value.is_finite() && value > 0.0 {
                value
            } else {
                0.0
            };
        }
        out
    }
}
