//! Spectral Feature Extractors
//!
//! Pure functions over an averaged magnitude spectrum: peak finder,
//! harmonic-series finder, and the moving-average peak smoother. The
//! caller is responsible for holding the averaging-buffer lock (or working
//! on a private copy) while these run.

/// Floor applied to every dB conversion so silence never becomes -inf/NaN.
pub const DB_FLOOR: f32 = -100.0;

/// Multiplicative step between successive harmonic searches. Each search
/// starts just above `previous frequency * HARMONIC_STEP` so the same
/// partial is never detected twice.
pub const HARMONIC_STEP: f32 = 1.25;

/// Depth of the peak-frequency moving-average ring.
pub const PEAK_AVERAGE_DEPTH: usize = 30;

/// An instantaneous spectral peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub bin: usize,
    pub frequency: f32,
    pub level_db: f32,
}

/// One entry of a harmonic series, ordered by harmonic index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    pub frequency: f32,
    pub level_db: f32,
    pub is_active: bool,
}

impl Harmonic {
    fn inactive() -> Self {
        Self {
            frequency: 0.0,
            level_db: DB_FLOOR,
            is_active: false,
        }
    }
}

/// Peak level in dB: `20 * log10(sqrt(magnitude))`, floored at
/// [`DB_FLOOR`] for non-positive magnitudes.
#[inline]
pub fn peak_level_db(magnitude: f32) -> f32 {
    if magnitude > 0.0 {
        (20.0 * magnitude.sqrt().log10()).max(DB_FLOOR)
    } else {
        DB_FLOOR
    }
}

/// Magnitude in dB: `20 * log10(magnitude)`, floored at [`DB_FLOOR`].
#[inline]
pub fn magnitude_db(magnitude: f32) -> f32 {
    if magnitude > 0.0 {
        (20.0 * magnitude.log10()).max(DB_FLOOR)
    } else {
        DB_FLOOR
    }
}

/// Frequency of `bin` for the given transform size.
#[inline]
pub fn bin_to_frequency(bin: usize, sample_rate: f32, fft_size: usize) -> f32 {
    sample_rate * bin as f32 / fft_size as f32
}

/// Bin index of `frequency`, computed in floating point and truncated
/// only at the end.
#[inline]
pub fn frequency_to_bin(frequency: f32, sample_rate: f32, fft_size: usize) -> usize {
    if sample_rate <= 0.0 || fft_size == 0 {
        return 0;
    }
    (frequency / sample_rate * fft_size as f32).max(0.0) as usize
}

/// Linear scan for the highest-magnitude bin.
pub fn find_peak(spectrum: &[f32], sample_rate: f32, fft_size: usize) -> Peak {
    let mut highest = 0.0_f32;
    let mut highest_bin = 0;
    for (bin, &mag) in spectrum.iter().enumerate() {
        if mag > highest {
            highest = mag;
            highest_bin = bin;
        }
    }
    Peak {
        bin: highest_bin,
        frequency: bin_to_frequency(highest_bin, sample_rate, fft_size),
        level_db: peak_level_db(highest),
    }
}

/// Find a series of `count` successive peaks.
///
/// The first harmonic is the global peak. Each subsequent search is
/// constrained to bins starting just above [`HARMONIC_STEP`] times the
/// previous harmonic's frequency, and stops early once the next start bin
/// would exceed the spectrum length; the remaining entries stay inactive.
pub fn find_harmonics(
    spectrum: &[f32],
    sample_rate: f32,
    fft_size: usize,
    count: usize,
) -> Vec<Harmonic> {
    let mut out = vec![Harmonic::inactive(); count];
    if count == 0 || spectrum.is_empty() || sample_rate <= 0.0 || fft_size == 0 {
        return out;
    }

    let fundamental = find_peak(spectrum, sample_rate, fft_size);
    out[0] = Harmonic {
        frequency: fundamental.frequency,
        level_db: magnitude_db(spectrum[fundamental.bin]),
        is_active: spectrum[fundamental.bin] > 0.0,
    };

    let mut last_bin = fundamental.bin;
    let mut last_freq = fundamental.frequency;

    for slot in out.iter_mut().skip(1) {
        let next_freq = last_freq * HARMONIC_STEP;
        let start_bin = frequency_to_bin(next_freq, sample_rate, fft_size).max(last_bin + 1);
        if start_bin >= spectrum.len() {
            break;
        }

        let mut highest = 0.0_f32;
        let mut highest_bin = start_bin;
        for (offset, &mag) in spectrum[start_bin..].iter().enumerate() {
            if mag > highest {
                highest = mag;
                highest_bin = start_bin + offset;
            }
        }

        let frequency = bin_to_frequency(highest_bin, sample_rate, fft_size);
        *slot = Harmonic {
            frequency,
            level_db: magnitude_db(highest),
            is_active: highest > 0.0,
        };
        last_bin = highest_bin;
        last_freq = frequency;
    }

    out
}

/// Fixed-depth ring of recent peak-frequency estimates producing a
/// slow-moving trend value.
#[derive(Debug, Clone)]
pub struct PeakAverager {
    slots: [f32; PEAK_AVERAGE_DEPTH],
    cursor: usize,
    full: bool,
}

impl PeakAverager {
    pub fn new() -> Self {
        Self {
            slots: [0.0; PEAK_AVERAGE_DEPTH],
            cursor: 0,
            full: false,
        }
    }

    /// Record a new peak frequency and return the current trend.
    ///
    /// Before the ring has wrapped once, the mean covers only the slots
    /// written so far; afterwards it always covers all thirty.
    pub fn push(&mut self, frequency: f32) -> f32 {
        self.slots[self.cursor] = frequency;

        let filled = if self.full {
            PEAK_AVERAGE_DEPTH
        } else {
            self.cursor + 1
        };
        let mean = self.slots[..filled.max(1)].iter().sum::<f32>() / filled.max(1) as f32;

        self.cursor += 1;
        if self.cursor >= PEAK_AVERAGE_DEPTH {
            self.cursor = 0;
            self.full = true;
        }

        mean
    }

    pub fn reset(&mut self) {
        self.slots = [0.0; PEAK_AVERAGE_DEPTH];
        self.cursor = 0;
        self.full = false;
    }
}

impl Default for PeakAverager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum_with_peaks(len: usize, peaks: &[(usize, f32)]) -> Vec<f32> {
        let mut s = vec![0.0_f32; len];
        for &(bin, mag) in peaks {
            s[bin] = mag;
        }
        s
    }

    #[test]
    fn test_find_peak() {
        let spectrum = spectrum_with_peaks(512, &[(10, 0.5), (100, 2.0), (300, 1.0)]);
        let peak = find_peak(&spectrum, 44100.0, 1024);
        assert_eq!(peak.bin, 100);
        assert!((peak.frequency - 100.0 * 44100.0 / 1024.0).abs() < 1e-3);
        assert!((peak.level_db - 20.0 * 2.0_f32.sqrt().log10()).abs() < 1e-4);
    }

    #[test]
    fn test_peak_on_silence_floors() {
        let spectrum = vec![0.0_f32; 512];
        let peak = find_peak(&spectrum, 44100.0, 1024);
        assert_eq!(peak.bin, 0);
        assert_eq!(peak.level_db, DB_FLOOR);
    }

    #[test]
    fn test_bin_math_is_floating_point() {
        // 900Hz at 44.1kHz/1024: 900 / 44100 * 1024 = 20.89 -> bin 20.
        // Integer division first would have produced 0.
        assert_eq!(frequency_to_bin(900.0, 44100.0, 1024), 20);
        assert_eq!(frequency_to_bin(0.0, 44100.0, 1024), 0);
    }

    #[test]
    fn test_harmonics_skip_the_same_partial() {
        // Fundamental at bin 100, partials at 200 and 300, plus a decoy
        // right next to the fundamental that must not be re-detected.
        let spectrum = spectrum_with_peaks(
            512,
            &[(100, 2.0), (101, 1.9), (200, 1.5), (300, 1.0)],
        );
        let harmonics = find_harmonics(&spectrum, 44100.0, 1024, 3);
        assert_eq!(harmonics.len(), 3);
        assert!(harmonics[0].is_active);
        assert!((harmonics[0].frequency - bin_to_frequency(100, 44100.0, 1024)).abs() < 1e-3);

        // Second search starts above 1.25x the fundamental (bin 125),
        // so it lands on bin 200, not the 101 decoy.
        assert!(harmonics[1].is_active);
        assert!((harmonics[1].frequency - bin_to_frequency(200, 44100.0, 1024)).abs() < 1e-3);

        assert!(harmonics[2].is_active);
        assert!((harmonics[2].frequency - bin_to_frequency(300, 44100.0, 1024)).abs() < 1e-3);
    }

    #[test]
    fn test_harmonics_stop_at_spectrum_end() {
        // Peak near the top of the spectrum: later searches run out of bins
        let spectrum = spectrum_with_peaks(512, &[(480, 1.0)]);
        let harmonics = find_harmonics(&spectrum, 44100.0, 1024, 4);
        assert!(harmonics[0].is_active);
        for h in &harmonics[1..] {
            assert!(!h.is_active);
            assert_eq!(h.level_db, DB_FLOOR);
        }
    }

    #[test]
    fn test_harmonics_ordered_by_index_not_frequency() {
        let spectrum = spectrum_with_peaks(512, &[(50, 1.0), (80, 0.4), (120, 0.6)]);
        let harmonics = find_harmonics(&spectrum, 44100.0, 1024, 3);
        // Frequencies must be strictly increasing along the series
        assert!(harmonics[1].frequency > harmonics[0].frequency);
        assert!(harmonics[2].frequency > harmonics[1].frequency);
    }

    #[test]
    fn test_moving_average_partial_then_full() {
        let mut avg = PeakAverager::new();

        // Before the ring wraps, the mean covers what was pushed so far
        let m1 = avg.push(100.0);
        assert!((m1 - 100.0).abs() < 1e-4);
        let m2 = avg.push(200.0);
        assert!((m2 - 150.0).abs() < 1e-4);

        // Fill to exactly 30 entries: 100, 200, then 28 x 300
        for _ in 0..28 {
            avg.push(300.0);
        }
        // Next push overwrites the oldest (100), window is the last 30
        let m = avg.push(400.0);
        let expected = (200.0 + 28.0 * 300.0 + 400.0) / 30.0;
        assert!((m - expected).abs() < 1e-2, "got {m}, want {expected}");
    }

    #[test]
    fn test_moving_average_exactly_thirty() {
        let mut avg = PeakAverager::new();
        let mut last = 0.0;
        for i in 1..=PEAK_AVERAGE_DEPTH {
            last = avg.push(i as f32);
        }
        let expected = (1..=PEAK_AVERAGE_DEPTH).sum::<usize>() as f32 / PEAK_AVERAGE_DEPTH as f32;
        assert!((last - expected).abs() < 1e-3);
    }

    #[test]
    fn test_moving_average_reset() {
        let mut avg = PeakAverager::new();
        for _ in 0..40 {
            avg.push(250.0);
        }
        avg.reset();
        assert!((avg.push(10.0) - 10.0).abs() < 1e-5);
    }
}
