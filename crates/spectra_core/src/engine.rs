//! SpectralAnalyzer Engine
//!
//! Owns one ingest ring, one analysis worker and the feature extraction
//! state for a single monitored channel. The producer side (`push`) is
//! real-time safe; every other operation is a control-path or UI-thread
//! call and may lock.
//!
//! # Architecture
//!
//! ```text
//! audio callback --push--> IngestRing --drain--> worker --> AveragingBuffer
//!                                                                |
//! UI thread  <--peak/harmonics/bands/outline-- feature queries --+
//! ```
//!
//! Reconfiguration uses a suspend flag plus the DSP mutex: raising the
//! flag stops the producer and keeps the worker from starting a new chunk,
//! taking the mutex waits out any chunk already in flight, and everything
//! downstream (ring, window, averager, feature state) is then rebuilt for
//! the new size before the flag drops again.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use spectra_dsp::{
    build_outline, find_harmonics, find_peak, AveragingBuffer, FftSize, Harmonic, OctaveBands,
    PeakAverager, Rect, TransformPlanSet, WindowMethod, WindowTable, DB_FLOOR, PATH_MAX_DB,
    PATH_MIN_DB,
};

use crate::config::AnalyzerConfig;
use crate::error::{EngineError, EngineResult};
use crate::ring::IngestRing;
use crate::worker;

/// Mutable DSP state shared with the worker. One mutex guards the whole
/// lot so a drain is atomic with respect to reconfiguration.
pub(crate) struct DspState {
    pub plans: TransformPlanSet,
    pub size: FftSize,
    pub window: WindowTable,
    /// Windowed-sample scratch, allocated once for the largest size.
    pub chunk: Vec<f32>,
    /// Magnitude-frame scratch, allocated once for the largest size.
    pub frame: Vec<f32>,
}

/// State shared between the engine handle and the worker thread.
pub(crate) struct EngineShared {
    pub ring: IngestRing,
    pub dsp: Mutex<DspState>,
    pub averager: Mutex<AveragingBuffer>,
    pub suspended: AtomicBool,
    pub shutdown: AtomicBool,
    pub done: AtomicBool,
    pub new_data: AtomicBool,
    /// Index into [`FftSize::ALL`]; mirrors `DspState::size` for queries
    /// that must not contend with the worker's drain lock.
    pub size_index: AtomicUsize,
}

/// Feature extraction state, touched only by query callers.
struct FeatureState {
    peak_averager: PeakAverager,
    bands: Option<OctaveBands>,
    last_peak_freq: f32,
    last_peak_db: f32,
    last_smoothed_freq: f32,
}

impl FeatureState {
    fn new() -> Self {
        Self {
            peak_averager: PeakAverager::new(),
            bands: None,
            last_peak_freq: 0.0,
            last_peak_db: DB_FLOOR,
            last_smoothed_freq: 0.0,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn record_peak(&mut self, frequency: f32, level_db: f32) {
        self.last_peak_freq = frequency;
        self.last_peak_db = level_db;
        self.last_smoothed_freq = self.peak_averager.push(frequency);
    }
}

/// A single-channel real-time spectrum analyzer.
pub struct SpectralAnalyzer {
    shared: Arc<EngineShared>,
    features: Mutex<FeatureState>,
    sample_rate: f32,
    wake_tx: Sender<()>,
    wake_rx: Option<Receiver<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SpectralAnalyzer {
    /// Build the analyzer: all seven transform plans, the window table
    /// and the averaging buffer at the configured size. Does not start
    /// the worker; call [`setup`](Self::setup) for that.
    pub fn new(config: AnalyzerConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;

        info!(
            size = config.fft_size.samples(),
            window = ?config.window,
            sample_rate = config.sample_rate,
            "building spectral analyzer"
        );

        let max = FftSize::MAX;
        let dsp = DspState {
            plans: TransformPlanSet::new(),
            size: config.fft_size,
            window: WindowTable::new(config.window, config.fft_size.samples()),
            chunk: vec![0.0; max.samples()],
            frame: vec![0.0; max.bins()],
        };

        let shared = Arc::new(EngineShared {
            ring: IngestRing::new(config.ring_capacity),
            dsp: Mutex::new(dsp),
            averager: Mutex::new(AveragingBuffer::new(config.fft_size.bins())),
            suspended: AtomicBool::new(true),
            shutdown: AtomicBool::new(false),
            done: AtomicBool::new(false),
            new_data: AtomicBool::new(false),
            size_index: AtomicUsize::new(config.fft_size.index()),
        });

        let (wake_tx, wake_rx) = bounded(1);

        Ok(Self {
            shared,
            features: Mutex::new(FeatureState::new()),
            sample_rate: config.sample_rate,
            wake_tx,
            wake_rx: Some(wake_rx),
            worker: None,
        })
    }

    /// Size the ring, record the stream sample rate and start the worker.
    pub fn setup(&mut self, ring_capacity: usize, sample_rate: f32) -> EngineResult<()> {
        if self.worker.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let wake_rx = self.wake_rx.take().ok_or(EngineError::AlreadyRunning)?;

        self.sample_rate = sample_rate;
        self.shared.ring.clear();
        self.shared.ring.set_capacity(ring_capacity);

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("spectra-analysis".to_string())
            .spawn(move || worker::run(shared, wake_rx))
            .map_err(|e| EngineError::WorkerSpawnError(e.to_string()))?;

        self.worker = Some(handle);
        self.shared.suspended.store(false, Ordering::Release);
        info!(ring_capacity, sample_rate, "analyzer started");
        Ok(())
    }

    /// Enqueue one block of samples, summing `channel_count` channels
    /// starting at `source_channel` into a mono stream.
    ///
    /// Real-time safe: no locks, no allocation. Returns `false` (and
    /// drops the whole block) when the analyzer is suspended, not yet
    /// set up, the channel range is out of bounds, or the ring is full.
    pub fn push(&self, channels: &[&[f32]], source_channel: usize, channel_count: usize) -> bool {
        if self.shared.suspended.load(Ordering::Acquire) {
            return false;
        }
        if !self.shared.ring.push_block(channels, source_channel, channel_count) {
            return false;
        }
        // A full channel already guarantees a pending wake-up
        let _ = self.wake_tx.try_send(());
        true
    }

    /// Switch the active transform size (selector 1..=7). Control path
    /// only: suspends ingest, waits out any in-flight chunk, rebuilds the
    /// ring, window, averager and feature state for the new size.
    pub fn set_transform_size(&self, selector: usize) -> EngineResult<()> {
        let size = FftSize::from_selector(selector)?;
        debug!(samples = size.samples(), "switching transform size");

        let was_running = self.suspend();
        {
            let mut dsp = self.shared.dsp.lock();
            self.shared.ring.clear();
            self.shared.ring.set_capacity(size.samples() + 1);
            dsp.size = size;
            dsp.window = WindowTable::new(dsp.window.method(), size.samples());
            self.shared.averager.lock().reset(size.bins());
            self.features.lock().reset();
            self.shared.size_index.store(size.index(), Ordering::Release);
        }
        self.shared.new_data.store(false, Ordering::Release);
        self.resume(was_running);
        Ok(())
    }

    /// Switch the windowing method, regenerating the table at the active
    /// size. Control path only.
    pub fn set_window_method(&self, method: WindowMethod) {
        debug!(?method, "switching window method");

        let was_running = self.suspend();
        {
            let mut dsp = self.shared.dsp.lock();
            dsp.window = WindowTable::new(method, dsp.size.samples());
        }
        self.resume(was_running);
    }

    /// One-shot flag: `true` exactly once per frame the worker completed.
    pub fn has_new_data(&self) -> bool {
        self.shared.new_data.swap(false, Ordering::AcqRel)
    }

    /// The active transform size.
    pub fn transform_size(&self) -> FftSize {
        FftSize::ALL[self.shared.size_index.load(Ordering::Acquire)]
    }

    /// The sample rate recorded at the last [`setup`](Self::setup).
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Dominant frequency and level of the averaged spectrum. Also feeds
    /// the moving-average smoother.
    pub fn query_peak(&self) -> (f32, f32) {
        let size = self.transform_size();
        let peak = {
            let averager = self.shared.averager.lock();
            find_peak(averager.accumulator(), self.sample_rate, size.samples())
        };
        self.features.lock().record_peak(peak.frequency, peak.level_db);
        (peak.frequency, peak.level_db)
    }

    /// The first `count` entries of the harmonic series.
    pub fn query_harmonics(&self, count: usize) -> Vec<Harmonic> {
        let size = self.transform_size();
        let averager = self.shared.averager.lock();
        find_harmonics(averager.accumulator(), self.sample_rate, size.samples(), count)
    }

    /// Per-band levels and central frequencies for a tenth-decade band
    /// layout over `min_hz..max_hz`. The layout is cached and recomputed
    /// only when the parameters or the transform size change.
    pub fn query_octave_bands(
        &self,
        min_hz: f32,
        max_hz: f32,
        sample_rate: f32,
    ) -> (Vec<f32>, Vec<f32>) {
        let size = self.transform_size();
        let mut features = self.features.lock();

        let stale = match &features.bands {
            Some(bands) => !bands.matches(min_hz, max_hz, sample_rate, size.samples()),
            None => true,
        };
        if stale {
            features.bands = Some(OctaveBands::compute(
                min_hz,
                max_hz,
                sample_rate,
                size.samples(),
            ));
        }

        let bands = match &features.bands {
            Some(bands) => bands,
            None => return (Vec::new(), Vec::new()),
        };
        let levels = {
            let averager = self.shared.averager.lock();
            bands.aggregate(averager.accumulator())
        };
        (levels, bands.central_frequencies().to_vec())
    }

    /// The most recently computed peak frequency, peak level and smoothed
    /// peak frequency, in that order.
    pub fn query_moving_average(&self) -> (f32, f32, f32) {
        let features = self.features.lock();
        (
            features.last_peak_freq,
            features.last_peak_db,
            features.last_smoothed_freq,
        )
    }

    /// Build a closed outline of the averaged spectrum over `bounds`,
    /// one point per pixel column on a log-frequency axis. Also updates
    /// the peak and moving-average state from the same snapshot.
    ///
    /// `db_range` defaults to −80..+12 dB.
    pub fn build_render_path(
        &self,
        bounds: Rect,
        min_hz: f32,
        max_hz: f32,
        db_range: Option<(f32, f32)>,
    ) -> Vec<[f32; 2]> {
        let size = self.transform_size();
        let snapshot: Vec<f32> = self.shared.averager.lock().accumulator().to_vec();

        let peak = find_peak(&snapshot, self.sample_rate, size.samples());
        self.features.lock().record_peak(peak.frequency, peak.level_db);

        let (min_db, max_db) = db_range.unwrap_or((PATH_MIN_DB, PATH_MAX_DB));
        build_outline(
            &snapshot,
            bounds,
            min_hz,
            max_hz,
            min_db,
            max_db,
            self.sample_rate,
            size.samples(),
        )
    }

    /// Stop the worker, waiting up to `timeout` for it to finish its
    /// current chunk. On timeout the thread is left running and
    /// [`EngineError::WorkerJoinTimeout`] is returned.
    pub fn stop(&mut self, timeout: Duration) -> EngineResult<()> {
        if self.worker.is_none() {
            return Err(EngineError::NotRunning);
        }

        self.shared.suspended.store(true, Ordering::Release);
        self.shared.shutdown.store(true, Ordering::Release);
        let _ = self.wake_tx.try_send(());

        let deadline = Instant::now() + timeout;
        while !self.shared.done.load(Ordering::Acquire) {
            if Instant::now() >= deadline {
                warn!("analysis worker did not stop in time, leaving it detached");
                return Err(EngineError::WorkerJoinTimeout);
            }
            thread::sleep(Duration::from_millis(1));
        }

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("analysis worker panicked");
            }
        }
        info!("analyzer stopped");
        Ok(())
    }

    /// Raise the suspend flag; returns whether ingest was live before.
    fn suspend(&self) -> bool {
        !self.shared.suspended.swap(true, Ordering::AcqRel)
    }

    fn resume(&self, was_running: bool) {
        if was_running {
            self.shared.suspended.store(false, Ordering::Release);
        }
    }
}

impl Drop for SpectralAnalyzer {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop(Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_block(len: usize, frequency: f32, sample_rate: f32, phase: &mut f32) -> Vec<f32> {
        let step = 2.0 * std::f32::consts::PI * frequency / sample_rate;
        (0..len)
            .map(|_| {
                let s = phase.sin();
                *phase += step;
                s
            })
            .collect()
    }

    fn started_analyzer(fft_size: FftSize, sample_rate: f32) -> SpectralAnalyzer {
        let config = AnalyzerConfig {
            sample_rate,
            fft_size,
            window: WindowMethod::Hann,
            ring_capacity: fft_size.samples() + 1,
        };
        let mut analyzer = SpectralAnalyzer::new(config).unwrap();
        analyzer.setup(fft_size.samples() + 1, sample_rate).unwrap();
        analyzer
    }

    /// Push tone blocks until the worker reports a fresh frame.
    fn feed_until_new_data(
        analyzer: &SpectralAnalyzer,
        frequency: f32,
        sample_rate: f32,
        phase: &mut f32,
    ) {
        for _ in 0..2000 {
            let block = tone_block(256, frequency, sample_rate, phase);
            analyzer.push(&[&block], 0, 1);
            if analyzer.has_new_data() {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("worker never produced a frame");
    }

    #[test]
    fn test_push_before_setup_is_noop() {
        let analyzer = SpectralAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let block = [0.5_f32; 64];
        assert!(!analyzer.push(&[&block], 0, 1));
    }

    #[test]
    fn test_double_setup_rejected() {
        let mut analyzer = started_analyzer(FftSize::S1024, 44100.0);
        assert!(matches!(
            analyzer.setup(1025, 44100.0),
            Err(EngineError::AlreadyRunning)
        ));
        analyzer.stop(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_stop_without_setup() {
        let mut analyzer = SpectralAnalyzer::new(AnalyzerConfig::default()).unwrap();
        assert!(matches!(
            analyzer.stop(Duration::from_millis(10)),
            Err(EngineError::NotRunning)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalyzerConfig::default();
        config.sample_rate = -1.0;
        assert!(matches!(
            SpectralAnalyzer::new(config),
            Err(EngineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_tone_peak_within_one_bin() {
        let sample_rate = 44100.0;
        let size = FftSize::S1024;
        let mut analyzer = started_analyzer(size, sample_rate);

        let mut phase = 0.0;
        // Several frames so the 4-deep averager settles
        for _ in 0..6 {
            feed_until_new_data(&analyzer, 1000.0, sample_rate, &mut phase);
        }

        let (frequency, level_db) = analyzer.query_peak();
        let bin_width = size.bin_width(sample_rate);
        assert!(
            (frequency - 1000.0).abs() <= bin_width,
            "peak at {frequency} Hz, expected within {bin_width} of 1000"
        );
        assert!(level_db > DB_FLOOR);

        let (last_freq, last_db, smoothed) = analyzer.query_moving_average();
        assert_eq!(last_freq, frequency);
        assert_eq!(last_db, level_db);
        assert!((smoothed - frequency).abs() <= bin_width);

        analyzer.stop(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_harmonics_of_tone() {
        let sample_rate = 44100.0;
        let mut analyzer = started_analyzer(FftSize::S1024, sample_rate);

        let mut phase = 0.0;
        for _ in 0..6 {
            feed_until_new_data(&analyzer, 2000.0, sample_rate, &mut phase);
        }

        let harmonics = analyzer.query_harmonics(4);
        assert_eq!(harmonics.len(), 4);
        assert!(harmonics[0].is_active);
        assert!((harmonics[0].frequency - 2000.0).abs() <= 2.0 * 43.07);

        analyzer.stop(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_octave_bands_of_tone() {
        let sample_rate = 44100.0;
        let mut analyzer = started_analyzer(FftSize::S1024, sample_rate);

        let mut phase = 0.0;
        for _ in 0..6 {
            feed_until_new_data(&analyzer, 1000.0, sample_rate, &mut phase);
        }

        let (levels, centrals) = analyzer.query_octave_bands(20.0, 20000.0, sample_rate);
        assert_eq!(levels.len(), centrals.len());
        assert!(!levels.is_empty());

        // The hottest band should sit near 1 kHz
        let hottest = levels
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let central = centrals[hottest];
        assert!(
            (500.0..2000.0).contains(&central),
            "hottest band centred at {central} Hz"
        );

        analyzer.stop(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_render_path_of_tone() {
        let sample_rate = 44100.0;
        let mut analyzer = started_analyzer(FftSize::S1024, sample_rate);

        let mut phase = 0.0;
        for _ in 0..6 {
            feed_until_new_data(&analyzer, 1000.0, sample_rate, &mut phase);
        }

        let bounds = Rect::new(0.0, 0.0, 200.0, 100.0);
        let outline = analyzer.build_render_path(bounds, 20.0, 20000.0, None);
        assert_eq!(outline.len(), 202);
        // Something must rise above the bottom edge
        assert!(outline[1..201].iter().any(|p| p[1] < 100.0));

        // The path call also refreshed the moving-average state
        let (last_freq, _, _) = analyzer.query_moving_average();
        assert!(last_freq > 0.0);

        analyzer.stop(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_reconfigure_mid_stream() {
        let sample_rate = 44100.0;
        let mut analyzer = started_analyzer(FftSize::S1024, sample_rate);

        let mut phase = 0.0;
        for _ in 0..6 {
            feed_until_new_data(&analyzer, 1000.0, sample_rate, &mut phase);
        }

        analyzer.set_transform_size(2).unwrap();
        assert_eq!(analyzer.transform_size(), FftSize::S2048);

        // Everything downstream was reset
        assert!(!analyzer.has_new_data());
        let (frequency, level_db) = analyzer.query_peak();
        assert_eq!(frequency, 0.0);
        assert_eq!(level_db, DB_FLOOR);

        // And the analyzer keeps working at the new size
        for _ in 0..6 {
            feed_until_new_data(&analyzer, 1000.0, sample_rate, &mut phase);
        }
        let (frequency, _) = analyzer.query_peak();
        let bin_width = FftSize::S2048.bin_width(sample_rate);
        assert!((frequency - 1000.0).abs() <= bin_width);

        analyzer.stop(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_window_method_switch() {
        let sample_rate = 44100.0;
        let mut analyzer = started_analyzer(FftSize::S1024, sample_rate);

        analyzer.set_window_method(WindowMethod::FlatTop);

        let mut phase = 0.0;
        for _ in 0..6 {
            feed_until_new_data(&analyzer, 1000.0, sample_rate, &mut phase);
        }
        let (frequency, _) = analyzer.query_peak();
        assert!((frequency - 1000.0).abs() <= 2.0 * FftSize::S1024.bin_width(sample_rate));

        analyzer.stop(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_invalid_size_selector() {
        let analyzer = started_analyzer(FftSize::S1024, 44100.0);
        assert!(analyzer.set_transform_size(0).is_err());
        assert!(analyzer.set_transform_size(8).is_err());
        drop(analyzer);
    }

    #[test]
    fn test_stop_is_prompt() {
        let mut analyzer = started_analyzer(FftSize::S1024, 44100.0);
        let start = Instant::now();
        analyzer.stop(Duration::from_secs(2)).unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
