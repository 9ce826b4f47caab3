//! Analyzer Bank
//!
//! A fixed set of analyzers, one per monitored channel, with fan-out
//! control operations. Per-channel routing is bounds-checked so a stale
//! channel index coming from a UI never panics the audio path.

use std::time::Duration;

use tracing::{info, warn};

use spectra_dsp::WindowMethod;

use crate::config::BankConfig;
use crate::engine::SpectralAnalyzer;
use crate::error::{EngineError, EngineResult};

pub struct AnalyzerBank {
    analyzers: Vec<SpectralAnalyzer>,
}

impl AnalyzerBank {
    /// Build one analyzer per configured channel. Nothing runs until
    /// [`setup_all`](Self::setup_all).
    pub fn new(config: BankConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;

        let analyzers = (0..config.channels)
            .map(|_| SpectralAnalyzer::new(config.analyzer.clone()))
            .collect::<EngineResult<Vec<_>>>()?;

        info!(channels = config.channels, "analyzer bank built");
        Ok(Self { analyzers })
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Start every worker.
    pub fn setup_all(&mut self, ring_capacity: usize, sample_rate: f32) -> EngineResult<()> {
        for analyzer in &mut self.analyzers {
            analyzer.setup(ring_capacity, sample_rate)?;
        }
        Ok(())
    }

    /// Switch every analyzer to a new transform size.
    pub fn set_transform_size_all(&self, selector: usize) -> EngineResult<()> {
        for analyzer in &self.analyzers {
            analyzer.set_transform_size(selector)?;
        }
        Ok(())
    }

    /// Switch every analyzer to a new windowing method.
    pub fn set_window_method_all(&self, method: WindowMethod) {
        for analyzer in &self.analyzers {
            analyzer.set_window_method(method);
        }
    }

    /// Route a block to the analyzer monitoring `channel_index`.
    ///
    /// No-op (returns `false`) when the index is out of range.
    pub fn push(
        &self,
        channel_index: usize,
        channels: &[&[f32]],
        source_channel: usize,
        channel_count: usize,
    ) -> bool {
        match self.analyzers.get(channel_index) {
            Some(analyzer) => analyzer.push(channels, source_channel, channel_count),
            None => false,
        }
    }

    pub fn get(&self, channel_index: usize) -> Option<&SpectralAnalyzer> {
        self.analyzers.get(channel_index)
    }

    /// Stop every worker, attempting all of them before reporting the
    /// first failure.
    pub fn stop_all(&mut self, timeout: Duration) -> EngineResult<()> {
        let mut first_failure = None;
        for (index, analyzer) in self.analyzers.iter_mut().enumerate() {
            match analyzer.stop(timeout) {
                Ok(()) | Err(EngineError::NotRunning) => {}
                Err(e) => {
                    warn!(channel = index, error = %e, "failed to stop analyzer");
                    first_failure.get_or_insert(e);
                }
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for AnalyzerBank {
    fn drop(&mut self) {
        let _ = self.stop_all(Duration::from_millis(100));
    }
}
