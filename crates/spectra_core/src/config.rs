//! Analyzer and Bank Configuration

use serde::{Deserialize, Serialize};
use spectra_dsp::{FftSize, WindowMethod};

/// Configuration for one analyzer instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: f32,

    /// Initial transform size
    pub fft_size: FftSize,

    /// Initial windowing method
    pub window: WindowMethod,

    /// Ingest ring capacity in samples; defaults to one transform plus one
    pub ring_capacity: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let fft_size = FftSize::default();
        Self {
            sample_rate: 48000.0,
            fft_size,
            window: WindowMethod::default(),
            ring_capacity: fft_size.samples() + 1,
        }
    }
}

impl AnalyzerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(8000.0..=192000.0).contains(&self.sample_rate) {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        if self.ring_capacity < self.fft_size.samples() + 1 {
            return Err(format!(
                "Ring capacity {} too small for transform size {}",
                self.ring_capacity,
                self.fft_size.samples()
            ));
        }
        if self.ring_capacity > FftSize::MAX.samples() + 1 {
            return Err(format!(
                "Ring capacity {} exceeds maximum {}",
                self.ring_capacity,
                FftSize::MAX.samples() + 1
            ));
        }
        Ok(())
    }
}

/// Configuration for a bank of per-channel analyzers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConfig {
    /// Number of monitored channels, one analyzer each
    pub channels: usize,

    /// Shared per-analyzer configuration
    pub analyzer: AnalyzerConfig,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl BankConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.channels == 0 || self.channels > 64 {
            return Err(format!("Invalid channel count: {}", self.channels));
        }
        self.analyzer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.fft_size, FftSize::S4096);
        assert_eq!(config.window, WindowMethod::BlackmanHarris);
        assert_eq!(config.ring_capacity, 4097);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = AnalyzerConfig::default();
        config.sample_rate = 100.0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.ring_capacity = 16;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.ring_capacity = FftSize::MAX.samples() + 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bank_validation() {
        assert!(BankConfig::default().validate().is_ok());

        let mut config = BankConfig::default();
        config.channels = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = AnalyzerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fft_size, config.fft_size);
        assert_eq!(back.window, config.window);
        assert_eq!(back.ring_capacity, config.ring_capacity);
    }
}
