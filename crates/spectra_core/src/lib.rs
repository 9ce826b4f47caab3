//! Spectra Core - Real-Time Spectral Analysis Engine
//!
//! This crate wires the `spectra_dsp` primitives into a running engine:
//! - Lock-free single-producer ingest ring fed from the audio callback
//! - Background analysis worker (window, transform, averaging)
//! - Feature queries: peak, harmonics, octave bands, moving average
//! - Render-path snapshots for a drawing collaborator
//! - A bank of per-channel analyzers with fan-out control
//!
//! # Architecture
//!
//! The producer path (`SpectralAnalyzer::push`) never locks or allocates.
//! Queries and reconfiguration run on control threads and take short
//! mutexes; reconfiguration additionally suspends ingest so size changes
//! never race a drain.

mod bank;
mod config;
mod engine;
mod error;
mod ring;
mod worker;

pub use bank::AnalyzerBank;
pub use config::{AnalyzerConfig, BankConfig};
pub use engine::SpectralAnalyzer;
pub use error::{EngineError, EngineResult};
pub use ring::IngestRing;

// The DSP vocabulary callers need alongside the engine
pub use spectra_dsp::{FftSize, Harmonic, Rect, WindowMethod};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify all public types are accessible
        let config = AnalyzerConfig::default();
        let _analyzer = SpectralAnalyzer::new(config).unwrap();
        let _ring = IngestRing::new(1025);
    }
}
