//! Window Tables
//!
//! Precomputed windowing coefficients applied to each sample chunk before
//! the forward transform to reduce spectral leakage. The table is sized to
//! the active transform length and regenerated whenever the method or the
//! size changes; applying it is a plain element-wise multiply.

use serde::{Deserialize, Serialize};

use crate::error::DspError;

/// Selectable windowing methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowMethod {
    Rectangular,
    Triangular,
    Hann,
    Hamming,
    Blackman,
    BlackmanHarris,
    FlatTop,
}

impl WindowMethod {
    /// Map a 0-based UI selector onto a method.
    pub fn from_selector(selector: usize) -> Result<Self, DspError> {
        match selector {
            0 => Ok(WindowMethod::Rectangular),
            1 => Ok(WindowMethod::Triangular),
            2 => Ok(WindowMethod::Hann),
            3 => Ok(WindowMethod::Hamming),
            4 => Ok(WindowMethod::Blackman),
            5 => Ok(WindowMethod::BlackmanHarris),
            6 => Ok(WindowMethod::FlatTop),
            other => Err(DspError::InvalidWindowSelector(other)),
        }
    }

    /// Coefficient for position `n` of an `size`-point window.
    fn coefficient(self, n: usize, size: usize) -> f32 {
        if size < 2 {
            return 1.0;
        }
        let x = 2.0 * std::f32::consts::PI * n as f32 / (size - 1) as f32;
        match self {
            WindowMethod::Rectangular => 1.0,
            WindowMethod::Triangular => {
                let half = (size - 1) as f32 / 2.0;
                1.0 - ((n as f32 - half) / half).abs()
            }
            WindowMethod::Hann => 0.5 * (1.0 - x.cos()),
            WindowMethod::Hamming => 0.54 - 0.46 * x.cos(),
            WindowMethod::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            WindowMethod::BlackmanHarris => {
                0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                    - 0.01168 * (3.0 * x).cos()
            }
            WindowMethod::FlatTop => {
                0.215_578_95 - 0.416_631_58 * x.cos() + 0.277_263_16 * (2.0 * x).cos()
                    - 0.083_578_95 * (3.0 * x).cos()
                    + 0.006_947_368 * (4.0 * x).cos()
            }
        }
    }
}

impl Default for WindowMethod {
    fn default() -> Self {
        WindowMethod::BlackmanHarris
    }
}

/// A coefficient table for one method at one transform length.
pub struct WindowTable {
    method: WindowMethod,
    coeffs: Vec<f32>,
}

impl WindowTable {
    /// Build a table for `method` at `len` points. Control path only.
    pub fn new(method: WindowMethod, len: usize) -> Self {
        let coeffs = (0..len).map(|n| method.coefficient(n, len)).collect();
        Self { method, coeffs }
    }

    pub fn method(&self) -> WindowMethod {
        self.method
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Multiply `chunk` element-wise with the table.
    #[inline]
    pub fn apply(&self, chunk: &mut [f32]) {
        debug_assert_eq!(chunk.len(), self.coeffs.len());
        for (sample, &coeff) in chunk.iter_mut().zip(&self.coeffs) {
            *sample *= coeff;
        }
    }
}
