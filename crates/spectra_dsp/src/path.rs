//! Render Path Construction
//!
//! Turns an averaged magnitude spectrum into a closed polyline on a
//! log-frequency / dB canvas, one point per integer pixel column. The
//! output is plain geometry; drawing it is the caller's concern.

use crate::features::DB_FLOOR;

/// Default vertical dB range of the rendered outline.
pub const PATH_MIN_DB: f32 = -80.0;
pub const PATH_MAX_DB: f32 = 12.0;

/// Target drawing area in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Linear interpolation between two known points.
#[inline]
fn lin_terp(x: f32, x0: f32, x1: f32, y0: f32, y1: f32) -> f32 {
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Map a magnitude onto a vertical pixel position for the given dB range.
fn magnitude_to_y(magnitude: f32, bounds: Rect, min_db: f32, max_db: f32) -> f32 {
    let db = if magnitude > 0.0 {
        (20.0 * magnitude.log10()).max(DB_FLOOR)
    } else {
        DB_FLOOR
    };
    let clamped = db.clamp(min_db, max_db);
    let t = (clamped - min_db) / (max_db - min_db);
    bounds.bottom() - t * bounds.height
}

/// Build a closed outline of `spectrum` over `bounds`.
///
/// Each integer pixel column maps onto a frequency along a log axis from
/// `min_hz` to `max_hz`; the magnitude at that frequency is interpolated
/// linearly between the two surrounding bins, then converted to a vertical
/// position over `min_db..max_db`. The first and last points sit on the
/// bottom edge so the outline closes into a fillable shape.
#[allow(clippy::too_many_arguments)]
pub fn build_outline(
    spectrum: &[f32],
    bounds: Rect,
    min_hz: f32,
    max_hz: f32,
    min_db: f32,
    max_db: f32,
    sample_rate: f32,
    fft_size: usize,
) -> Vec<[f32; 2]> {
    let columns = bounds.width as usize;
    if columns == 0
        || spectrum.is_empty()
        || !(min_hz > 0.0)
        || !(max_hz > min_hz)
        || !(sample_rate > 0.0)
        || fft_size == 0
        || !(max_db > min_db)
    {
        return Vec::new();
    }

    let log_min = min_hz.log10();
    let log_span = max_hz.log10() - log_min;

    let mut outline = Vec::with_capacity(columns + 2);
    outline.push([bounds.x, bounds.bottom()]);

    for column in 0..columns {
        let frequency = 10.0_f32.powf(column as f32 / bounds.width * log_span + log_min);
        let bin = frequency / sample_rate * fft_size as f32;

        let lo = (bin as usize).min(spectrum.len() - 1);
        let hi = (lo + 1).min(spectrum.len() - 1);
        let magnitude = lin_terp(bin, lo as f32, lo as f32 + 1.0, spectrum[lo], spectrum[hi]);

        outline.push([
            bounds.x + column as f32,
            magnitude_to_y(magnitude, bounds, min_db, max_db),
        ]);
    }

    outline.push([bounds.x + bounds.width, bounds.bottom()]);
    outline
}

/// [`build_outline`] with the default −80..+12 dB vertical range.
pub fn build_outline_default_range(
    spectrum: &[f32],
    bounds: Rect,
    min_hz: f32,
    max_hz: f32,
    sample_rate: f32,
    fft_size: usize,
) -> Vec<[f32; 2]> {
    build_outline(
        spectrum,
        bounds,
        min_hz,
        max_hz,
        PATH_MIN_DB,
        PATH_MAX_DB,
        sample_rate,
        fft_size,
    )
}
