//! Level-to-Colour Mapping
//!
//! A fixed five-stop gradient (black, purple, red, yellow, white) used to
//! paint spectrogram cells. Magnitudes are converted to dB with a −80 dB
//! floor, mapped linearly onto 0..1, then interpolated between stops.

/// Lower bound of the colour range in dB; anything at or below paints black.
pub const GRADIENT_FLOOR_DB: f32 = -80.0;

/// Gradient stops as (position, rgb).
const STOPS: [(f32, [f32; 3]); 5] = [
    (0.0, [0.0, 0.0, 0.0]),
    (0.2, [0.5, 0.0, 0.5]),
    (0.4, [1.0, 0.0, 0.0]),
    (0.6, [1.0, 1.0, 0.0]),
    (0.8, [1.0, 1.0, 1.0]),
];

/// Heat-map style gradient from silence to full scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelGradient;

impl LevelGradient {
    pub fn new() -> Self {
        Self
    }

    /// Colour for a raw magnitude value.
    pub fn colour_for_magnitude(&self, magnitude: f32) -> [f32; 3] {
        let db = gain_to_db(magnitude);
        // -80..0 dB onto 0..1
        let position = (db - GRADIENT_FLOOR_DB) / -GRADIENT_FLOOR_DB;
        self.colour_at(position)
    }

    /// Colour at a normalized position, clamped to the gradient range.
    pub fn colour_at(&self, position: f32) -> [f32; 3] {
        let p = if position.is_finite() {
            position.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let (last_pos, last_rgb) = STOPS[STOPS.len() - 1];
        if p >= last_pos {
            return last_rgb;
        }

        for pair in STOPS.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if p < p1 {
                let t = (p - p0) / (p1 - p0);
                return [
                    c0[0] + t * (c1[0] - c0[0]),
                    c0[1] + t * (c1[1] - c0[1]),
                    c0[2] + t * (c1[2] - c0[2]),
                ];
            }
        }
        last_rgb
    }
}

/// Linear gain to dB with the gradient floor standing in for -infinity.
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(GRADIENT_FLOOR_DB)
    } else {
        GRADIENT_FLOOR_DB
    }
}
