//! Averaging Buffer
//!
//! A fixed-height matrix of magnitude-spectrum frames combined with an
//! incremental-mean scheme. Row 0 is the live accumulator; rows 1..=4 hold
//! history. After every update the accumulator equals the unweighted mean
//! of the most recent four frames, without ever re-summing the history.
//!
//! The buffer itself is not synchronized; the engine guards it with a
//! mutex shared between the analysis worker (writer) and query callers.

/// Total rows: one accumulator plus `AVERAGER_HISTORY` history rows.
pub const AVERAGER_ROWS: usize = 5;

/// Frames that contribute to the mean.
pub const AVERAGER_HISTORY: usize = AVERAGER_ROWS - 1;

pub struct AveragingBuffer {
    /// rows[0] is the accumulator, rows[1..] the history ring.
    rows: Vec<Vec<f32>>,
    /// Next history row to overwrite, always in 1..AVERAGER_ROWS.
    cursor: usize,
    width: usize,
}

impl AveragingBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            rows: (0..AVERAGER_ROWS).map(|_| vec![0.0; width]).collect(),
            cursor: 1,
            width,
        }
    }

    /// Number of bins per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Fold a new magnitude frame into the mean.
    ///
    /// Subtracts the oldest history row from the accumulator, overwrites
    /// that row with the frame scaled by 1/history, adds it back, then
    /// advances the cursor (wrapping over the history rows only).
    pub fn push_frame(&mut self, frame: &[f32]) {
        debug_assert_eq!(frame.len(), self.width);

        let scale = 1.0 / AVERAGER_HISTORY as f32;
        let (acc, history) = self.rows.split_at_mut(1);
        let acc = &mut acc[0];
        let row = &mut history[self.cursor - 1];

        for i in 0..self.width {
            acc[i] -= row[i];
            row[i] = frame[i] * scale;
            acc[i] += row[i];
        }

        self.cursor += 1;
        if self.cursor == AVERAGER_ROWS {
            self.cursor = 1;
        }
    }

    /// The averaged spectrum (mean of the last four frames).
    pub fn accumulator(&self) -> &[f32] {
        &self.rows[0]
    }

    /// Zero everything and resize to a new spectrum width.
    pub fn reset(&mut self, width: usize) {
        for row in &mut self.rows {
            row.clear();
            row.resize(width, 0.0);
        }
        self.cursor = 1;
        self.width = width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: usize, value: f32) -> Vec<f32> {
        vec![value; width]
    }

    #[test]
    fn test_starts_zeroed() {
        let buf = AveragingBuffer::new(512);
        assert_eq!(buf.width(), 512);
        assert!(buf.accumulator().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_accumulator_is_mean_of_last_four() {
        let width = 16;
        let mut buf = AveragingBuffer::new(width);

        // Push 7 frames with distinct constant values
        for v in 1..=7 {
            buf.push_frame(&frame(width, v as f32));
        }

        // Mean of the last four frames: (4 + 5 + 6 + 7) / 4
        let expected = (4.0 + 5.0 + 6.0 + 7.0) / 4.0;
        for &v in buf.accumulator() {
            assert!((v - expected).abs() < 1e-4, "got {v}, want {expected}");
        }
    }

    #[test]
    fn test_partial_fill() {
        let width = 8;
        let mut buf = AveragingBuffer::new(width);
        buf.push_frame(&frame(width, 2.0));

        // One frame seen: accumulator holds 2.0 / 4
        for &v in buf.accumulator() {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_per_bin_independence() {
        let width = 4;
        let mut buf = AveragingBuffer::new(width);
        for _ in 0..4 {
            buf.push_frame(&[0.0, 4.0, 8.0, 12.0]);
        }
        let acc = buf.accumulator();
        assert!((acc[0] - 0.0).abs() < 1e-5);
        assert!((acc[1] - 4.0).abs() < 1e-5);
        assert!((acc[2] - 8.0).abs() < 1e-5);
        assert!((acc[3] - 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_reset_resizes_and_zeroes() {
        let mut buf = AveragingBuffer::new(32);
        buf.push_frame(&frame(32, 3.0));
        buf.reset(64);
        assert_eq!(buf.width(), 64);
        assert_eq!(buf.accumulator().len(), 64);
        assert!(buf.accumulator().iter().all(|&v| v == 0.0));

        // Still usable at the new width
        buf.push_frame(&frame(64, 1.0));
        assert!(buf.accumulator().iter().all(|&v| (v - 0.25).abs() < 1e-6));
    }
}
