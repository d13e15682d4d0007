//! Scalar loudness measurement.
//!
//! The metric is the Euclidean norm of the interleaved sample vector scaled
//! by a fixed gain — not an RMS. It therefore grows with the block length,
//! and the silence threshold is calibrated against the capture block size,
//! not a per-sample amplitude.

/// Gain applied to the raw norm so typical speech lands in a readable
/// 0–100 range at common device buffer sizes.
pub const METER_GAIN: f32 = 10.0;

/// Stateless loudness meter.
#[derive(Debug, Clone, Copy)]
pub struct LevelMeter {
    gain: f32,
}

impl LevelMeter {
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    /// Scaled Euclidean norm of `frame`.
    ///
    /// Pure function of the input: no state, no side effects. Zero-length
    /// and all-zero frames return exactly `0.0` — never NaN.
    pub fn measure(&self, frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = frame.iter().map(|s| s * s).sum();
        sum_sq.sqrt() * self.gain
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new(METER_GAIN)
    }
}
