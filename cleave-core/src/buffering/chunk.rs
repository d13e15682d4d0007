//! Accumulator for the chunk currently in progress.

/// Interleaved samples gathered since the last boundary, plus the shape
/// needed to interpret them.
///
/// Grows with the chunk, never with the session: `take` hands the samples
/// to the sink and leaves an empty buffer behind.
#[derive(Debug)]
pub struct ChunkBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl ChunkBuffer {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels,
        }
    }

    pub fn push_samples(&mut self, block: &[f32]) {
        self.samples.extend_from_slice(block);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Audio duration represented by the buffered samples, in seconds.
    pub fn duration_secs(&self) -> f64 {
        let channels = self.channels.max(1) as usize;
        let frames = self.samples.len() / channels;
        frames as f64 / self.sample_rate as f64
    }

    /// Drain the buffered samples, resetting the accumulator for the next
    /// chunk.
    pub fn take(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_accounts_for_channel_interleaving() {
        let mut buf = ChunkBuffer::new(1_000, 2);
        buf.push_samples(&[0.0; 500]);
        // 500 interleaved samples = 250 stereo frames at 1 kHz.
        assert!((buf.duration_secs() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn take_drains_and_resets() {
        let mut buf = ChunkBuffer::new(1_000, 1);
        buf.push_samples(&[0.1, 0.2]);
        buf.push_samples(&[0.3]);
        let samples = buf.take();
        assert_eq!(samples, vec![0.1, 0.2, 0.3]);
        assert!(buf.is_empty());
        assert_eq!(buf.duration_secs(), 0.0);
    }
}
