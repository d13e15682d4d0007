//! `NullSink` — counts chunks and drops the samples.
//!
//! Useful for consumers that only care about boundary events, and for
//! exercising the engine end-to-end without touching the filesystem.

use tracing::debug;

use crate::error::Result;
use crate::events::ChunkBoundaryEvent;
use crate::sink::ChunkSink;

#[derive(Debug, Default)]
pub struct NullSink {
    chunks_written: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }
}

impl ChunkSink for NullSink {
    fn begin_session(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        debug!(sample_rate, channels, "NullSink::begin_session");
        Ok(())
    }

    fn write_chunk(&mut self, samples: &[f32], event: &ChunkBoundaryEvent) -> Result<()> {
        self.chunks_written += 1;
        debug!(
            seq = event.seq,
            samples = samples.len(),
            "NullSink discarded chunk"
        );
        Ok(())
    }

    fn end_session(&mut self) -> Result<()> {
        Ok(())
    }
}
