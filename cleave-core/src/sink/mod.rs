//! Chunk consumption abstraction.
//!
//! The `ChunkSink` trait is the seam between the segmentation engine and
//! whatever happens to a finished chunk — writing a WAV file, forwarding to
//! a recognizer, or discarding. The engine hands over the buffered samples
//! exactly once per boundary; the sink owns them from there.
//!
//! `&mut self` intentionally expresses that sinks are stateful (open file
//! handles, per-session format). All mutation is serialised through
//! `SinkHandle`'s `parking_lot::Mutex`.

pub mod null;
pub mod wav;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::events::ChunkBoundaryEvent;

/// Contract for chunk consumers.
pub trait ChunkSink: Send + 'static {
    /// Called once when a monitoring session starts, before any chunk.
    /// Fixes the sample format for the session.
    fn begin_session(&mut self, sample_rate: u32, channels: u16) -> Result<()>;

    /// Consume one finalized chunk: every interleaved sample accumulated
    /// between the previous boundary (or session start) and `event`.
    fn write_chunk(&mut self, samples: &[f32], event: &ChunkBoundaryEvent) -> Result<()>;

    /// Called when the session ends, after any trailing chunk was flushed.
    fn end_session(&mut self) -> Result<()>;
}

/// Thread-safe reference-counted handle to any `ChunkSink` implementor.
#[derive(Clone)]
pub struct SinkHandle(pub Arc<Mutex<dyn ChunkSink>>);

impl SinkHandle {
    pub fn new<S: ChunkSink>(sink: S) -> Self {
        Self(Arc::new(Mutex::new(sink)))
    }
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle").finish_non_exhaustive()
    }
}
