//! # cleave-core
//!
//! Real-time audio-stream segmentation engine.
//!
//! ## Architecture
//!
//! ```text
//! Microphone → AudioCapture → SPSC RingBuffer → Session(spawn_blocking)
//!                                                    │
//!                                              ChunkMonitor
//!                                    (duration + silence heuristic)
//!                                                    │
//!                            ChunkSink ◄── chunk ────┤
//!                                                    │
//!                              broadcast::Sender<ChunkBoundaryEvent>
//! ```
//!
//! The audio callback is zero-alloc. All heap work happens on the session
//! thread. The monitor itself is pure state + an injected clock, so the
//! whole decision core unit-tests without real audio or sleeping.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod monitor;
pub mod sink;

// Convenience re-exports for downstream crates
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::CleaveEngine;
pub use error::{CleaveError, Result};
pub use events::{ChunkBoundaryEvent, LevelEvent, MonitorStatus, MonitorStatusEvent};
pub use monitor::{ChunkMonitor, MonitorConfig};
pub use sink::{wav::WavSink, ChunkSink, SinkHandle};
