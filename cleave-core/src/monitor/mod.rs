//! Chunk-boundary decision core.
//!
//! ## Per-frame flow
//!
//! ```text
//! frame ──► validate ──► boundary check (previous frame's flags)
//!                              │
//!                        DurationTimer ──► duration flag
//!                              │
//!           LevelMeter ──► SilenceDetector ──► silence flag
//! ```
//!
//! The boundary check deliberately runs *before* the flags are updated for
//! the current frame, so a cut always reflects state accumulated strictly
//! through the prior frame. Changing this to update-then-check would shift
//! which frame fires the boundary.
//!
//! All state is owned by one `ChunkMonitor` value and mutated only through
//! `process_frame` — no ambient globals, no interior mutability. Work per
//! frame is O(frame length) with no allocation, so the caller's fixed
//! callback cadence is safe.

pub mod level;
pub mod silence;
pub mod timer;

use std::time::Duration;

use crate::error::{CleaveError, Result};
use crate::events::ChunkBoundaryEvent;

use level::LevelMeter;
use silence::SilenceDetector;
use timer::DurationTimer;

/// Thresholds for one monitoring session. Immutable once the monitor is
/// constructed.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Minimum elapsed wall-clock time before a boundary is eligible.
    pub min_chunk_duration: Duration,
    /// Loudness value at or below which a frame is classified silent.
    pub silence_level_threshold: f32,
    /// How long silence must run unbroken to arm the silence condition.
    pub min_silence_duration: Duration,
    /// Capture sample rate (Hz). Used for frame shape and sink metadata,
    /// never for timing — duration tracking is wall-clock.
    pub sample_rate: u32,
    /// Interleaved channel count agreed at session start.
    pub channels: u16,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_chunk_duration: Duration::from_secs(10),
            silence_level_threshold: 2.0,
            min_silence_duration: Duration::from_secs(2),
            sample_rate: 44_100,
            channels: 2,
        }
    }
}

/// The duration + silence chunking state machine.
///
/// The timer window opens when the first frame is processed, not at
/// construction, matching a capture source that may take a moment to
/// deliver its first callback.
pub struct ChunkMonitor {
    config: MonitorConfig,
    meter: LevelMeter,
    silence: SilenceDetector,
    /// `None` until the first frame is processed.
    timer: Option<DurationTimer>,
    duration_met: bool,
    silence_met: bool,
    last_now: Option<Duration>,
    next_seq: u64,
}

impl ChunkMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let silence = SilenceDetector::new(
            config.silence_level_threshold,
            config.min_silence_duration,
        );
        Self {
            meter: LevelMeter::default(),
            silence,
            timer: None,
            duration_met: false,
            silence_met: false,
            last_now: None,
            next_seq: 0,
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Whether the minimum chunk duration had elapsed as of the last frame.
    pub fn duration_condition_met(&self) -> bool {
        self.duration_met
    }

    /// Whether a sustained silent run was in effect as of the last frame.
    pub fn silence_condition_met(&self) -> bool {
        self.silence_met
    }

    /// Push one frame through the decision pipeline.
    ///
    /// Returns `Ok(Some(event))` when a boundary fires: everything that
    /// arrived since the previous boundary (or session start) forms one
    /// chunk, and the returned event's `timestamp` opens the next window.
    ///
    /// # Errors
    /// - `InvalidFrameShape` / `InvalidFrameSample`: frame rejected, no
    ///   state was touched; the caller may continue with the next frame.
    /// - `ClockWentBackwards`: fatal — duration tracking can no longer be
    ///   trusted and the session must be torn down.
    pub fn process_frame(
        &mut self,
        frame: &[f32],
        now: Duration,
    ) -> Result<Option<ChunkBoundaryEvent>> {
        self.validate_frame(frame)?;

        if let Some(last) = self.last_now {
            if now < last {
                return Err(CleaveError::ClockWentBackwards { last, now });
            }
        }
        self.last_now = Some(now);

        let timer = self
            .timer
            .get_or_insert_with(|| DurationTimer::new(now, self.config.min_chunk_duration));

        // Decide from the flags computed through the previous frame.
        let boundary = if self.duration_met && self.silence_met {
            timer.reset(now);
            self.duration_met = false;
            // Only the flag clears. The detector's run start stays: if the
            // stream is still objectively silent, the condition re-arms on
            // its own once the run length warrants it.
            self.silence_met = false;
            let seq = self.next_seq;
            self.next_seq += 1;
            Some(ChunkBoundaryEvent {
                seq,
                timestamp: now,
            })
        } else {
            None
        };

        self.duration_met = timer.elapsed_meets_threshold(now);
        let level = self.meter.measure(frame);
        self.silence_met = self.silence.observe(level, now);

        Ok(boundary)
    }

    /// Cut a terminal boundary for whatever has accumulated since the last
    /// one. Used when a session stops before the heuristic fires. Returns
    /// `None` if no frame was ever processed.
    pub fn finalize(&mut self, now: Duration) -> Option<ChunkBoundaryEvent> {
        let timer = self.timer.as_mut()?;
        timer.reset(now);
        self.duration_met = false;
        self.silence_met = false;
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(ChunkBoundaryEvent {
            seq,
            timestamp: now,
        })
    }

    fn validate_frame(&self, frame: &[f32]) -> Result<()> {
        let channels = self.config.channels.max(1);
        if frame.len() % channels as usize != 0 {
            return Err(CleaveError::InvalidFrameShape {
                len: frame.len(),
                channels,
            });
        }
        if let Some(index) = frame.iter().position(|s| !s.is_finite()) {
            return Err(CleaveError::InvalidFrameSample { index });
        }
        Ok(())
    }
}
