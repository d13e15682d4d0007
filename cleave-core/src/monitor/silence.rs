//! Sustained-silence state machine.

use std::time::Duration;

/// Whether the stream is currently inside an unbroken silent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Most recent observation was above the threshold.
    Active,
    /// Unbroken silence since `run_start`.
    Silent { run_start: Duration },
}

/// Tracks whether the stream has been continuously at or below a loudness
/// threshold for a minimum duration.
///
/// A single loud observation cancels the run outright, even one that had
/// already crossed the sustain threshold. No hangover, no hysteresis.
#[derive(Debug, Clone)]
pub struct SilenceDetector {
    /// Loudness value at or below which an observation counts as silent.
    threshold: f32,
    /// How long a run must last before it is reported as sustained.
    min_run: Duration,
    phase: Phase,
}

impl SilenceDetector {
    pub fn new(threshold: f32, min_run: Duration) -> Self {
        Self {
            threshold,
            min_run,
            phase: Phase::Active,
        }
    }

    /// Feed one loudness observation, returning whether silence has been
    /// sustained for at least the configured duration.
    ///
    /// Once a run crosses the threshold this keeps returning `true` on every
    /// further silent observation, until a loud one breaks the run.
    pub fn observe(&mut self, level: f32, now: Duration) -> bool {
        if level <= self.threshold {
            match self.phase {
                Phase::Active => {
                    self.phase = Phase::Silent { run_start: now };
                    false
                }
                Phase::Silent { run_start } => now.saturating_sub(run_start) >= self.min_run,
            }
        } else {
            self.phase = Phase::Active;
            false
        }
    }

    /// Whether the most recent observation was silent.
    pub fn is_silent(&self) -> bool {
        matches!(self.phase, Phase::Silent { .. })
    }

    /// Forget any in-progress run.
    pub fn reset(&mut self) {
        self.phase = Phase::Active;
    }
}
