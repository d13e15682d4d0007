//! Wall-clock chunk-duration window.

use std::time::Duration;

/// Measures elapsed wall-clock time since the last chunk boundary.
///
/// The timer never pauses: time spent silent (or with no frames arriving at
/// all) still counts toward the window.
#[derive(Debug, Clone, Copy)]
pub struct DurationTimer {
    window_start: Duration,
    min_duration: Duration,
}

impl DurationTimer {
    pub fn new(now: Duration, min_duration: Duration) -> Self {
        Self {
            window_start: now,
            min_duration,
        }
    }

    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.window_start)
    }

    /// Whether the minimum chunk duration has elapsed since the window start.
    pub fn elapsed_meets_threshold(&self, now: Duration) -> bool {
        self.elapsed(now) >= self.min_duration
    }

    /// Restart the window at `now`.
    pub fn reset(&mut self, now: Duration) {
        self.window_start = now;
    }

    pub fn window_start(&self) -> Duration {
        self.window_start
    }
}
