use std::time::Duration;

use thiserror::Error;

/// All errors produced by cleave-core.
#[derive(Debug, Error)]
pub enum CleaveError {
    #[error("invalid frame: length {len} is not a multiple of {channels} channels")]
    InvalidFrameShape { len: usize, channels: u16 },

    #[error("invalid frame: non-finite sample at index {index}")]
    InvalidFrameSample { index: usize },

    #[error("clock went backwards: read {now:?} after {last:?}")]
    ClockWentBackwards { last: Duration, now: Duration },

    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("audio stream error: {0}")]
    AudioStream(String),

    #[error("no default input device found")]
    NoDefaultInputDevice,

    #[error("chunk sink error: {0}")]
    Sink(String),

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CleaveError {
    /// True for per-frame rejections the caller may recover from by simply
    /// submitting the next frame. Everything else is fatal to the session.
    pub fn is_invalid_frame(&self) -> bool {
        matches!(
            self,
            Self::InvalidFrameShape { .. } | Self::InvalidFrameSample { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CleaveError>;
