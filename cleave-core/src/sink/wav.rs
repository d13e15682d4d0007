//! `WavSink` — one 16-bit PCM WAV file per chunk.

use std::path::PathBuf;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

use crate::error::{CleaveError, Result};
use crate::events::ChunkBoundaryEvent;
use crate::sink::ChunkSink;

/// Writes each chunk as `chunk-NNNN.wav` under a target directory, numbered
/// by the boundary sequence. The directory is created on session start.
pub struct WavSink {
    dir: PathBuf,
    /// Fixed per session by `begin_session`; `None` while no session is open.
    spec: Option<WavSpec>,
}

impl WavSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            spec: None,
        }
    }
}

impl ChunkSink for WavSink {
    fn begin_session(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        self.spec = Some(WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        });
        Ok(())
    }

    fn write_chunk(&mut self, samples: &[f32], event: &ChunkBoundaryEvent) -> Result<()> {
        let spec = self
            .spec
            .ok_or_else(|| CleaveError::Sink("no session open".into()))?;

        let path = self.dir.join(format!("chunk-{:04}.wav", event.seq));
        let mut writer =
            WavWriter::create(&path, spec).map_err(|e| CleaveError::Sink(e.to_string()))?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| CleaveError::Sink(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| CleaveError::Sink(e.to_string()))?;

        info!(
            path = %path.display(),
            samples = samples.len(),
            at_secs = event.timestamp.as_secs_f64(),
            "chunk written"
        );
        Ok(())
    }

    fn end_session(&mut self) -> Result<()> {
        self.spec = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cleave-wav-{tag}-{}", std::process::id()))
    }

    #[test]
    fn writes_a_readable_wav_per_chunk() {
        let dir = temp_dir("write");
        let mut sink = WavSink::new(&dir);
        sink.begin_session(8_000, 1).expect("begin session");

        let event = ChunkBoundaryEvent {
            seq: 3,
            timestamp: Duration::from_secs(12),
        };
        let samples = vec![0.5f32; 160];
        sink.write_chunk(&samples, &event).expect("write chunk");
        sink.end_session().expect("end session");

        let path = dir.join("chunk-0003.wav");
        let reader = hound::WavReader::open(&path).expect("chunk file should open");
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 160);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn write_without_session_is_an_error() {
        let mut sink = WavSink::new(temp_dir("nosession"));
        let event = ChunkBoundaryEvent {
            seq: 0,
            timestamp: Duration::ZERO,
        };
        let err = sink.write_chunk(&[0.0; 10], &event);
        assert!(matches!(err, Err(CleaveError::Sink(_))));
    }
}
