//! Blocking monitor-session loop.
//!
//! ## Per-iteration stages
//!
//! ```text
//! 1. Drain ring buffer → one interleaved sample block
//! 2. Read the injected clock once
//! 3. ChunkMonitor::process_frame → Option<ChunkBoundaryEvent>
//! 4. Broadcast a LevelEvent for meters/diagnostics
//! 5. On a boundary: hand the accumulated chunk to the sink,
//!    broadcast the event, start accumulating the next chunk
//! ```
//!
//! The loop runs inside `spawn_blocking`, keeping the Tokio executor free.
//! Monitor state is owned by this thread alone; the audio callback only
//! touches the ring producer.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    buffering::{chunk::ChunkBuffer, Consumer, SampleConsumer},
    clock::Clock,
    events::{ChunkBoundaryEvent, LevelEvent, MonitorStatus, MonitorStatusEvent},
    monitor::{level::LevelMeter, ChunkMonitor, MonitorConfig},
    sink::SinkHandle,
};

pub struct SessionDiagnostics {
    pub blocks_in: AtomicUsize,
    pub samples_in: AtomicUsize,
    pub silent_blocks: AtomicUsize,
    pub frames_rejected: AtomicUsize,
    pub boundaries_emitted: AtomicUsize,
    pub chunks_written: AtomicUsize,
    pub sink_errors: AtomicUsize,
}

impl Default for SessionDiagnostics {
    fn default() -> Self {
        Self {
            blocks_in: AtomicUsize::new(0),
            samples_in: AtomicUsize::new(0),
            silent_blocks: AtomicUsize::new(0),
            frames_rejected: AtomicUsize::new(0),
            boundaries_emitted: AtomicUsize::new(0),
            chunks_written: AtomicUsize::new(0),
            sink_errors: AtomicUsize::new(0),
        }
    }
}

impl SessionDiagnostics {
    pub fn reset(&self) {
        self.blocks_in.store(0, Ordering::Relaxed);
        self.samples_in.store(0, Ordering::Relaxed);
        self.silent_blocks.store(0, Ordering::Relaxed);
        self.frames_rejected.store(0, Ordering::Relaxed);
        self.boundaries_emitted.store(0, Ordering::Relaxed);
        self.chunks_written.store(0, Ordering::Relaxed);
        self.sink_errors.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            blocks_in: self.blocks_in.load(Ordering::Relaxed),
            samples_in: self.samples_in.load(Ordering::Relaxed),
            silent_blocks: self.silent_blocks.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            boundaries_emitted: self.boundaries_emitted.load(Ordering::Relaxed),
            chunks_written: self.chunks_written.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsSnapshot {
    pub blocks_in: usize,
    pub samples_in: usize,
    pub silent_blocks: usize,
    pub frames_rejected: usize,
    pub boundaries_emitted: usize,
    pub chunks_written: usize,
    pub sink_errors: usize,
}

/// All context the session needs, passed as one struct so the closure in
/// `CleaveEngine::start` stays tidy.
pub struct SessionContext {
    pub config: MonitorConfig,
    pub sink: SinkHandle,
    pub clock: Box<dyn Clock>,
    pub consumer: SampleConsumer,
    pub running: Arc<AtomicBool>,
    pub boundary_tx: broadcast::Sender<ChunkBoundaryEvent>,
    pub level_tx: broadcast::Sender<LevelEvent>,
    pub status_tx: broadcast::Sender<MonitorStatusEvent>,
    pub status: Arc<Mutex<MonitorStatus>>,
    pub diagnostics: Arc<SessionDiagnostics>,
}

/// Frames drained from the ring per iteration (per channel).
/// ≈ 23 ms at 44.1 kHz — comfortably finer than any silence threshold.
const DRAIN_BLOCK_FRAMES: usize = 1024;

/// Minimum sleep when the ring is empty (avoids busy-wait burning a core).
const SLEEP_EMPTY_MS: u64 = 5;

/// Run the blocking session until `ctx.running` becomes false or the clock
/// proves untrustworthy.
pub fn run(mut ctx: SessionContext) {
    info!("monitor session started");

    let channels = ctx.config.channels.max(1) as usize;
    let mut raw = vec![0f32; DRAIN_BLOCK_FRAMES * channels];
    let mut monitor = ChunkMonitor::new(ctx.config.clone());
    let meter = LevelMeter::default();
    let mut chunk_buf = ChunkBuffer::new(ctx.config.sample_rate, ctx.config.channels);
    let mut level_seq = 0u64;

    if let Err(e) = ctx
        .sink
        .0
        .lock()
        .begin_session(ctx.config.sample_rate, ctx.config.channels)
    {
        error!("sink failed to open session: {e}");
        ctx.running.store(false, Ordering::SeqCst);
        set_status(&ctx, MonitorStatus::Error, Some(e.to_string()));
        return;
    }

    let mut fatal: Option<String> = None;

    loop {
        if !ctx.running.load(Ordering::Relaxed) {
            break;
        }

        let n = ctx.consumer.pop_slice(&mut raw);
        if n == 0 {
            std::thread::sleep(Duration::from_millis(SLEEP_EMPTY_MS));
            continue;
        }
        let block = &raw[..n];
        ctx.diagnostics.blocks_in.fetch_add(1, Ordering::Relaxed);
        ctx.diagnostics.samples_in.fetch_add(n, Ordering::Relaxed);

        let now = ctx.clock.now();
        let boundary = match monitor.process_frame(block, now) {
            Ok(boundary) => boundary,
            Err(e) if e.is_invalid_frame() => {
                // Recoverable: drop this block, keep the session alive.
                warn!(error = %e, "block rejected");
                ctx.diagnostics
                    .frames_rejected
                    .fetch_add(1, Ordering::Relaxed);
                continue;
            }
            Err(e) => {
                error!(error = %e, "fatal monitor error — stopping session");
                fatal = Some(e.to_string());
                break;
            }
        };

        let level = meter.measure(block);
        let is_silent = level <= ctx.config.silence_level_threshold;
        if is_silent {
            ctx.diagnostics.silent_blocks.fetch_add(1, Ordering::Relaxed);
        }
        let _ = ctx.level_tx.send(LevelEvent {
            seq: level_seq,
            level,
            is_silent,
        });
        level_seq = level_seq.saturating_add(1);

        if let Some(event) = boundary {
            debug!(
                seq = event.seq,
                at_secs = event.timestamp.as_secs_f64(),
                chunk_secs = chunk_buf.duration_secs(),
                "chunk boundary"
            );
            // The cut reflects state through the previous block, so the
            // current block belongs to the *next* chunk.
            let samples = chunk_buf.take();
            deliver_chunk(&ctx, &samples, &event);
        }
        chunk_buf.push_samples(block);
    }

    match fatal {
        None => {
            // Flush whatever accumulated after the last boundary.
            if !chunk_buf.is_empty() {
                if let Some(event) = monitor.finalize(ctx.clock.now()) {
                    info!(
                        seq = event.seq,
                        chunk_secs = chunk_buf.duration_secs(),
                        "flushing trailing chunk on stop"
                    );
                    let samples = chunk_buf.take();
                    deliver_chunk(&ctx, &samples, &event);
                }
            }
            if let Err(e) = ctx.sink.0.lock().end_session() {
                warn!("sink failed to close session: {e}");
            }
        }
        Some(detail) => {
            let _ = ctx.sink.0.lock().end_session();
            ctx.running.store(false, Ordering::SeqCst);
            set_status(&ctx, MonitorStatus::Error, Some(detail));
        }
    }

    let snap = ctx.diagnostics.snapshot();
    info!(
        blocks_in = snap.blocks_in,
        samples_in = snap.samples_in,
        silent_blocks = snap.silent_blocks,
        frames_rejected = snap.frames_rejected,
        boundaries_emitted = snap.boundaries_emitted,
        chunks_written = snap.chunks_written,
        sink_errors = snap.sink_errors,
        "monitor session stopped — diagnostics"
    );
}

/// Hand one finished chunk to the sink and broadcast the boundary.
fn deliver_chunk(ctx: &SessionContext, samples: &[f32], event: &ChunkBoundaryEvent) {
    ctx.diagnostics
        .boundaries_emitted
        .fetch_add(1, Ordering::Relaxed);

    if !samples.is_empty() {
        match ctx.sink.0.lock().write_chunk(samples, event) {
            Ok(()) => {
                ctx.diagnostics.chunks_written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                ctx.diagnostics.sink_errors.fetch_add(1, Ordering::Relaxed);
                error!(seq = event.seq, "failed to write chunk: {e}");
            }
        }
    }

    let _ = ctx.boundary_tx.send(*event);
}

fn set_status(ctx: &SessionContext, status: MonitorStatus, detail: Option<String>) {
    *ctx.status.lock() = status;
    let _ = ctx.status_tx.send(MonitorStatusEvent { status, detail });
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;
    use std::time::Instant;

    use crate::buffering::{create_sample_ring, Producer, SampleProducer};
    use crate::clock::ManualClock;
    use crate::error::Result;
    use crate::sink::ChunkSink;

    /// Records every chunk handed over, with its boundary event.
    #[derive(Clone, Default)]
    struct CollectingSink {
        chunks: Arc<Mutex<Vec<(Vec<f32>, ChunkBoundaryEvent)>>>,
        sessions_ended: Arc<AtomicUsize>,
    }

    impl ChunkSink for CollectingSink {
        fn begin_session(&mut self, _sample_rate: u32, _channels: u16) -> Result<()> {
            Ok(())
        }

        fn write_chunk(&mut self, samples: &[f32], event: &ChunkBoundaryEvent) -> Result<()> {
            self.chunks.lock().push((samples.to_vec(), *event));
            Ok(())
        }

        fn end_session(&mut self) -> Result<()> {
            self.sessions_ended.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn wait_for(mut cond: impl FnMut() -> bool, what: &str) {
        let start = Instant::now();
        while !cond() {
            if start.elapsed() >= Duration::from_secs(2) {
                panic!("timed out waiting for {what}");
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    struct Harness {
        producer: SampleProducer,
        clock: ManualClock,
        running: Arc<AtomicBool>,
        status: Arc<Mutex<MonitorStatus>>,
        diagnostics: Arc<SessionDiagnostics>,
        sink: CollectingSink,
        boundary_rx: broadcast::Receiver<ChunkBoundaryEvent>,
        handle: thread::JoinHandle<()>,
    }

    fn spawn_session(config: MonitorConfig) -> Harness {
        let (producer, consumer) = create_sample_ring();
        let clock = ManualClock::new();
        let running = Arc::new(AtomicBool::new(true));
        let status = Arc::new(Mutex::new(MonitorStatus::Monitoring));
        let diagnostics = Arc::new(SessionDiagnostics::default());
        let sink = CollectingSink::default();

        let (boundary_tx, boundary_rx) = broadcast::channel(16);
        let (level_tx, _) = broadcast::channel(64);
        let (status_tx, _) = broadcast::channel(8);

        let ctx = SessionContext {
            config,
            sink: SinkHandle::new(sink.clone()),
            clock: Box::new(clock.clone()),
            consumer,
            running: Arc::clone(&running),
            boundary_tx,
            level_tx,
            status_tx,
            status: Arc::clone(&status),
            diagnostics: Arc::clone(&diagnostics),
        };

        let handle = thread::spawn(move || run(ctx));

        Harness {
            producer,
            clock,
            running,
            status,
            diagnostics,
            sink,
            boundary_rx,
            handle,
        }
    }

    /// Push one block and wait until the session has consumed it.
    fn push_block(h: &mut Harness, block: &[f32], at: Duration) {
        let before = h.diagnostics.blocks_in.load(Ordering::Relaxed);
        h.clock.set(at);
        h.producer.push_slice(block);
        let diag = Arc::clone(&h.diagnostics);
        wait_for(
            || diag.blocks_in.load(Ordering::Relaxed) > before,
            "block to be consumed",
        );
    }

    fn base_config() -> MonitorConfig {
        MonitorConfig {
            min_chunk_duration: secs(2.0),
            silence_level_threshold: 2.0,
            min_silence_duration: secs(1.0),
            sample_rate: 1_000,
            channels: 1,
        }
    }

    #[test]
    fn boundary_cuts_chunk_and_flushes_trailer_on_stop() {
        let mut h = spawn_session(base_config());

        let loud = vec![0.5f32; 64];
        let silent = vec![0.0f32; 64];

        push_block(&mut h, &loud, secs(0.0));
        push_block(&mut h, &silent, secs(1.0)); // silent run starts
        push_block(&mut h, &silent, secs(2.0)); // both conditions arm
        push_block(&mut h, &silent, secs(3.0)); // cut fires here

        let diag = Arc::clone(&h.diagnostics);
        wait_for(
            || diag.boundaries_emitted.load(Ordering::Relaxed) >= 1,
            "boundary",
        );

        h.running.store(false, Ordering::SeqCst);
        h.handle.join().expect("session thread panicked");

        let chunks = h.sink.chunks.lock();
        assert_eq!(chunks.len(), 2, "one heuristic cut plus the stop flush");

        // First chunk: the three blocks processed before the cut.
        assert_eq!(chunks[0].0.len(), 192);
        assert_eq!(chunks[0].1.seq, 0);
        assert_eq!(chunks[0].1.timestamp, secs(3.0));

        // Trailing chunk: the block that fired the cut.
        assert_eq!(chunks[1].0.len(), 64);
        assert_eq!(chunks[1].1.seq, 1);

        assert_eq!(h.sink.sessions_ended.load(Ordering::Relaxed), 1);

        let first = h.boundary_rx.try_recv().expect("broadcast boundary");
        assert_eq!(first.seq, 0);
        let second = h.boundary_rx.try_recv().expect("broadcast trailer");
        assert_eq!(second.seq, 1);
    }

    #[test]
    fn malformed_block_is_skipped_without_killing_the_session() {
        let mut h = spawn_session(MonitorConfig {
            channels: 2,
            ..base_config()
        });

        // 3 samples cannot be a whole number of stereo frames.
        push_block(&mut h, &[0.5, 0.5, 0.5], secs(0.0));
        let diag = Arc::clone(&h.diagnostics);
        wait_for(
            || diag.frames_rejected.load(Ordering::Relaxed) >= 1,
            "rejection",
        );

        push_block(&mut h, &[0.5, 0.5, 0.5, 0.5], secs(1.0));

        h.running.store(false, Ordering::SeqCst);
        h.handle.join().expect("session thread panicked");

        // Only the valid block made it into the trailing chunk.
        let chunks = h.sink.chunks.lock();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0.len(), 4);
        assert_eq!(*h.status.lock(), MonitorStatus::Monitoring);
    }

    #[test]
    fn clock_regression_stops_the_session_with_error_status() {
        let mut h = spawn_session(base_config());

        push_block(&mut h, &[0.5f32; 64], secs(5.0));

        // Time goes backwards: fatal.
        h.clock.set(secs(2.0));
        h.producer.push_slice(&[0.5f32; 64]);

        let running = Arc::clone(&h.running);
        wait_for(
            || !running.load(Ordering::SeqCst),
            "session to stop itself",
        );
        h.handle.join().expect("session thread panicked");

        assert_eq!(*h.status.lock(), MonitorStatus::Error);
        // No flush on a fatal clock error: duration bookkeeping is suspect.
        assert!(h.sink.chunks.lock().is_empty());
        assert_eq!(h.sink.sessions_ended.load(Ordering::Relaxed), 1);
    }
}
