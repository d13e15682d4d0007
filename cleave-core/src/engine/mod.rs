//! `CleaveEngine` — top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! CleaveEngine::new()
//!     └─► start()        → device open, session spawned, status = Monitoring
//!         └─► stop()     → running = false, stream dropped, status = Stopped
//! ```
//!
//! `start()`/`stop()` are idempotent: calling them in the wrong state
//! returns an error rather than panicking.
//!
//! ## Threading
//!
//! `cpal::Stream` is `!Send` on Windows/macOS (COM / CoreAudio thread
//! affinity). `AudioCapture` is therefore created *inside* the
//! `spawn_blocking` closure so it never crosses a thread boundary. A
//! bounded crossbeam channel propagates any open-device error back to the
//! `start()` caller, along with the device's actual format.

pub mod session;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    audio::AudioCapture,
    buffering::create_sample_ring,
    clock::SystemClock,
    error::{CleaveError, Result},
    events::{ChunkBoundaryEvent, LevelEvent, MonitorStatus, MonitorStatusEvent},
    monitor::MonitorConfig,
    sink::SinkHandle,
};

/// Broadcast channel capacity: events buffered for slow consumers. A
/// consumer that lags simply misses events — the session never blocks.
const BROADCAST_CAP: usize = 256;

/// The top-level engine handle.
///
/// `CleaveEngine` is `Send + Sync` — all fields use interior mutability.
/// Wrap in `Arc<CleaveEngine>` to share with event-forwarding tasks.
pub struct CleaveEngine {
    config: MonitorConfig,
    sink: SinkHandle,
    /// `true` while capture + session are active.
    running: Arc<AtomicBool>,
    /// Canonical status (written atomically via Mutex, read from callers).
    status: Arc<Mutex<MonitorStatus>>,
    boundary_tx: broadcast::Sender<ChunkBoundaryEvent>,
    level_tx: broadcast::Sender<LevelEvent>,
    status_tx: broadcast::Sender<MonitorStatusEvent>,
    diagnostics: Arc<session::SessionDiagnostics>,
}

impl CleaveEngine {
    /// Create a new engine. Does not open any device — call `start()`.
    pub fn new(config: MonitorConfig, sink: SinkHandle) -> Self {
        let (boundary_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (level_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);

        Self {
            config,
            sink,
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(MonitorStatus::Idle)),
            boundary_tx,
            level_tx,
            status_tx,
            diagnostics: Arc::new(session::SessionDiagnostics::default()),
        }
    }

    /// Start capture on the default input device and run the session.
    pub fn start(&self) -> Result<()> {
        self.start_with_device(None)
    }

    /// Start the engine using a preferred input device name.
    ///
    /// Blocks until the audio device is confirmed open (or fails), then
    /// returns; the session continues in a background blocking thread. The
    /// monitor adopts the device's actual sample rate and channel count.
    ///
    /// # Errors
    /// - `CleaveError::AlreadyRunning` if already started.
    /// - `CleaveError::NoDefaultInputDevice` / `CleaveError::AudioStream`
    ///   on device failure.
    pub fn start_with_device(&self, preferred_input_device: Option<String>) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CleaveError::AlreadyRunning);
        }

        self.diagnostics.reset();
        self.running.store(true, Ordering::SeqCst);
        self.set_status(MonitorStatus::Monitoring, None);

        let (producer, consumer) = create_sample_ring();

        // Clone all Arc-wrapped state before moving into the closure.
        let config = self.config.clone();
        let sink = self.sink.clone();
        let running = Arc::clone(&self.running);
        let boundary_tx = self.boundary_tx.clone();
        let level_tx = self.level_tx.clone();
        let status_tx = self.status_tx.clone();
        let status = Arc::clone(&self.status);
        let diagnostics = Arc::clone(&self.diagnostics);

        // Bounded handshake: session thread reports open success/failure,
        // carrying the actual device format on success.
        let (open_tx, open_rx) = crossbeam_channel::bounded::<Result<(u32, u16)>>(1);

        tokio::task::spawn_blocking(move || {
            // Open the device on THIS thread — cpal::Stream is !Send.
            let capture = match AudioCapture::open_with_preference(
                producer,
                Arc::clone(&running),
                preferred_input_device.as_deref(),
            ) {
                Ok(c) => {
                    let _ = open_tx.send(Ok((c.sample_rate, c.channels)));
                    c
                }
                Err(e) => {
                    let _ = open_tx.send(Err(e));
                    running.store(false, Ordering::SeqCst);
                    return;
                }
            };

            // The device, not the config, decides the session's shape.
            let session_config = MonitorConfig {
                sample_rate: capture.sample_rate,
                channels: capture.channels,
                ..config
            };

            session::run(session::SessionContext {
                config: session_config,
                sink,
                clock: Box::new(SystemClock::new()),
                consumer,
                running,
                boundary_tx,
                level_tx,
                status_tx,
                status,
                diagnostics,
            });

            // Stream drops here, releasing the audio device on this thread.
            drop(capture);
        });

        match open_rx.recv() {
            Ok(Ok((sample_rate, channels))) => {
                info!(sample_rate, channels, "engine started — monitoring");
                Ok(())
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                self.set_status(MonitorStatus::Error, Some(e.to_string()));
                Err(e)
            }
            Err(_) => {
                // Channel closed before a message — spawn_blocking panicked?
                self.running.store(false, Ordering::SeqCst);
                self.set_status(MonitorStatus::Error, Some("session failed to start".into()));
                Err(CleaveError::Other(anyhow::anyhow!(
                    "session task died unexpectedly"
                )))
            }
        }
    }

    /// Stop capture and the session.
    ///
    /// # Errors
    /// - `CleaveError::NotRunning` if not currently running.
    pub fn stop(&self) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(CleaveError::NotRunning);
        }

        self.running.store(false, Ordering::SeqCst);
        self.set_status(MonitorStatus::Stopped, None);
        info!("engine stop requested");
        Ok(())
    }

    /// Current engine status (snapshot).
    pub fn status(&self) -> MonitorStatus {
        *self.status.lock()
    }

    /// Subscribe to chunk boundary events.
    pub fn subscribe_boundaries(&self) -> broadcast::Receiver<ChunkBoundaryEvent> {
        self.boundary_tx.subscribe()
    }

    /// Subscribe to per-block level readings.
    pub fn subscribe_levels(&self) -> broadcast::Receiver<LevelEvent> {
        self.level_tx.subscribe()
    }

    /// Subscribe to status change events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<MonitorStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Snapshot of session counters for observability.
    pub fn diagnostics_snapshot(&self) -> session::DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    fn set_status(&self, new_status: MonitorStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(MonitorStatusEvent {
            status: new_status,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::null::NullSink;

    #[test]
    fn new_engine_is_idle() {
        let engine = CleaveEngine::new(MonitorConfig::default(), SinkHandle::new(NullSink::new()));
        assert_eq!(engine.status(), MonitorStatus::Idle);
        assert_eq!(engine.diagnostics_snapshot().blocks_in, 0);
    }

    #[test]
    fn stop_before_start_is_an_error() {
        let engine = CleaveEngine::new(MonitorConfig::default(), SinkHandle::new(NullSink::new()));
        assert!(matches!(engine.stop(), Err(CleaveError::NotRunning)));
        assert_eq!(engine.status(), MonitorStatus::Idle);
    }
}
