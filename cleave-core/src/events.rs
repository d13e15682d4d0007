//! Event types broadcast to engine subscribers.
//!
//! | Event | Meaning |
//! |-------|---------|
//! | `ChunkBoundaryEvent` | everything accumulated since the previous boundary forms one chunk |
//! | `LevelEvent` | per-block loudness reading, for meters and diagnostics |
//! | `MonitorStatusEvent` | engine lifecycle transitions |
//!
//! The engine never hands over sample data in an event — buffering the audio
//! for a chunk is the sink's job, triggered by the boundary.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Emitted when the monitor cuts a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkBoundaryEvent {
    /// Monotonically increasing boundary number within the session.
    pub seq: u64,
    /// Session-relative monotonic reading at the frame that fired the cut.
    pub timestamp: Duration,
}

/// Emitted for each processed sample block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Scaled Euclidean-norm loudness of the block.
    pub level: f32,
    /// Whether the block fell at or below the silence threshold.
    pub is_silent: bool,
}

/// Emitted when the engine state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatusEvent {
    pub status: MonitorStatus,
    /// Optional human-readable detail (e.g. error message).
    pub detail: Option<String>,
}

/// Current state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    /// Engine created but `start()` not yet called.
    Idle,
    /// Actively capturing audio and watching for boundaries.
    Monitoring,
    /// Capture stopped; engine may be restarted.
    Stopped,
    /// Unrecoverable error — restart required.
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_event_round_trips_through_json() {
        let event = ChunkBoundaryEvent {
            seq: 4,
            timestamp: Duration::from_millis(10_250),
        };

        let json = serde_json::to_value(event).expect("serialize boundary event");
        assert_eq!(json["seq"], 4);

        let round_trip: ChunkBoundaryEvent =
            serde_json::from_value(json).expect("deserialize boundary event");
        assert_eq!(round_trip, event);
    }

    #[test]
    fn level_event_serializes_with_camel_case_fields() {
        let event = LevelEvent {
            seq: 9,
            level: 37.5,
            is_silent: false,
        };

        let json = serde_json::to_value(event).expect("serialize level event");
        assert_eq!(json["seq"], 9);
        let level = json["level"].as_f64().expect("level should be a number");
        assert!((level - 37.5).abs() < 1e-5);
        assert_eq!(json["isSilent"], false);
    }

    #[test]
    fn status_event_serializes_with_lowercase_status() {
        let event = MonitorStatusEvent {
            status: MonitorStatus::Monitoring,
            detail: None,
        };

        let json = serde_json::to_value(&event).expect("serialize status event");
        assert_eq!(json["status"], "monitoring");

        let round_trip: MonitorStatusEvent =
            serde_json::from_value(json).expect("deserialize status event");
        assert_eq!(round_trip.status, MonitorStatus::Monitoring);
    }

    #[test]
    fn status_rejects_non_lowercase_values() {
        let err = serde_json::from_str::<MonitorStatus>(r#""Stopped""#);
        assert!(err.is_err(), "expected invalid casing to fail");
    }
}
