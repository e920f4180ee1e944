use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pace::{PaceStatus, SpeedColor};
use crate::source::SourceKind;

/// Every state change in a session produces an Event.
/// The presentation layer renders them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TrackingStarted {
        source: SourceKind,
        target_kmh: f64,
        at: DateTime<Utc>,
    },
    TrackingStopped {
        alerts_fired: u64,
        at: DateTime<Utc>,
    },
    SampleProcessed {
        speed_kmh: f64,
        accuracy_m: f64,
        timestamp_ms: u64,
        status: PaceStatus,
        color: SpeedColor,
        at: DateTime<Utc>,
    },
    AlertFired {
        speed_kmh: f64,
        target_kmh: f64,
        at_ms: u64,
        /// False when the sink failed; the alert still counts.
        delivered: bool,
        at: DateTime<Utc>,
    },
    TargetChanged {
        target_kmh: f64,
        at: DateTime<Utc>,
    },
    /// Transient source error, or a failure that kept tracking from starting.
    SourceError {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        tracking: bool,
        speed_kmh: f64,
        accuracy_m: f64,
        target_kmh: f64,
        status: PaceStatus,
        color: SpeedColor,
        error: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_alert(&self) -> bool {
        matches!(self, Event::AlertFired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::TargetChanged {
            target_kmh: 12.0,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TargetChanged");
        assert_eq!(json["target_kmh"], 12.0);
    }

    #[test]
    fn snapshot_roundtrips_status() {
        let event = Event::StateSnapshot {
            tracking: true,
            speed_kmh: 8.0,
            accuracy_m: 5.0,
            target_kmh: 10.0,
            status: PaceStatus::BelowTarget,
            color: SpeedColor::Red,
            error: None,
            at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"status\":\"below_target\""));
        assert!(json.contains("\"color\":\"red\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Event::StateSnapshot { tracking: true, .. }));
    }
}
