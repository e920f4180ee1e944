//! Tracking session: source -> normalizer -> engine -> sink.
//!
//! The session is the only place that reads the clock and the only place that
//! talks to the sink. It keeps the last source error for display and clears it
//! on the next good fix.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use crate::clock::Clock;
use crate::error::{SourceError, ValidationError};
use crate::events::Event;
use crate::pace::{PaceAlertEngine, PaceStatus, SpeedColor};
use crate::sink::{AlertEvent, AlertSink};
use crate::source::{SourceEvent, SpeedSource};
use crate::speed::SpeedSample;

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tracking: bool,
    pub speed_kmh: f64,
    pub accuracy_m: f64,
    pub target_kmh: f64,
    pub status: PaceStatus,
    pub color: SpeedColor,
    pub error: Option<String>,
}

impl Snapshot {
    /// Speed with one decimal, e.g. `"8.0"`.
    pub fn speed_display(&self) -> String {
        format!("{:.1}", self.speed_kmh)
    }

    /// Accuracy as `"±5m"`; `None` while unknown.
    pub fn accuracy_display(&self) -> Option<String> {
        (self.accuracy_m > 0.0).then(|| format!("±{:.0}m", self.accuracy_m))
    }

    pub fn to_event(&self) -> Event {
        Event::StateSnapshot {
            tracking: self.tracking,
            speed_kmh: self.speed_kmh,
            accuracy_m: self.accuracy_m,
            target_kmh: self.target_kmh,
            status: self.status,
            color: self.color,
            error: self.error.clone(),
            at: Utc::now(),
        }
    }
}

pub struct PaceSession {
    engine: PaceAlertEngine,
    clock: Box<dyn Clock>,
    sink: Box<dyn AlertSink>,
    last_error: Option<String>,
    alerts_fired: u64,
}

impl PaceSession {
    pub fn new(engine: PaceAlertEngine, clock: Box<dyn Clock>, sink: Box<dyn AlertSink>) -> Self {
        Self {
            engine,
            clock,
            sink,
            last_error: None,
            alerts_fired: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &PaceAlertEngine {
        &self.engine
    }

    pub fn is_tracking(&self) -> bool {
        self.engine.is_tracking()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn alerts_fired(&self) -> u64 {
        self.alerts_fired
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tracking: self.engine.is_tracking(),
            speed_kmh: self.engine.current_speed_kmh(),
            accuracy_m: self.engine.current_accuracy_m(),
            target_kmh: self.engine.target().kmh(),
            status: self.engine.status(),
            color: self.engine.color(),
            error: self.last_error.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open `source` and begin tracking. While already tracking the source
    /// is left alone and the current state is returned as a snapshot event.
    ///
    /// # Errors
    ///
    /// Returns the source's error if it cannot be opened; the session stays
    /// idle and the message is kept for display.
    pub fn start(&mut self, source: &mut dyn SpeedSource) -> Result<Event, SourceError> {
        if self.engine.is_tracking() {
            tracing::debug!("start ignored: already tracking");
            return Ok(self.snapshot().to_event());
        }
        if let Err(err) = source.open() {
            tracing::warn!(source = %source.kind(), error = %err, "tracking not started");
            self.last_error = Some(err.to_string());
            return Err(err);
        }
        self.engine.start_tracking();
        self.last_error = None;
        tracing::info!(
            source = %source.kind(),
            target_kmh = self.engine.target().kmh(),
            "tracking started"
        );
        Ok(Event::TrackingStarted {
            source: source.kind(),
            target_kmh: self.engine.target().kmh(),
            at: Utc::now(),
        })
    }

    /// Stop tracking and release the source. Safe to call repeatedly.
    pub fn stop(&mut self, source: &mut dyn SpeedSource) -> Event {
        source.close();
        if self.engine.stop_tracking() {
            tracing::info!(alerts = self.alerts_fired, "tracking stopped");
        }
        Event::TrackingStopped {
            alerts_fired: self.alerts_fired,
            at: Utc::now(),
        }
    }

    /// Change the target speed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTarget` when the engine's policy rejects the value.
    pub fn set_target(&mut self, kmh: f64) -> Result<Event, ValidationError> {
        let target = self.engine.set_target(kmh)?;
        tracing::info!(target_kmh = target.kmh(), "target changed");
        Ok(Event::TargetChanged {
            target_kmh: target.kmh(),
            at: Utc::now(),
        })
    }

    /// Process one source event. Events arriving while idle are dropped.
    pub fn handle(&mut self, event: SourceEvent) -> Vec<Event> {
        if !self.engine.is_tracking() {
            tracing::trace!("dropping source event while idle");
            return Vec::new();
        }

        match event {
            SourceEvent::Fix(fix) => {
                let sample = SpeedSample::from_fix(&fix);
                let now_ms = self.clock.now_ms();
                let decision = self.engine.on_sample(&sample, now_ms);
                self.last_error = None;
                tracing::debug!(
                    speed_kmh = sample.speed_kmh,
                    accuracy_m = sample.accuracy_m,
                    ?decision,
                    "sample"
                );

                let mut events = vec![Event::SampleProcessed {
                    speed_kmh: sample.speed_kmh,
                    accuracy_m: sample.accuracy_m,
                    timestamp_ms: sample.timestamp_ms,
                    status: self.engine.status(),
                    color: self.engine.color(),
                    at: Utc::now(),
                }];
                if decision.is_alert() {
                    events.push(self.fire(sample.speed_kmh, now_ms));
                }
                events
            }
            SourceEvent::Error(err) => {
                let message = err.to_string();
                self.last_error = Some(message.clone());
                let mut events = vec![Event::SourceError {
                    message,
                    at: Utc::now(),
                }];
                if err.is_fatal_to_start() {
                    tracing::warn!(error = %err, "source lost, tracking stopped");
                    self.engine.stop_tracking();
                    events.push(Event::TrackingStopped {
                        alerts_fired: self.alerts_fired,
                        at: Utc::now(),
                    });
                } else {
                    tracing::warn!(error = %err, "sample error");
                }
                events
            }
        }
    }

    /// Pull events from `source` until it ends, tracking stops, or `limit`
    /// source events have been consumed. Returns the number consumed.
    pub fn pump<F>(
        &mut self,
        source: &mut dyn SpeedSource,
        limit: Option<usize>,
        mut on_event: F,
    ) -> usize
    where
        F: FnMut(&Event),
    {
        let mut consumed = 0;
        while self.engine.is_tracking() && limit.map_or(true, |max| consumed < max) {
            let Some(event) = source.next_event() else {
                break;
            };
            consumed += 1;
            for out in self.handle(event) {
                on_event(&out);
            }
        }
        consumed
    }

    /// [`pump`](Self::pump) collecting every produced event.
    pub fn drain(&mut self, source: &mut dyn SpeedSource, limit: Option<usize>) -> Vec<Event> {
        let mut events = Vec::new();
        self.pump(source, limit, |e| events.push(e.clone()));
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn fire(&mut self, speed_kmh: f64, now_ms: u64) -> Event {
        let alert = AlertEvent {
            speed_kmh,
            target_kmh: self.engine.target().kmh(),
            at_ms: now_ms,
        };
        self.alerts_fired += 1;
        let delivered = match self.sink.fire(&alert) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "alert delivery failed");
                false
            }
        };
        tracing::info!(speed_kmh, target_kmh = alert.target_kmh, delivered, "pace alert");
        Event::AlertFired {
            speed_kmh,
            target_kmh: alert.target_kmh,
            at_ms: now_ms,
            delivered,
            at: Utc::now(),
        }
    }
}

/// A session behind a single mutex, for hosts that deliver samples and user
/// commands from different threads.
pub struct SharedSession(Mutex<PaceSession>);

impl SharedSession {
    pub fn new(session: PaceSession) -> Self {
        Self(Mutex::new(session))
    }

    /// Lock the session. A poisoned lock is recovered; the state it guards
    /// is updated field by field and stays consistent.
    pub fn lock(&self) -> MutexGuard<'_, PaceSession> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn handle(&self, event: SourceEvent) -> Vec<Event> {
        self.lock().handle(event)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn into_inner(self) -> PaceSession {
        self.0.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
