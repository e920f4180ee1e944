//! Pace-alert engine implementation.
//!
//! The engine is a two-state machine that folds normalized speed samples into
//! alert decisions. It does not read a clock - the caller passes `now` with
//! every sample.
//!
//! ## State Transitions
//!
//! ```text
//! Idle <-> Tracking
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PaceAlertEngine::new(TargetSpeed::default());
//! engine.start_tracking();
//! // For each fix:
//! if engine.on_sample(&sample, clock.now_ms()).is_alert() {
//!     sink.fire(&alert)?;
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::status::{PaceStatus, SpeedColor};
use super::target::{TargetPolicy, TargetSpeed};
use crate::error::ValidationError;
use crate::speed::SpeedSample;

/// Minimum spacing between two alerts unless configured otherwise.
pub const DEFAULT_COOLDOWN_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingPhase {
    #[default]
    Idle,
    Tracking,
}

/// Outcome of feeding one sample to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDecision {
    Alert,
    NoAlert,
}

impl AlertDecision {
    pub fn is_alert(self) -> bool {
        self == AlertDecision::Alert
    }
}

/// Live readings for the current tracking session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TrackingState {
    pub phase: TrackingPhase,
    pub current_speed_kmh: f64,
    pub current_accuracy_m: f64,
}

/// Alert gating: target plus the time of the last alert (`None` = never).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AlertGateState {
    pub target: TargetSpeed,
    pub last_alert_ms: Option<u64>,
}

/// The decision rule.
///
/// Fires when the runner is moving, slower than `target_kmh`, and the
/// cooldown has strictly elapsed since the last alert. A `now_ms` earlier
/// than `last_alert_ms` counts as no time elapsed.
pub fn alert_due(
    speed_kmh: f64,
    target_kmh: f64,
    last_alert_ms: Option<u64>,
    now_ms: u64,
    cooldown_ms: u64,
) -> bool {
    let moving_below_target = speed_kmh > 0.0 && speed_kmh < target_kmh;
    let cooled_down = match last_alert_ms {
        None => true,
        Some(last) => now_ms.saturating_sub(last) > cooldown_ms,
    };
    moving_below_target && cooled_down
}

/// Core pace-alert engine.
///
/// Owns the tracking and alert-gate state for one user session; one engine
/// per runner. Not synchronized - see `SharedSession` for threaded hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaceAlertEngine {
    tracking: TrackingState,
    gate: AlertGateState,
    cooldown_ms: u64,
    #[serde(default)]
    policy: TargetPolicy,
    /// Forget the last alert when tracking (re)starts.
    #[serde(default)]
    reset_cooldown_on_start: bool,
}

impl PaceAlertEngine {
    /// Create an idle engine with the default cooldown.
    pub fn new(target: TargetSpeed) -> Self {
        Self {
            tracking: TrackingState::default(),
            gate: AlertGateState {
                target,
                last_alert_ms: None,
            },
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            policy: TargetPolicy::default(),
            reset_cooldown_on_start: false,
        }
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn with_policy(mut self, policy: TargetPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_reset_cooldown_on_start(mut self, reset: bool) -> Self {
        self.reset_cooldown_on_start = reset;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TrackingPhase {
        self.tracking.phase
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.phase == TrackingPhase::Tracking
    }

    pub fn current_speed_kmh(&self) -> f64 {
        self.tracking.current_speed_kmh
    }

    pub fn current_accuracy_m(&self) -> f64 {
        self.tracking.current_accuracy_m
    }

    pub fn target(&self) -> TargetSpeed {
        self.gate.target
    }

    pub fn policy(&self) -> TargetPolicy {
        self.policy
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    pub fn last_alert_ms(&self) -> Option<u64> {
        self.gate.last_alert_ms
    }

    pub fn tracking_state(&self) -> &TrackingState {
        &self.tracking
    }

    pub fn gate_state(&self) -> &AlertGateState {
        &self.gate
    }

    pub fn status(&self) -> PaceStatus {
        PaceStatus::derive(
            self.is_tracking(),
            self.tracking.current_speed_kmh,
            self.gate.target.kmh(),
        )
    }

    pub fn color(&self) -> SpeedColor {
        SpeedColor::derive(
            self.is_tracking(),
            self.tracking.current_speed_kmh,
            self.gate.target.kmh(),
        )
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Enter `Tracking`. Returns false if already tracking.
    pub fn start_tracking(&mut self) -> bool {
        if self.is_tracking() {
            return false;
        }
        self.tracking = TrackingState {
            phase: TrackingPhase::Tracking,
            current_speed_kmh: 0.0,
            current_accuracy_m: 0.0,
        };
        if self.reset_cooldown_on_start {
            self.gate.last_alert_ms = None;
        }
        true
    }

    /// Return to `Idle`. Returns false if already idle.
    pub fn stop_tracking(&mut self) -> bool {
        if !self.is_tracking() {
            return false;
        }
        self.tracking.phase = TrackingPhase::Idle;
        true
    }

    /// Change the target speed, honouring the engine's `TargetPolicy`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTarget` if the value is rejected; the previous target
    /// stays in effect.
    pub fn set_target(&mut self, kmh: f64) -> Result<TargetSpeed, ValidationError> {
        let target = TargetSpeed::with_policy(kmh, self.policy)?;
        self.gate.target = target;
        Ok(target)
    }

    /// Fold one sample into the engine and decide whether to alert.
    ///
    /// Samples arriving while idle are dropped.
    pub fn on_sample(&mut self, sample: &SpeedSample, now_ms: u64) -> AlertDecision {
        if !self.is_tracking() {
            return AlertDecision::NoAlert;
        }
        self.tracking.current_speed_kmh = sample.speed_kmh.max(0.0);
        self.tracking.current_accuracy_m = sample.accuracy_m.max(0.0);

        if alert_due(
            self.tracking.current_speed_kmh,
            self.gate.target.kmh(),
            self.gate.last_alert_ms,
            now_ms,
            self.cooldown_ms,
        ) {
            self.gate.last_alert_ms = Some(now_ms);
            AlertDecision::Alert
        } else {
            AlertDecision::NoAlert
        }
    }
}

impl Default for PaceAlertEngine {
    fn default() -> Self {
        Self::new(TargetSpeed::default())
    }
}
