mod engine;
mod status;
mod target;

pub use engine::{
    alert_due, AlertDecision, AlertGateState, PaceAlertEngine, TrackingPhase, TrackingState,
    DEFAULT_COOLDOWN_MS,
};
pub use status::{PaceStatus, SpeedColor};
pub use target::{
    TargetPolicy, TargetSpeed, DEFAULT_TARGET_KMH, MAX_TARGET_KMH, MIN_TARGET_KMH,
};
