//! Unit normalization for raw location fixes.
//!
//! Location providers report speed in meters per second and may omit it
//! entirely. Everything past this module works in km/h and never sees a
//! negative or missing value.

use serde::{Deserialize, Serialize};

/// Conversion factor from m/s to km/h.
pub const MPS_TO_KMH: f64 = 3.6;

/// A raw position fix as delivered by a sample source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    /// Ground speed in m/s, if the provider reported one.
    #[serde(default)]
    pub speed_mps: Option<f64>,
    /// Horizontal accuracy radius in meters.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl RawFix {
    pub fn new(speed_mps: Option<f64>, accuracy_m: Option<f64>, timestamp_ms: u64) -> Self {
        Self {
            speed_mps,
            accuracy_m,
            timestamp_ms,
        }
    }
}

/// A normalized speed reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    pub speed_kmh: f64,
    pub accuracy_m: f64,
    pub timestamp_ms: u64,
}

impl SpeedSample {
    pub fn from_fix(fix: &RawFix) -> Self {
        Self {
            speed_kmh: normalize_speed(fix.speed_mps),
            accuracy_m: normalize_accuracy(fix.accuracy_m),
            timestamp_ms: fix.timestamp_ms,
        }
    }
}

impl From<RawFix> for SpeedSample {
    fn from(fix: RawFix) -> Self {
        Self::from_fix(&fix)
    }
}

/// Convert a raw m/s reading to km/h, clamped at zero.
///
/// Missing and non-finite readings are treated as standing still.
pub fn normalize_speed(raw_mps: Option<f64>) -> f64 {
    match raw_mps {
        Some(mps) if mps.is_finite() => (mps * MPS_TO_KMH).max(0.0),
        _ => 0.0,
    }
}

/// Accuracy radius in meters; 0 when unknown.
pub fn normalize_accuracy(raw_m: Option<f64>) -> f64 {
    match raw_m {
        Some(m) if m.is_finite() => m.max(0.0),
        _ => 0.0,
    }
}
