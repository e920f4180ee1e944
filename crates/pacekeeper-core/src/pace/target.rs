//! Target speed setting and its bounds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Slowest accepted target, km/h.
pub const MIN_TARGET_KMH: f64 = 1.0;
/// Fastest accepted target, km/h.
pub const MAX_TARGET_KMH: f64 = 50.0;
/// Target used when nothing has been configured.
pub const DEFAULT_TARGET_KMH: f64 = 10.0;

/// What to do with a target outside `[MIN_TARGET_KMH, MAX_TARGET_KMH]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPolicy {
    /// Fail with `InvalidTarget`.
    #[default]
    Reject,
    /// Pull the value to the nearest bound.
    Clamp,
}

/// A target speed in km/h, always within bounds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TargetSpeed(f64);

impl TargetSpeed {
    /// Validate a target speed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTarget` when `kmh` is out of range or not finite.
    pub fn new(kmh: f64) -> Result<Self, ValidationError> {
        if kmh.is_finite() && (MIN_TARGET_KMH..=MAX_TARGET_KMH).contains(&kmh) {
            Ok(Self(kmh))
        } else {
            Err(invalid(kmh))
        }
    }

    /// Clamp into range. Non-finite values are still rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTarget` for NaN or infinite input.
    pub fn clamped(kmh: f64) -> Result<Self, ValidationError> {
        if kmh.is_finite() {
            Ok(Self(kmh.clamp(MIN_TARGET_KMH, MAX_TARGET_KMH)))
        } else {
            Err(invalid(kmh))
        }
    }

    /// Build a target according to `policy`.
    pub fn with_policy(kmh: f64, policy: TargetPolicy) -> Result<Self, ValidationError> {
        match policy {
            TargetPolicy::Reject => Self::new(kmh),
            TargetPolicy::Clamp => Self::clamped(kmh),
        }
    }

    pub fn kmh(self) -> f64 {
        self.0
    }
}

impl Default for TargetSpeed {
    fn default() -> Self {
        Self(DEFAULT_TARGET_KMH)
    }
}

impl TryFrom<f64> for TargetSpeed {
    type Error = ValidationError;

    fn try_from(kmh: f64) -> Result<Self, Self::Error> {
        Self::new(kmh)
    }
}

impl From<TargetSpeed> for f64 {
    fn from(target: TargetSpeed) -> Self {
        target.0
    }
}

impl fmt::Display for TargetSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} km/h", self.0)
    }
}

fn invalid(kmh: f64) -> ValidationError {
    ValidationError::InvalidTarget {
        value: kmh,
        min: MIN_TARGET_KMH,
        max: MAX_TARGET_KMH,
    }
}
