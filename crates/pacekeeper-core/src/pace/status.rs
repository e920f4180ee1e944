//! Status and color derivation for the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pace status shown under the speed readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceStatus {
    NotTracking,
    OnPace,
    BelowTarget,
    StandingStill,
}

impl PaceStatus {
    pub fn derive(is_tracking: bool, speed_kmh: f64, target_kmh: f64) -> Self {
        if !is_tracking {
            PaceStatus::NotTracking
        } else if speed_kmh >= target_kmh {
            PaceStatus::OnPace
        } else if speed_kmh > 0.0 {
            PaceStatus::BelowTarget
        } else {
            PaceStatus::StandingStill
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            PaceStatus::NotTracking => "Not tracking",
            PaceStatus::OnPace => "On pace",
            PaceStatus::BelowTarget => "Below target",
            PaceStatus::StandingStill => "Standing still",
        }
    }
}

impl fmt::Display for PaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Color coding for the speed readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedColor {
    Gray,
    Green,
    Red,
}

impl SpeedColor {
    pub fn derive(is_tracking: bool, speed_kmh: f64, target_kmh: f64) -> Self {
        if !is_tracking {
            SpeedColor::Gray
        } else if speed_kmh >= target_kmh {
            SpeedColor::Green
        } else {
            SpeedColor::Red
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeedColor::Gray => "gray",
            SpeedColor::Green => "green",
            SpeedColor::Red => "red",
        }
    }

    /// ANSI SGR color code for terminal output.
    pub fn ansi_code(self) -> u8 {
        match self {
            SpeedColor::Gray => 90,
            SpeedColor::Green => 32,
            SpeedColor::Red => 31,
        }
    }
}
