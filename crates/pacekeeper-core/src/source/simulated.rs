//! Deterministic synthetic run.
//!
//! Produces a warm-up, a steady stretch, a fade below typical targets and a
//! stop, with seeded jitter so that the same seed always yields the same run.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use super::{SourceEvent, SourceKind, SpeedSource};
use crate::error::SourceError;
use crate::speed::RawFix;

/// Shape of the synthetic run, counted in fixes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunProfile {
    pub warmup_fixes: u32,
    pub steady_fixes: u32,
    pub fade_fixes: u32,
    pub stopped_fixes: u32,
    /// Cruising speed during the steady stretch, m/s.
    pub steady_mps: f64,
    /// Speed reached at the end of the fade, m/s.
    pub faded_mps: f64,
    /// Uniform jitter amplitude applied to every reading, m/s.
    pub jitter_mps: f64,
    /// Probability that a fix carries no speed.
    pub missing_speed_probability: f64,
    /// Probability that a fix is replaced by a signal-loss error.
    pub signal_loss_probability: f64,
}

impl Default for RunProfile {
    fn default() -> Self {
        Self {
            warmup_fixes: 10,
            steady_fixes: 50,
            fade_fixes: 40,
            stopped_fixes: 10,
            steady_mps: 3.3,
            faded_mps: 2.0,
            jitter_mps: 0.15,
            missing_speed_probability: 0.03,
            signal_loss_probability: 0.02,
        }
    }
}

impl RunProfile {
    pub fn total_fixes(&self) -> u32 {
        self.warmup_fixes + self.steady_fixes + self.fade_fixes + self.stopped_fixes
    }

    /// Noise-free speed at fix `index`, m/s.
    pub fn base_speed_mps(&self, index: u32) -> f64 {
        let steady_start = self.warmup_fixes;
        let fade_start = steady_start + self.steady_fixes;
        let stop_start = fade_start + self.fade_fixes;

        if index < steady_start {
            self.steady_mps * f64::from(index + 1) / f64::from(self.warmup_fixes.max(1))
        } else if index < fade_start {
            self.steady_mps
        } else if index < stop_start {
            let progress = f64::from(index - fade_start + 1) / f64::from(self.fade_fixes.max(1));
            self.steady_mps + (self.faded_mps - self.steady_mps) * progress
        } else {
            0.0
        }
    }
}

pub struct SimulatedSource {
    profile: RunProfile,
    seed: u64,
    interval_ms: u64,
    rng: Pcg64,
    index: u32,
    open: bool,
}

impl SimulatedSource {
    pub fn new(seed: u64) -> Self {
        Self {
            profile: RunProfile::default(),
            seed,
            interval_ms: 1_000,
            rng: Pcg64::seed_from_u64(seed),
            index: 0,
            open: false,
        }
    }

    pub fn with_profile(mut self, profile: RunProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms.max(1);
        self
    }

    pub fn profile(&self) -> &RunProfile {
        &self.profile
    }
}

impl SpeedSource for SimulatedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Simulated
    }

    fn open(&mut self) -> Result<(), SourceError> {
        self.rng = Pcg64::seed_from_u64(self.seed);
        self.index = 0;
        self.open = true;
        tracing::debug!(seed = self.seed, fixes = self.profile.total_fixes(), "simulated source opened");
        Ok(())
    }

    fn next_event(&mut self) -> Option<SourceEvent> {
        if !self.open || self.index >= self.profile.total_fixes() {
            return None;
        }
        let index = self.index;
        self.index += 1;

        if self.rng.gen_bool(self.profile.signal_loss_probability.clamp(0.0, 1.0)) {
            return Some(SourceEvent::error("GPS signal lost"));
        }

        let base = self.profile.base_speed_mps(index);
        let speed_mps = if base == 0.0 {
            Some(0.0)
        } else if self.rng.gen_bool(self.profile.missing_speed_probability.clamp(0.0, 1.0)) {
            None
        } else {
            let jitter = self.profile.jitter_mps.abs();
            let noise = if jitter > 0.0 {
                self.rng.gen_range(-jitter..=jitter)
            } else {
                0.0
            };
            Some(base + noise)
        };
        let accuracy_m = self.rng.gen_range(3.0..12.0);

        Some(SourceEvent::Fix(RawFix::new(
            speed_mps,
            Some(accuracy_m),
            u64::from(index).saturating_mul(self.interval_ms),
        )))
    }

    fn close(&mut self) {
        self.open = false;
    }
}
