//! Alert delivery.
//!
//! A sink turns an [`AlertEvent`] into haptic and audible feedback. Sinks may
//! fail (no audio device, closed terminal); the session logs and swallows
//! those failures so they never reach the engine.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::error::SinkError;

/// Payload handed to a sink when the engine decides to alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub speed_kmh: f64,
    pub target_kmh: f64,
    pub at_ms: u64,
}

/// Short sine "beep" with an exponentially fading amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beep {
    pub frequency_hz: f64,
    pub duration_ms: u64,
    pub start_gain: f64,
    pub end_gain: f64,
}

impl Default for Beep {
    fn default() -> Self {
        Self {
            frequency_hz: 800.0,
            duration_ms: 500,
            start_gain: 0.3,
            end_gain: 0.01,
        }
    }
}

impl Beep {
    /// Envelope gain `t_ms` milliseconds into the tone; 0 after it ends.
    pub fn gain_at(&self, t_ms: f64) -> f64 {
        let duration = self.duration_ms as f64;
        if t_ms < 0.0 || t_ms > duration || duration == 0.0 {
            return 0.0;
        }
        let ratio = self.end_gain / self.start_gain;
        self.start_gain * ratio.powf(t_ms / duration)
    }

    /// Render mono PCM samples in `[-1, 1]`.
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let count = (u64::from(sample_rate) * self.duration_ms / 1000) as usize;
        (0..count)
            .map(|i| {
                let t = i as f64 / f64::from(sample_rate);
                let phase = 2.0 * std::f64::consts::PI * self.frequency_hz * t;
                (phase.sin() * self.gain_at(t * 1000.0)) as f32
            })
            .collect()
    }
}

/// Every alert output implements this trait.
pub trait AlertSink: Send {
    /// Deliver one alert.
    ///
    /// # Errors
    ///
    /// Returns a `SinkError` if any part of the feedback could not be produced.
    fn fire(&mut self, alert: &AlertEvent) -> Result<(), SinkError>;
}

/// Rings the terminal bell and prints a line describing the alert.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    audio: bool,
    vibration: bool,
    beep: Beep,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            audio: true,
            vibration: true,
            beep: Beep::default(),
        }
    }

    pub fn with_audio(mut self, audio: bool) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_vibration(mut self, vibration: bool) -> Self {
        self.vibration = vibration;
        self
    }

    pub fn with_beep(mut self, beep: Beep) -> Self {
        self.beep = beep;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> AlertSink for TerminalSink<W> {
    fn fire(&mut self, alert: &AlertEvent) -> Result<(), SinkError> {
        if self.vibration {
            writeln!(self.out, "~~ bzzt ~~")?;
        }
        if self.audio {
            write!(
                self.out,
                "\x07beep {:.0} Hz / {} ms: ",
                self.beep.frequency_hz, self.beep.duration_ms
            )?;
        }
        writeln!(
            self.out,
            "below target: {:.1} km/h < {:.1} km/h",
            alert.speed_kmh, alert.target_kmh
        )?;
        self.out.flush()?;
        Ok(())
    }
}

/// Discards alerts; used when alerts are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AlertSink for NullSink {
    fn fire(&mut self, _alert: &AlertEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Collects alerts in memory. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    fired: Arc<Mutex<Vec<AlertEvent>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails after being recorded.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn fired(&self) -> Vec<AlertEvent> {
        self.fired
            .lock()
            .map(|log| log.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn count(&self) -> usize {
        self.fired().len()
    }
}

impl AlertSink for RecordingSink {
    fn fire(&mut self, alert: &AlertEvent) -> Result<(), SinkError> {
        match self.fired.lock() {
            Ok(mut log) => log.push(*alert),
            Err(poisoned) => poisoned.into_inner().push(*alert),
        }
        if self.fail {
            return Err(SinkError::Unavailable("audio output missing".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> AlertEvent {
        AlertEvent {
            speed_kmh: 8.04,
            target_kmh: 10.0,
            at_ms: 0,
        }
    }

    #[test]
    fn beep_envelope_fades() {
        let beep = Beep::default();
        assert!((beep.gain_at(0.0) - 0.3).abs() < 1e-12);
        assert!((beep.gain_at(500.0) - 0.01).abs() < 1e-12);
        assert!(beep.gain_at(250.0) < beep.gain_at(100.0));
        assert_eq!(beep.gain_at(501.0), 0.0);
    }

    #[test]
    fn beep_renders_half_second() {
        let pcm = Beep::default().render(8_000);
        assert_eq!(pcm.len(), 4_000);
        assert!(pcm.iter().all(|s| s.abs() <= 0.3 + f32::EPSILON));
    }

    #[test]
    fn terminal_sink_writes_bell_and_message() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.fire(&alert()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains('\x07'));
        assert!(text.contains("~~ bzzt ~~"));
        assert!(text.contains("8.0 km/h < 10.0 km/h"));
    }

    #[test]
    fn terminal_sink_respects_toggles() {
        let mut sink = TerminalSink::new(Vec::new())
            .with_audio(false)
            .with_vibration(false);
        sink.fire(&alert()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(!text.contains('\x07'));
        assert!(!text.contains("bzzt"));
    }

    #[test]
    fn recording_sink_shares_log() {
        let sink = RecordingSink::new();
        let mut handle = sink.clone();
        handle.fire(&alert()).unwrap();
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn failing_sink_reports_error() {
        let mut sink = RecordingSink::failing();
        assert!(sink.fire(&alert()).is_err());
        assert_eq!(sink.count(), 1);
    }
}
