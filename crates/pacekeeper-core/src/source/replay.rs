//! Replay recorded fixes from a JSON-lines file.
//!
//! Each non-blank line is either a fix or an error report:
//!
//! ```text
//! {"speed_mps": 2.4, "accuracy_m": 6.0, "timestamp_ms": 0}
//! {"speed_mps": null, "timestamp_ms": 1000}
//! {"error": "GPS signal lost"}
//! ```
//!
//! Lines starting with `#` are comments.

use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{SourceEvent, SourceKind, SpeedSource, POSITION_TIMEOUT};
use crate::error::SourceError;
use crate::speed::RawFix;

/// Fixes further apart than this produce a timeout error.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Error { error: String },
    Fix(RawFix),
}

pub struct ReplaySource {
    path: PathBuf,
    timeout_ms: u64,
    reader: Option<BufReader<File>>,
    line_no: usize,
    last_timestamp_ms: Option<u64>,
    /// Fix held back while its timeout error is delivered.
    pending: Option<RawFix>,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reader: None,
            line_no: 0,
            last_timestamp_ms: None,
            pending: None,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn emit_fix(&mut self, fix: RawFix) -> SourceEvent {
        if let Some(last) = self.last_timestamp_ms {
            if fix.timestamp_ms.saturating_sub(last) > self.timeout_ms {
                self.pending = Some(fix);
                self.last_timestamp_ms = Some(fix.timestamp_ms);
                return SourceEvent::error(POSITION_TIMEOUT);
            }
        }
        self.last_timestamp_ms = Some(fix.timestamp_ms);
        SourceEvent::Fix(fix)
    }
}

impl SpeedSource for ReplaySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Replay
    }

    fn open(&mut self) -> Result<(), SourceError> {
        let file = File::open(&self.path).map_err(|e| open_error(&self.path, e))?;
        self.reader = Some(BufReader::new(file));
        self.line_no = 0;
        self.last_timestamp_ms = None;
        self.pending = None;
        tracing::debug!(path = %self.path.display(), "replay source opened");
        Ok(())
    }

    fn next_event(&mut self) -> Option<SourceEvent> {
        if let Some(fix) = self.pending.take() {
            return Some(SourceEvent::Fix(fix));
        }

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let reader = self.reader.as_mut()?;
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    self.reader = None;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "replay read failed");
                    self.reader = None;
                    return Some(SourceEvent::Error(SourceError::SourceUnavailable(format!(
                        "{}: {e}",
                        self.path.display()
                    ))));
                }
            }
            self.line_no += 1;

            let line = buf.trim_ascii();
            if line.is_empty() || line.starts_with(b"#") {
                continue;
            }

            return Some(match serde_json::from_slice::<ReplayLine>(line) {
                Ok(ReplayLine::Fix(fix)) => self.emit_fix(fix),
                Ok(ReplayLine::Error { error }) => SourceEvent::error(error),
                Err(e) => {
                    tracing::warn!(line = self.line_no, error = %e, "malformed fix");
                    SourceEvent::error(format!("Malformed fix on line {}", self.line_no))
                }
            });
        }
    }

    fn close(&mut self) {
        self.reader = None;
        self.pending = None;
    }
}

fn open_error(path: &Path, err: io::Error) -> SourceError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => SourceError::PermissionDenied,
        io::ErrorKind::NotFound => {
            SourceError::SourceUnavailable(format!("{} not found", path.display()))
        }
        _ => SourceError::SourceUnavailable(format!("{}: {err}", path.display())),
    }
}
