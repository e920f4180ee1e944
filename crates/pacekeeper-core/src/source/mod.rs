//! Speed sample sources.
//!
//! A source is a lazy, non-restartable stream of position fixes. The session
//! pulls from it one event at a time and never learns which implementation is
//! behind the trait; the implementation is picked once, at startup, by
//! [`open_source`].

mod replay;
mod simulated;

pub use replay::ReplaySource;
pub use simulated::{RunProfile, SimulatedSource};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SourceError;
use crate::speed::RawFix;
use crate::storage::SourceConfig;

/// Error message reported when fixes stop arriving in time.
pub const POSITION_TIMEOUT: &str = "Position timeout";

/// One item delivered by a source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Fix(RawFix),
    /// Failure in place of a fix. A `Sample` error leaves the stream
    /// running; the other kinds mean the capability is gone.
    Error(SourceError),
}

impl SourceEvent {
    /// Transient sample error.
    pub fn error(message: impl Into<String>) -> Self {
        SourceEvent::Error(SourceError::Sample(message.into()))
    }
}

/// Which implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Recorded fixes read from a JSON-lines file.
    #[default]
    Replay,
    /// Deterministic synthetic run.
    Simulated,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Replay => f.write_str("replay"),
            SourceKind::Simulated => f.write_str("simulated"),
        }
    }
}

/// Every location provider implements this trait.
pub trait SpeedSource: Send {
    fn kind(&self) -> SourceKind;

    /// Acquire the underlying capability.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` or `SourceUnavailable`; tracking must not start.
    fn open(&mut self) -> Result<(), SourceError>;

    /// Next fix or error. `None` once the stream has ended.
    fn next_event(&mut self) -> Option<SourceEvent>;

    /// Release the capability. Later calls to `next_event` return `None`.
    fn close(&mut self);
}

/// Build the source selected by `kind`.
///
/// # Errors
///
/// Returns `SourceUnavailable` when a replay source has no file configured.
pub fn open_source(
    kind: SourceKind,
    config: &SourceConfig,
) -> Result<Box<dyn SpeedSource>, SourceError> {
    match kind {
        SourceKind::Replay => {
            let path = config.replay_path.clone().ok_or_else(|| {
                SourceError::SourceUnavailable("no replay file configured".into())
            })?;
            Ok(Box::new(ReplaySource::new(path).with_timeout_ms(config.timeout_ms)))
        }
        SourceKind::Simulated => Ok(Box::new(
            SimulatedSource::new(config.seed).with_interval_ms(config.interval_ms),
        )),
    }
}
