//! # Pacekeeper Core Library
//!
//! This library provides the core logic of Pacekeeper, a running pace monitor
//! that shows live speed from location fixes and alerts the runner when their
//! pace drops below a target. The CLI is a thin shell over the same library.
//!
//! ## Architecture
//!
//! - **Unit Normalizer**: turns raw m/s readings (possibly missing) into km/h
//! - **Pace-Alert Engine**: an Idle/Tracking state machine deciding, per sample,
//!   whether to alert; the caller supplies `now`, so cooldowns are testable
//! - **Sources**: one trait for location providers, with replay and simulated
//!   implementations chosen at startup
//! - **Sinks**: haptic/audible alert outputs whose failures never stop tracking
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`PaceAlertEngine`]: Core decision state machine
//! - [`PaceSession`]: Wires source, engine, clock and sink together
//! - [`Config`]: Application configuration management
//! - [`SpeedSource`] / [`AlertSink`]: Boundary traits for external collaborators

pub mod clock;
pub mod error;
pub mod events;
pub mod pace;
pub mod session;
pub mod sink;
pub mod source;
pub mod speed;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, SinkError, SourceError, ValidationError};
pub use events::Event;
pub use pace::{
    AlertDecision, PaceAlertEngine, PaceStatus, SpeedColor, TargetPolicy, TargetSpeed,
    TrackingPhase,
};
pub use session::{PaceSession, SharedSession, Snapshot};
pub use sink::{AlertEvent, AlertSink, Beep, NullSink, RecordingSink, TerminalSink};
pub use source::{open_source, SourceEvent, SourceKind, SpeedSource};
pub use speed::{normalize_speed, RawFix, SpeedSample};
pub use storage::Config;
