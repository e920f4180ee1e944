//! Integration tests for the pace-alert pipeline.
//!
//! Drives full sessions from a replay file through the normalizer, engine and
//! sink, with a hand-driven clock.

use std::io::Write;

use pacekeeper_core::source::ReplaySource;
use pacekeeper_core::{
    Config, Event, ManualClock, PaceAlertEngine, PaceSession, RawFix, RecordingSink, SourceError,
    SourceEvent, SpeedSource, TargetSpeed,
};
use tempfile::NamedTempFile;

fn session(sink: &RecordingSink, clock: &ManualClock) -> PaceSession {
    PaceSession::new(
        PaceAlertEngine::new(TargetSpeed::new(10.0).unwrap()),
        Box::new(clock.clone()),
        Box::new(sink.clone()),
    )
}

fn fix_kmh(kmh: f64, timestamp_ms: u64) -> SourceEvent {
    SourceEvent::Fix(RawFix::new(Some(kmh / 3.6), Some(5.0), timestamp_ms))
}

fn replay_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[test]
fn scenario_below_target_alerts() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new(0);
    let mut session = session(&sink, &clock);
    let file = replay_file(&[r#"{"speed_mps": 2.2222222222, "timestamp_ms": 0}"#]);
    let mut source = ReplaySource::new(file.path());

    session.start(&mut source).unwrap();
    session.drain(&mut source, None);

    assert_eq!(sink.count(), 1);
    assert_eq!(session.snapshot().status.text(), "Below target");
}

#[test]
fn scenario_on_pace_does_not_alert() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new(0);
    let mut session = session(&sink, &clock);
    let file = replay_file(&[r#"{"speed_mps": 3.3333333334, "timestamp_ms": 0}"#]);
    let mut source = ReplaySource::new(file.path());

    session.start(&mut source).unwrap();
    session.drain(&mut source, None);

    assert_eq!(sink.count(), 0);
    assert_eq!(session.snapshot().status.text(), "On pace");
}

#[test]
fn scenario_standing_still_does_not_alert() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new(0);
    let mut session = session(&sink, &clock);
    let file = replay_file(&[r#"{"speed_mps": 0.0, "timestamp_ms": 0}"#]);
    let mut source = ReplaySource::new(file.path());

    session.start(&mut source).unwrap();
    session.drain(&mut source, None);

    assert_eq!(sink.count(), 0);
    assert_eq!(session.snapshot().status.text(), "Standing still");
}

#[test]
fn scenario_cooldown_spacing() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new(0);
    let mut session = session(&sink, &clock);
    let file = replay_file(&[]);
    let mut source = ReplaySource::new(file.path());
    session.start(&mut source).unwrap();

    session.handle(fix_kmh(8.0, 0));
    assert_eq!(sink.count(), 1);

    clock.set(1_000);
    session.handle(fix_kmh(8.0, 1_000));
    assert_eq!(sink.count(), 1);

    clock.set(3_100);
    session.handle(fix_kmh(8.0, 3_100));
    assert_eq!(sink.count(), 2);
}

#[test]
fn scenario_stop_then_sample() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new(0);
    let mut session = session(&sink, &clock);
    let file = replay_file(&[r#"{"speed_mps": 2.0, "timestamp_ms": 0}"#]);
    let mut source = ReplaySource::new(file.path());

    session.start(&mut source).unwrap();
    session.stop(&mut source);
    clock.set(60_000);
    assert!(session.handle(fix_kmh(8.0, 60_000)).is_empty());

    assert_eq!(sink.count(), 0);
    assert_eq!(session.snapshot().status.text(), "Not tracking");
}

#[test]
fn cooldown_window_edges() {
    for (gap, expected) in [(2_999u64, 1usize), (3_001, 2)] {
        let sink = RecordingSink::new();
        let clock = ManualClock::new(5_000);
        let mut session = session(&sink, &clock);
        let file = replay_file(&[]);
        let mut source = ReplaySource::new(file.path());
        session.start(&mut source).unwrap();

        session.handle(fix_kmh(7.0, 0));
        clock.advance(gap);
        session.handle(fix_kmh(7.0, gap));
        assert_eq!(sink.count(), expected, "gap {gap}");
    }
}

#[test]
fn timeout_error_does_not_stop_tracking() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new(0);
    let mut session = session(&sink, &clock);
    let file = replay_file(&[
        r#"{"speed_mps": 3.0, "timestamp_ms": 0}"#,
        r#"{"speed_mps": 3.0, "timestamp_ms": 20000}"#,
    ]);
    let mut source = ReplaySource::new(file.path()).with_timeout_ms(10_000);
    session.start(&mut source).unwrap();

    let events = session.drain(&mut source, None);
    let errors: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::SourceError { .. }))
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(session.is_tracking());
    assert_eq!(session.last_error(), None);
}

#[test]
fn missing_replay_file_blocks_start() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new(0);
    let mut session = session(&sink, &clock);
    let mut source = ReplaySource::new("/nonexistent/run.jsonl");

    let err = session.start(&mut source).unwrap_err();
    assert!(matches!(err, SourceError::SourceUnavailable(_)));
    assert!(!session.is_tracking());
    assert!(session.last_error().is_some());
}

#[test]
fn simulated_run_alerts_during_fade() {
    let mut config = Config::default();
    config.source.seed = 7;
    let sink = RecordingSink::new();
    let clock = ManualClock::new(0);
    let mut session = PaceSession::new(
        config.engine().unwrap(),
        Box::new(clock.clone()),
        Box::new(sink.clone()),
    );
    let mut source = pacekeeper_core::open_source(
        pacekeeper_core::SourceKind::Simulated,
        &config.source,
    )
    .unwrap();

    session.start(source.as_mut()).unwrap();
    session.pump(source.as_mut(), None, |_| clock.advance(1_000));

    // Fade reaches 7.2 km/h against a 10 km/h target.
    assert!(sink.count() > 0);
    assert_eq!(session.snapshot().status.text(), "Standing still");
    assert!(source.next_event().is_none());
}
