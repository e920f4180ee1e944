use clap::Args;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use pacekeeper_core::{
    open_source, AlertSink, Clock, Config, Event, ManualClock, NullSink, PaceSession, PaceStatus,
    SourceError, SourceEvent, SourceKind, SpeedColor, SpeedSource, SystemClock, TerminalSink,
};

#[derive(Args)]
pub struct RunArgs {
    /// Replay fixes from a JSON-lines file
    #[arg(long, conflicts_with = "simulate")]
    file: Option<PathBuf>,
    /// Use the built-in simulated run
    #[arg(long)]
    simulate: bool,
    /// Seed for the simulated run
    #[arg(long)]
    seed: Option<u64>,
    /// Target speed in km/h (overrides config)
    #[arg(long)]
    target: Option<f64>,
    /// Minimum time between alerts in ms (overrides config)
    #[arg(long)]
    cooldown_ms: Option<u64>,
    /// Print events as JSON lines instead of a status display
    #[arg(long)]
    json: bool,
    /// Stop after this many source events
    #[arg(long)]
    limit: Option<usize>,
    /// Replay at recorded speed, timing cooldowns with the wall clock
    #[arg(long)]
    realtime: bool,
}

/// Where `now` comes from during a run.
enum RunClock {
    /// Follows the timestamps of the fixes being replayed.
    Recorded(ManualClock),
    Wall,
}

/// Passes events through from `inner`, moving the run clock along with each
/// fix before the session sees it.
struct Paced {
    inner: Box<dyn SpeedSource>,
    clock: RunClock,
    last_fix_ms: Option<u64>,
}

impl SpeedSource for Paced {
    fn kind(&self) -> SourceKind {
        self.inner.kind()
    }

    fn open(&mut self) -> Result<(), SourceError> {
        self.last_fix_ms = None;
        self.inner.open()
    }

    fn next_event(&mut self) -> Option<SourceEvent> {
        let event = self.inner.next_event()?;
        if let SourceEvent::Fix(fix) = &event {
            match &self.clock {
                RunClock::Recorded(clock) => clock.set(fix.timestamp_ms),
                RunClock::Wall => {
                    if let Some(last) = self.last_fix_ms {
                        let gap = fix.timestamp_ms.saturating_sub(last);
                        std::thread::sleep(Duration::from_millis(gap));
                    }
                }
            }
            self.last_fix_ms = Some(fix.timestamp_ms);
        }
        Some(event)
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(path) = args.file.clone() {
        config.source.kind = SourceKind::Replay;
        config.source.replay_path = Some(path);
    }
    if args.simulate {
        config.source.kind = SourceKind::Simulated;
    }
    if let Some(seed) = args.seed {
        config.source.seed = seed;
    }
    if let Some(cooldown_ms) = args.cooldown_ms {
        config.pace.cooldown_ms = cooldown_ms;
    }

    let mut engine = config.engine()?;
    if let Some(kmh) = args.target {
        engine.set_target(kmh)?;
    }

    let (run_clock, clock): (RunClock, Box<dyn Clock>) = if args.realtime {
        (RunClock::Wall, Box::new(SystemClock::new()))
    } else {
        let manual = ManualClock::new(0);
        (RunClock::Recorded(manual.clone()), Box::new(manual))
    };
    let sink: Box<dyn AlertSink> = if config.alerts.enabled {
        Box::new(
            TerminalSink::stderr()
                .with_audio(config.alerts.audio)
                .with_vibration(config.alerts.vibration),
        )
    } else {
        Box::new(NullSink)
    };

    tracing::debug!(source = %config.source.kind, realtime = args.realtime, "opening source");
    let mut source = Paced {
        inner: open_source(config.source.kind, &config.source)?,
        clock: run_clock,
        last_fix_ms: None,
    };
    let mut session = PaceSession::new(engine, clock, sink);
    let printer = Printer::new(args.json);

    let started = session.start(&mut source)?;
    printer.event(&started)?;

    let mut print_error = None;
    let consumed = session.pump(&mut source, args.limit, |event| {
        if print_error.is_none() {
            print_error = printer.event(event).err();
        }
    });
    if let Some(err) = print_error {
        return Err(err.into());
    }

    if session.is_tracking() {
        if args.json {
            printer.event(&session.snapshot().to_event())?;
        }
        let stopped = session.stop(&mut source);
        printer.event(&stopped)?;
    } else {
        session.stop(&mut source);
    }
    if !args.json {
        println!(
            "{consumed} readings processed, {} alert(s) fired",
            session.alerts_fired()
        );
    }
    Ok(())
}

struct Printer {
    json: bool,
    color: bool,
}

impl Printer {
    fn new(json: bool) -> Self {
        Self {
            json,
            color: std::io::stdout().is_terminal(),
        }
    }

    fn event(&self, event: &Event) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
            return Ok(());
        }
        match event {
            Event::TrackingStarted {
                source, target_kmh, ..
            } => println!("tracking from {source} source, target {target_kmh:.1} km/h"),
            Event::TrackingStopped { .. } => println!("tracking stopped"),
            Event::SampleProcessed {
                speed_kmh,
                accuracy_m,
                status,
                color,
                ..
            }
            | Event::StateSnapshot {
                speed_kmh,
                accuracy_m,
                status,
                color,
                ..
            } => println!("{}", self.status_line(*speed_kmh, *accuracy_m, *status, *color)),
            Event::SourceError { message, .. } => println!("! {message}"),
            Event::AlertFired { delivered, .. } => {
                if !delivered {
                    println!("! alert could not be delivered");
                }
            }
            Event::TargetChanged { target_kmh, .. } => {
                println!("target set to {target_kmh:.1} km/h")
            }
        }
        Ok(())
    }

    fn status_line(
        &self,
        speed_kmh: f64,
        accuracy_m: f64,
        status: PaceStatus,
        color: SpeedColor,
    ) -> String {
        let speed = format!("{speed_kmh:>5.1} km/h");
        let speed = if self.color {
            format!("\x1b[{}m{speed}\x1b[0m", color.ansi_code())
        } else {
            speed
        };
        let mut line = format!("{speed}  {status}");
        if accuracy_m > 0.0 {
            line.push_str(&format!("  ±{accuracy_m:.0}m"));
        }
        line
    }
}
