use pacekeeper_core::{AlertEvent, AlertSink, Config, TerminalSink};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let target = config.target()?;
    let mut sink = TerminalSink::stderr()
        .with_audio(config.alerts.audio)
        .with_vibration(config.alerts.vibration);

    let alert = AlertEvent {
        speed_kmh: target.kmh() / 2.0,
        target_kmh: target.kmh(),
        at_ms: 0,
    };
    sink.fire(&alert)?;
    println!("ok");
    Ok(())
}
