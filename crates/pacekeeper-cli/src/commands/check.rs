use clap::Args;
use pacekeeper_core::pace::alert_due;
use pacekeeper_core::{normalize_speed, Config, PaceStatus, SpeedColor, TargetSpeed};
use serde::Serialize;

#[derive(Args)]
pub struct CheckArgs {
    /// Speed reading in m/s (omit to model a fix without speed)
    #[arg(long, allow_hyphen_values = true)]
    speed_mps: Option<f64>,
    /// Target speed in km/h (defaults to the configured target)
    #[arg(long)]
    target: Option<f64>,
}

#[derive(Serialize)]
struct CheckReport {
    speed_kmh: f64,
    target_kmh: f64,
    status: PaceStatus,
    status_text: &'static str,
    color: SpeedColor,
    would_alert: bool,
}

pub fn run(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let target = match args.target {
        Some(kmh) => TargetSpeed::with_policy(kmh, config.pace.target_policy)?,
        None => config.target()?,
    };

    let speed_kmh = normalize_speed(args.speed_mps);
    let status = PaceStatus::derive(true, speed_kmh, target.kmh());
    let report = CheckReport {
        speed_kmh,
        target_kmh: target.kmh(),
        status,
        status_text: status.text(),
        color: SpeedColor::derive(true, speed_kmh, target.kmh()),
        would_alert: alert_due(speed_kmh, target.kmh(), None, 0, config.pace.cooldown_ms),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
