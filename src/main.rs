use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use empress::app::{AppConfig, FightApp};
use empress::config::Tuning;
use empress::error::Result;
use empress::logging::init_logging;

#[derive(Parser)]
#[command(name = "empress", about = "Headless boss fight simulator")]
struct Args {
    /// Ticks to simulate before stopping (60 per second).
    #[arg(long, default_value_t = 60 * 60)]
    ticks: u64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Run a replicating observer alongside the authority.
    #[arg(long)]
    observer: bool,

    /// YAML tuning overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write broadcast snapshots to this file as JSON lines.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Damage dealt to the boss every tick.
    #[arg(long, default_value_t = 0)]
    damage_per_tick: i32,

    /// Pace the simulation at 60 ticks per wall-clock second.
    #[arg(long)]
    realtime: bool,

    /// -v info, -vv debug, -vvv trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: Args) -> Result<()> {
    let tuning = match &args.config {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let app = FightApp::new(AppConfig {
        tuning,
        seed: args.seed,
        max_ticks: args.ticks,
        with_observer: args.observer,
        record: args.record,
        damage_per_tick: args.damage_per_tick,
        realtime: args.realtime,
        log_effects: true,
    })?;
    let summary = app.run()?;

    tracing::info!(ticks = summary.ticks, state = ?summary.final_state, "fight over");
    println!(
        "ticks={} state={:?} phase={} life={} despawned={} transitions={} snapshots={} hits={} expired={} damage={}",
        summary.ticks,
        summary.final_state,
        summary.phase,
        summary.life,
        summary.despawned,
        summary.transitions,
        summary.snapshots,
        summary.projectile_hits,
        summary.projectiles_expired,
        summary.damage_to_target,
    );
    if let Some(drift) = summary.observer_drift {
        println!("observer_drift={drift:.3}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
