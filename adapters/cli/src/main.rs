#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Hive Invasion encounter.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use hive_invasion_core::{Command, Event, GameOutcome, ObjectiveKind};
use hive_invasion_simulation::{Simulation, SimulationConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hive-invasion")]
#[command(about = "Run a headless Hive Invasion encounter and report the outcome")]
#[command(
    long_about = "Run a headless Hive Invasion encounter and report the outcome.\n\n\
                  The run has no defenders: nothing damages the invaders, so an encounter \
                  ends in defeat once the base falls or stays undecided at --max-seconds."
)]
struct Args {
    /// TOML file with simulation settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed overriding the one in the settings
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated milliseconds per step
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// Give up after this many simulated seconds
    #[arg(long, default_value_t = 900)]
    max_seconds: u64,
    /// Open the gate at this simulated second
    #[arg(long)]
    open_gate_at: Option<f64>,
    /// Close the gate at this simulated second
    #[arg(long)]
    close_gate_at: Option<f64>,
}

#[derive(Debug, Default)]
struct Tally {
    spawned: u32,
    attacks: u32,
    gate_health: Option<(u32, u32)>,
    base_health: Option<(u32, u32)>,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match *event {
            Event::AgentSpawned { .. } => self.spawned += 1,
            Event::AgentAttacked { .. } => self.attacks += 1,
            Event::ObjectiveDamaged {
                kind,
                health,
                max_health,
                ..
            } => match kind {
                ObjectiveKind::Gate => self.gate_health = Some((health, max_health)),
                ObjectiveKind::Base => self.base_health = Some((health, max_health)),
            },
            _ => {}
        }
    }
}

/// Entry point for the Hive Invasion command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    ensure!(args.tick_ms > 0, "--tick-ms must be positive");

    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let mut open_at = seconds(args.open_gate_at, "--open-gate-at")?;
    let mut close_at = seconds(args.close_gate_at, "--close-gate-at")?;

    let mut simulation = Simulation::new(&config).context("invalid simulation settings")?;
    let dt = Duration::from_millis(args.tick_ms);
    let limit = Duration::from_secs(args.max_seconds);
    let mut tally = Tally::default();

    while simulation.outcome().is_none() && simulation.clock() < limit {
        let now = simulation.clock();
        if open_at.is_some_and(|at| now >= at) {
            simulation.submit(Command::OpenGate);
            open_at = None;
        }
        if close_at.is_some_and(|at| now >= at) {
            simulation.submit(Command::CloseGate);
            close_at = None;
        }

        simulation.step(dt);
        for event in simulation.drain_events() {
            tally.record(&event);
        }
    }

    print_summary(&simulation, &tally);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    let config = SimulationConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    info!(path = %path.display(), "settings loaded");
    Ok(config)
}

fn seconds(value: Option<f64>, flag: &str) -> Result<Option<Duration>> {
    value
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .with_context(|| format!("{flag} expects a non-negative number of seconds"))
        })
        .transpose()
}

fn print_summary(simulation: &Simulation, tally: &Tally) {
    println!("wave  planned  spawned  status");
    for report in simulation.progress().reports() {
        let status = match (report.started, report.completed) {
            (_, true) => "completed",
            (true, false) => "spawning",
            (false, false) => "pending",
        };
        println!(
            "{:>4}  {:>7}  {:>7}  {status}",
            report.wave.get(),
            report.planned,
            report.spawned
        );
    }

    println!();
    println!(
        "agents: {} spawned, {} attacks landed",
        tally.spawned, tally.attacks
    );
    for (label, health) in [("gate", tally.gate_health), ("base", tally.base_health)] {
        if let Some((health, max_health)) = health {
            println!("{label}: {health}/{max_health}");
        }
    }

    let seconds = simulation.clock().as_secs_f32();
    match simulation.outcome() {
        Some(GameOutcome::Victory) => println!("victory after {seconds:.1}s"),
        Some(GameOutcome::Defeat) => println!("defeat after {seconds:.1}s"),
        None => println!("undecided after {seconds:.1}s"),
    }
}
