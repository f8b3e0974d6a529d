#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Code Defence session.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use code_defence_core::{GameStatus, MessageChannel, MobSpawnEvent};
use code_defence_session::{Collaborators, GameConfig, Session, WavePhase};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Runs a Code Defence session without a renderer.
#[derive(Debug, Parser)]
#[command(name = "code-defence", version, about)]
struct Cli {
    /// Game configuration file; the embedded default is used when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the archetype draws.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Simulated seconds to run.
    #[arg(long, default_value_t = 45)]
    seconds: u64,
    /// Length of one simulation tick in milliseconds.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Buy a unit on every tick the balance allows it.
    #[arg(long)]
    auto_generate: bool,
    /// Apply every satisfiable fusion recipe on each tick.
    #[arg(long)]
    auto_fuse: bool,
    /// Print the final report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Message channel that forwards rejections to the log.
struct LoggedMessages;

impl MessageChannel for LoggedMessages {
    fn report(&mut self, message: &str) {
        warn!(%message, "player notification");
    }
}

#[derive(Debug, Serialize)]
struct UnitReport {
    archetype: String,
    x: u32,
    y: u32,
}

#[derive(Debug, Serialize)]
struct Report {
    seed: u64,
    elapsed_ms: u64,
    wave_phase: String,
    status: GameStatus,
    units: Vec<UnitReport>,
    spawns: Vec<MobSpawnEvent>,
    messages_delivered: u64,
}

/// Entry point for the Code Defence command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => GameConfig::embedded().context("embedded configuration is invalid")?,
    };

    let report = run(&cli, &config)?;
    if cli.json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialise report")?;
        println!("{rendered}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: &Cli, config: &GameConfig) -> Result<Report> {
    let collaborators = Collaborators::seeded(config, cli.seed, Box::new(LoggedMessages));
    let mut session = Session::new(config, collaborators);
    info!("{}", session.welcome_banner());

    let generation_cost = config.rules().generation_cost;
    let unit_limit = config.rules().unit_limit;
    let tick = Duration::from_millis(cli.tick_ms);
    let total = Duration::from_secs(cli.seconds);
    let mut spawns: Vec<MobSpawnEvent> = Vec::new();

    session.start_economy();
    session.start_waves();
    while session.elapsed() < total {
        let step = tick.min(total - session.elapsed());
        session.advance(step, &mut spawns);

        if cli.auto_generate
            && session.status().money >= generation_cost
            && session.units().len() <= unit_limit
        {
            let _ = session.generate_unit();
        }
        if cli.auto_fuse {
            for recipe in session.satisfiable_recipes() {
                let _ = session.upgrade_unit(recipe);
            }
        }
    }
    session.stop_waves();
    session.stop_economy();

    Ok(Report {
        seed: cli.seed,
        elapsed_ms: u64::try_from(session.elapsed().as_millis()).unwrap_or(u64::MAX),
        wave_phase: describe_phase(session.wave_phase()),
        status: session.status(),
        units: session
            .units()
            .iter()
            .map(|unit| UnitReport {
                archetype: unit.archetype.to_string(),
                x: unit.position.x(),
                y: unit.position.y(),
            })
            .collect(),
        spawns,
        messages_delivered: session.messages_delivered(),
    })
}

fn describe_phase(phase: WavePhase) -> String {
    match phase {
        WavePhase::Idle => "idle".to_owned(),
        WavePhase::Running { stage, .. } => format!("running stage {}", stage + 1),
        WavePhase::Paused { stage, .. } => format!("paused at stage {}", stage + 1),
        WavePhase::Complete => "complete".to_owned(),
    }
}

fn print_report(report: &Report) {
    println!(
        "simulated {} ms with seed {} (waves {})",
        report.elapsed_ms, report.seed, report.wave_phase
    );
    println!(
        "money {} | money level {} | power {} | speed {} | reload {}",
        report.status.money,
        report.status.money_level,
        report.status.power,
        report.status.speed,
        report.status.reload
    );
    for spawn in &report.spawns {
        println!(
            "[{:>6} ms] stage {}: {} x{}",
            spawn.emitted_at.as_millis(),
            spawn.stage + 1,
            spawn.mob,
            spawn.count
        );
    }
    println!("{} units:", report.units.len());
    for unit in &report.units {
        println!("  {} at ({}, {})", unit.archetype, unit.x, unit.y);
    }
    if report.messages_delivered > 0 {
        println!("{} operations were rejected", report.messages_delivered);
    }
}
