//! Headless arena runner.
//!
//! Spawns a scenario (the built-in default or a JSON file), steps the Bevy
//! app for the configured simulated duration and logs a summary.
use std::path::PathBuf;

use anyhow::Context;
use bevy::prelude::*;
use clap::Parser;
use log::info;
use menagerie::components::{Brain, Health, Team};
use menagerie::numeric::ticks_for;
use menagerie::sim::{BehaviourLog, DeliveryLedger, SimClock};
use menagerie::{init_logging, load_scenario, spawn_scenario, CreaturePlugin, ScenarioConfig};

/// Headless simulation of autonomous creatures in a bounded arena
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Scenario file (JSON); the built-in scenario is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the simulated duration in seconds
    #[arg(short, long)]
    seconds: Option<f32>,
    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,
}

fn scenario_from(args: &Args) -> anyhow::Result<ScenarioConfig> {
    let mut scenario = match &args.config {
        Some(path) => load_scenario(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(seconds) = args.seconds {
        scenario.duration_seconds = seconds;
    }
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    scenario.validate().context("invalid command line overrides")?;
    Ok(scenario)
}

fn summarise(app: &mut App) {
    let world = app.world_mut();
    let now = world.resource::<SimClock>().now;
    let delivered = world.resource::<DeliveryLedger>().len();
    let events = world.resource::<BehaviourLog>().total();
    let mut creatures = world.query::<(&Team, &Health)>();
    let (mut allies, mut hostiles) = (0_usize, 0_usize);
    for (team, health) in creatures.iter(world) {
        match team {
            Team::Ally if health.0 > 0 => allies += 1,
            Team::Hostile if health.0 > 0 => hostiles += 1,
            _ => {}
        }
    }
    let mut brains = world.query::<&Brain>();
    for brain in brains.iter(world) {
        info!("{:?} finished in {:?}", brain.id(), brain.mode());
    }
    info!(
        "after {now:.1}s: {allies} allies and {hostiles} hostiles standing, \
         {delivered} items delivered, {events} behaviour events"
    );
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let scenario = scenario_from(&args)?;
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(CreaturePlugin);
    spawn_scenario(app.world_mut(), &scenario);

    let ticks = ticks_for(scenario.duration_seconds, scenario.tick_seconds);
    info!(
        "running {ticks} ticks of {}s (seed {})",
        scenario.tick_seconds, scenario.seed
    );
    for _ in 0..ticks {
        app.update();
    }
    summarise(&mut app);
    Ok(())
}
