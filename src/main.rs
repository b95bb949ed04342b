// Celestial Engine - Headless driver
// Loads a scenario, runs a fixed number of steps, prints the final snapshot

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Deserialize;

use std::fs;
use std::path::PathBuf;

use celestial_engine::{PhysicsBody, PhysicsEngineService, SimulationOrchestrator, SimulationParams};

#[derive(Parser, Debug)]
#[command(version, about = "Run a celestial-engine scenario headless")]
struct Args {
    /// Scenario JSON with `bodies` and `params`
    #[arg(short, long)]
    scenario: PathBuf,

    /// Number of steps to run
    #[arg(short = 'n', long, default_value_t = 100)]
    steps: usize,

    /// Step size in seconds
    #[arg(long, default_value_t = 60.0)]
    dt: f64,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    bodies: Vec<PhysicsBody>,
    #[serde(default)]
    params: SimulationParams,
}

fn load_scenario(path: &PathBuf) -> Result<Scenario> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    scenario.params.validate()?;
    Ok(scenario)
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let scenario = load_scenario(&args.scenario)?;
    info!(
        "loaded {} bodies, engine {}, gravity {}",
        scenario.bodies.len(),
        scenario.params.physics_engine,
        scenario.params.gravity_model
    );

    let service = PhysicsEngineService::new(scenario.bodies, SimulationOrchestrator::default());
    for _ in 0..args.steps {
        service.execute_step(args.dt, &scenario.params)?;
    }

    let snapshot = service.snapshot();
    info!(
        "finished {} steps, t = {}s, energy drift {:.3e}",
        snapshot.step_count, snapshot.simulation_time, snapshot.energy_drift
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
