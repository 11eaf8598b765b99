//! Headless town growth run
//! Loads a config, runs the engine and prints a summary or the full JSON output

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use town_growth::core::SimulationConfig;
use town_growth::town::simulate;

/// Town growth - village-to-town simulation
#[derive(Parser, Debug)]
#[command(name = "town_sim")]
#[command(about = "Simulate a rural settlement growing into a town")]
struct Args {
    /// TOML config file; omitted sections keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of steps to simulate (five per simulated year)
    #[arg(long, default_value_t = 120)]
    steps: u64,

    /// Override the seed from the config
    #[arg(long)]
    seed: Option<u64>,

    /// Print the full output as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match SimulationConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Could not load config");
                return ExitCode::FAILURE;
            }
        },
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    tracing::info!(
        population = config.population,
        businesses = config.business_count,
        width = config.grid.width,
        height = config.grid.height,
        steps = args.steps,
        "Starting town growth simulation"
    );

    let output = match simulate(config, args.steps) {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(error = %e, "Simulation aborted");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        println!("{}", output.to_json());
        return ExitCode::SUCCESS;
    }

    println!("{}", output.summary());

    println!("\n--- Infrastructure Coverage ---");
    if let Some(last) = output.snapshots.last() {
        for (kind, rate) in last.coverage.iter() {
            println!("{:>8}: {:5.1}%", kind.label(), rate * 100.0);
        }
        println!("\n--- Sector Shares ---");
        for (sector, share) in last.sector_shares.iter() {
            println!("{:>13}: {:5.1}%", sector.label(), share * 100.0);
        }
        println!("\nPoverty rate: {:.1}%", last.poverty_rate * 100.0);
        println!("Budget pool:  {:.0}", last.budget_pool);
    }

    ExitCode::SUCCESS
}
