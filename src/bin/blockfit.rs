//! blockfit simulator
//!
//! Runs the first-fit / best-fit comparison and writes the per-request table

use anyhow::Context;
use blockfit::{save_steps_csv, Policy, Simulation, SimulationConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use validator::Validate;

#[derive(Parser, Debug)]
#[command(name = "blockfit")]
#[command(about = "Compare first-fit and best-fit block allocation on a synthetic workload")]
struct Args {
    /// TOML config file (flags below override its values)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Pool size in units
    #[arg(short = 'u', long)]
    units: Option<usize>,

    /// Number of requests to simulate
    #[arg(short = 'n', long)]
    requests: Option<usize>,

    /// Highest process id [default: one per request]
    #[arg(long)]
    max_pid: Option<u32>,

    /// Smallest request size in units
    #[arg(long)]
    min_size: Option<usize>,

    /// Largest request size in units
    #[arg(long)]
    max_size: Option<usize>,

    /// Workload seed
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Policy to run (repeat to compare several)
    #[arg(short = 'p', long = "policy", value_enum)]
    policies: Vec<Policy>,

    /// Per-request CSV output
    #[arg(short = 'o', long, default_value = "results.csv")]
    output: PathBuf,

    /// Also write the final report as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(SimulationConfig, PathBuf, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)
                .with_context(|| format!("loading config {:?}", path))?,
            None => SimulationConfig::default(),
        };

        if let Some(units) = self.units {
            config.total_units = units;
        }
        if let Some(requests) = self.requests {
            config.requests = requests;
        }
        if self.max_pid.is_some() {
            config.max_pid = self.max_pid;
        }
        if let Some(min) = self.min_size {
            config.min_request_size = min;
        }
        if let Some(max) = self.max_size {
            config.max_request_size = max;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if !self.policies.is_empty() {
            config.policies = self.policies;
        }

        config.validate().context("invalid simulation config")?;
        Ok((config, self.output, self.summary_json))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let (config, output, summary_json) = Args::parse().into_config()?;

    info!(
        "Pool of {} units, {} requests, sizes {}..={}, seed {}",
        config.total_units,
        config.requests,
        config.min_request_size,
        config.max_request_size,
        config.seed
    );

    let mut sim = Simulation::new(&config)?;
    let records = sim.run(config.requests);
    let report = sim.report();

    println!("{}", report);

    save_steps_csv(&output, &sim.policies(), &records)
        .with_context(|| format!("writing {:?}", output))?;

    if let Some(path) = summary_json {
        std::fs::write(&path, report.to_json()?)
            .with_context(|| format!("writing {:?}", path))?;
        info!("Wrote summary to {:?}", path);
    }

    Ok(())
}
