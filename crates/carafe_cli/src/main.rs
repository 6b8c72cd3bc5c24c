//! Carafe simulation runner.
//!
//! Runs agents contending for shared resources over a topology and logs the
//! event stream through `tracing`.
//!
//! # Usage
//!
//! ```bash
//! carafe [--config <FILE>] [--ring <N>] [--duration <SECS>] [--seed <N>]
//!        [--format pretty|compact|json] [--log-level <LEVEL>] [--log-filter <DIRECTIVES>]
//!        [--report]
//! ```
//!
//! # Example
//!
//! ```bash
//! carafe --ring 7 --duration 10 --seed 42 --format json
//! ```

use anyhow::{Context, Result};
use carafe_agent::{Simulation, SimulationConfig, SimulationReport};
use carafe_core::{TracingConfig, TracingFormat, TracingSink};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

/// Drinking-philosophers style resource sharing simulation
#[derive(Debug, Parser)]
#[command(name = "carafe")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a JSON configuration file (defaults to the reference layout)
    #[arg(short, long, env = "CARAFE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Replace the topology with a ring of N agents and N resources
    #[arg(long, value_name = "N", conflicts_with = "config")]
    ring: Option<usize>,

    /// Run duration in seconds
    #[arg(short, long, value_name = "SECS")]
    duration: Option<u64>,

    /// Seed for reproducible agent choices
    #[arg(long)]
    seed: Option<u64>,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "CARAFE_LOG_FORMAT", default_value = "compact")]
    format: TracingFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CARAFE_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Filter directives such as `carafe=debug`, overriding --log-level
    #[arg(long, env = "RUST_LOG", value_name = "DIRECTIVES")]
    log_filter: Option<String>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    report: bool,
}

impl Cli {
    /// Loads the base configuration and applies command-line overrides.
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match (&self.config, self.ring) {
            (Some(path), _) => SimulationConfig::from_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            (None, Some(n)) => SimulationConfig::ring(n)?,
            (None, None) => SimulationConfig::default(),
        };

        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut logging = TracingConfig::default()
        .with_level(cli.log_level)
        .with_format(cli.format);
    if let Some(filter) = &cli.log_filter {
        logging = logging.with_env_filter(filter);
    }
    logging.init();

    let config = cli.simulation_config()?;
    let simulation =
        Simulation::new(&config, Arc::new(TracingSink)).context("invalid simulation config")?;
    let report = simulation.run_for(config.duration()).await;

    summarize(&report);
    if cli.report {
        print_report(&report)?;
    }
    Ok(())
}

fn summarize(report: &SimulationReport) {
    for stats in &report.stats {
        tracing::info!(
            agent = %stats.agent,
            cycles = stats.cycles,
            failed_attempts = stats.failed_attempts,
            "agent summary"
        );
    }
    for agent in report.starved() {
        tracing::warn!(agent = %agent, "agent never completed a cycle");
    }
    tracing::info!("final {}", report.final_snapshot);
}

#[expect(clippy::print_stdout, reason = "the report is the program's output")]
fn print_report(report: &SimulationReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_reference_run() {
        let cli = Cli::try_parse_from(["carafe"]).unwrap();
        let config = cli.simulation_config().unwrap();

        assert_eq!(config, SimulationConfig::default());
        assert_eq!(cli.format, TracingFormat::Compact);
        assert_eq!(cli.log_level, Level::INFO);
    }

    #[test]
    fn overrides_apply_on_top_of_ring() {
        let cli = Cli::try_parse_from([
            "carafe", "--ring", "4", "--duration", "3", "--seed", "8", "--format", "json",
        ])
        .unwrap();
        let config = cli.simulation_config().unwrap();

        assert_eq!(config.agents, 4);
        assert_eq!(config.duration_secs, 3);
        assert_eq!(config.seed, Some(8));
        assert_eq!(cli.format, TracingFormat::Json);
    }

    #[test]
    fn ring_and_config_conflict() {
        assert!(Cli::try_parse_from(["carafe", "--ring", "4", "--config", "x.json"]).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = Cli::try_parse_from(["carafe", "--config", "/nonexistent/carafe.json"]).unwrap();
        let error = cli.simulation_config().unwrap_err();
        assert!(error.to_string().starts_with("loading /nonexistent/carafe.json"));
    }
}
