pub mod aes_round;
pub mod config;
pub mod difference;
pub mod error;
pub mod keylog;
pub mod oracle;
pub mod parallel;
pub mod report;
pub mod toy;
pub mod tools;
pub mod trial;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ExperimentConfig, Overrides};
use crate::report::collect;
use crate::tools::*;

#[derive(Parser)]
#[command(
    name = "boomerang_exp",
    about = "Estimate the probability of a boomerang or differential distinguisher",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Task identifier, added to the initial seed and used in the result file name
    #[arg(default_value_t = 0)]
    task_id: u32,

    /// TOML file with run settings; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed initial seed instead of OS entropy
    #[arg(long)]
    seed: Option<u32>,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand)]
enum Command {
    /// Combine the result files of several tasks
    Collect {
        /// Round count in the result file names
        #[arg(long)]
        rounds: usize,
        /// Number of tasks, reading result_<rounds>_0.txt up to result_<rounds>_<tasks-1>.txt
        #[arg(long)]
        tasks: u32,
        /// Directory holding the result files
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Some(Command::Collect { rounds, tasks, dir }) = cli.command {
        let collected = collect(&dir, rounds, tasks)
            .with_context(|| format!("collecting results from {}", dir.display()))?;
        println!("Total number of returned boomerangs: {}", collected.returned);
        println!(
            "Total number of queries: 2^({:.2})",
            collected.thrown.log2()
        );
        println!("Average probability: {}", collected.probability());
        return Ok(());
    }

    let mut config = ExperimentConfig::default();
    if let Some(path) = &cli.config {
        let file = Overrides::load(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        config = config.apply(file);
    }
    let config = config.apply(cli.overrides);

    let initial_seed = match cli.seed {
        Some(seed) => seed.wrapping_add(cli.task_id),
        None => init_seed(cli.task_id).context("seeding the run")?,
    };
    info!(?config, "configuration");

    let record = run_config(&config, initial_seed)?;
    let path = record.write_to(&config.output_dir, cli.task_id)?;
    println!("\nAverage probability = {}", record.probability());
    info!(path = %path.display(), "done");
    Ok(())
}
