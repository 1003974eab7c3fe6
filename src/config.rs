use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;

use crate::error::{LabError, Result};
use crate::parallel::Counts;
use crate::trial::Distinguisher;

/* Per-worker counters are u64, so one worker may throw at most 2^63 trials. */
pub const MAX_DEG: u32 = 63;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CipherKind {
    /// Reduced-round AES, 16 byte symbols.
    Aes,
    /// 64-bit generalized Feistel toy cipher, 16 nibble symbols.
    Gfn,
    /// One-nibble identity.
    Identity,
}

/// Settings that may come from a TOML file or from the command line.
#[derive(Args, Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    /// Target cipher
    #[arg(long, value_enum)]
    pub cipher: Option<CipherKind>,

    /// Return condition checked by each trial
    #[arg(long, value_enum)]
    pub distinguisher: Option<Distinguisher>,

    /// Number of rounds
    #[arg(long)]
    pub rounds: Option<usize>,

    /// log2 of the number of bunches (keys) per worker
    #[arg(long)]
    pub deg1: Option<u32>,

    /// log2 of the number of trials per bunch
    #[arg(long)]
    pub deg2: Option<u32>,

    /// Number of independent experiments
    #[arg(long)]
    pub experiments: Option<u32>,

    /// Number of parallel workers (defaults to all logical cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Input difference, most significant symbol first
    #[arg(long)]
    pub dp: Option<String>,

    /// Output difference, most significant symbol first
    #[arg(long)]
    pub dc: Option<String>,

    /// Print one line per key with its own probability
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub per_key: Option<bool>,

    /// Directory receiving result_<rounds>_<task>.txt
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl Overrides {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

/// Everything fixed for the lifetime of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentConfig {
    pub cipher: CipherKind,
    pub distinguisher: Distinguisher,
    pub rounds: usize,
    pub deg1: u32,
    pub deg2: u32,
    pub experiments: u32,
    pub workers: usize,
    pub dp: String,
    pub dc: String,
    pub per_key: bool,
    pub output_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            cipher: CipherKind::Gfn,
            distinguisher: Distinguisher::Boomerang,
            rounds: 8,
            deg1: 13,
            deg2: 13,
            experiments: 4,
            workers: num_cpus::get(),
            dp: "0000010000000000".to_owned(),
            dc: "0000000030000000".to_owned(),
            per_key: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExperimentConfig {
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(cipher) = overrides.cipher {
            self.cipher = cipher;
        }
        if let Some(distinguisher) = overrides.distinguisher {
            self.distinguisher = distinguisher;
        }
        if let Some(rounds) = overrides.rounds {
            self.rounds = rounds;
        }
        if let Some(deg1) = overrides.deg1 {
            self.deg1 = deg1;
        }
        if let Some(deg2) = overrides.deg2 {
            self.deg2 = deg2;
        }
        if let Some(experiments) = overrides.experiments {
            self.experiments = experiments;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(dp) = overrides.dp {
            self.dp = dp;
        }
        if let Some(dc) = overrides.dc {
            self.dc = dc;
        }
        if let Some(per_key) = overrides.per_key {
            self.per_key = per_key;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = output_dir;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(LabError::Config("at least one worker is required".into()));
        }
        if self.experiments == 0 {
            return Err(LabError::Config(
                "at least one experiment is required".into(),
            ));
        }
        let deg = self.deg1.saturating_add(self.deg2);
        if deg > MAX_DEG {
            return Err(LabError::Config(format!(
                "deg1 + deg2 = {} exceeds {}",
                deg, MAX_DEG
            )));
        }
        Ok(())
    }

    /// N1 workers, N2 = 2^deg1 bunches, N3 = 2^deg2 trials.
    pub fn counts(&self) -> Counts {
        Counts {
            workers: self.workers,
            bunches: 1 << self.deg1,
            trials: 1 << self.deg2,
        }
    }
}
