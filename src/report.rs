use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{LabError, Result};

/// An empirical probability kept in the log2 domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Probability {
    /// log2 of the success rate, never positive.
    Log2(f64),
    /// Nothing returned, so no finite estimate exists.
    BelowThreshold,
}

impl Probability {
    pub fn estimate(returned: f64, thrown: f64) -> Self {
        if returned > 0.0 && thrown > 0.0 {
            Probability::Log2(returned.log2() - thrown.log2())
        } else {
            Probability::BelowThreshold
        }
    }

    pub fn log2(&self) -> f64 {
        match self {
            Probability::Log2(x) => *x,
            Probability::BelowThreshold => f64::NEG_INFINITY,
        }
    }

    /* Short form used by progress and per-key lines, e.g. 2^-12.345. */
    pub fn short(&self) -> String {
        match self {
            Probability::Log2(x) => format!("2^{:.3}", x),
            Probability::BelowThreshold => "2^-inf".to_owned(),
        }
    }
}

impl Display for Probability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Probability::Log2(x) => write!(f, "2^(-{:.4})", 0.0 - x),
            Probability::BelowThreshold => write!(f, "2^(-inf)"),
        }
    }
}

/* Write a possibly huge count as a power of two, integral when exact. */
fn power_of_two(count: u128) -> String {
    if count == 0 {
        "0".to_owned()
    } else if count.is_power_of_two() {
        format!("2^{}", count.trailing_zeros())
    } else {
        format!("2^{:.4}", (count as f64).log2())
    }
}

fn parse_power_of_two(text: &str) -> Option<f64> {
    match text.trim() {
        "0" => Some(0.0),
        t => t
            .strip_prefix("2^")
            .and_then(|e| e.parse::<f64>().ok())
            .map(f64::exp2),
    }
}

/// One line of the experiment summary file.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRecord {
    pub seed: u32,
    pub rounds: usize,
    pub cipher: String,
    pub title: String,
    pub unit: String,
    pub dp: String,
    pub dc: String,
    pub thrown: u128,
    pub returned: u128,
}

impl ReportRecord {
    pub fn probability(&self) -> Probability {
        Probability::estimate(self.returned as f64, self.thrown as f64)
    }

    pub fn file_name(rounds: usize, task_id: u32) -> String {
        format!("result_{}_{}.txt", rounds, task_id)
    }

    /* Write the record as result_<rounds>_<task>.txt under dir. */
    pub fn write_to(&self, dir: &Path, task_id: u32) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(self.rounds, task_id));
        fs::write(&path, self.to_string())?;
        info!(path = %path.display(), "result written");
        Ok(path)
    }
}

impl Display for ReportRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Initial seed 0x{:08X}", self.seed)?;
        writeln!(
            f,
            "{} distinguisher for {} rounds of {}",
            self.title, self.rounds, self.cipher
        )?;
        writeln!(f, "Input difference: \t {}", self.dp)?;
        writeln!(f, "Output difference: \t {}", self.dc)?;
        writeln!(f, "Average probability = {}", self.probability())?;
        writeln!(
            f,
            "Number of {} thrown = {}",
            self.unit,
            power_of_two(self.thrown)
        )?;
        writeln!(f, "Number of {} returned = {}", self.unit, self.returned)
    }
}

/// Totals read back from several result files.
#[derive(Clone, Debug, PartialEq)]
pub struct Collected {
    pub files: usize,
    pub thrown: f64,
    pub returned: u128,
}

impl Collected {
    pub fn probability(&self) -> Probability {
        Probability::estimate(self.returned as f64, self.thrown)
    }
}

fn value(line: &str) -> Option<&str> {
    line.split(" = ").nth(1).map(str::trim)
}

/* The thrown and returned counts are the values after " = " on the last two lines. */
fn read_counts(path: &Path) -> Result<(f64, u128)> {
    let malformed = |reason: &str| LabError::Record {
        path: path.to_owned(),
        reason: reason.to_owned(),
    };
    let text = fs::read_to_string(path)?;
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(malformed("fewer than two lines"));
    }
    let thrown = value(lines[lines.len() - 2])
        .and_then(parse_power_of_two)
        .ok_or_else(|| malformed("bad thrown count"))?;
    let returned = value(lines[lines.len() - 1])
        .and_then(|v| v.parse::<u128>().ok())
        .ok_or_else(|| malformed("bad returned count"))?;
    Ok((thrown, returned))
}

/* Combine result_<rounds>_<task>.txt for task in 0..tasks. */
pub fn collect(dir: &Path, rounds: usize, tasks: u32) -> Result<Collected> {
    let mut collected = Collected {
        files: 0,
        thrown: 0.0,
        returned: 0,
    };
    for task in 0..tasks {
        let path = dir.join(ReportRecord::file_name(rounds, task));
        let (thrown, returned) = read_counts(&path)?;
        collected.files += 1;
        collected.thrown += thrown;
        collected.returned += returned;
    }
    Ok(collected)
}
