use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while parsing a difference string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DifferenceError {
    #[error("difference {text:?} has {found} hex digits, expected {expected}")]
    Length {
        text: String,
        expected: usize,
        found: usize,
    },

    #[error("difference {text:?} is not valid hex")]
    InvalidHex { text: String },
}

/// Fatal conditions of an experiment run.
#[derive(Debug, Error)]
pub enum LabError {
    #[error("OS entropy source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    #[error("{cipher} with {rounds} rounds failed the encrypt/decrypt self-test")]
    SelfTest { cipher: &'static str, rounds: usize },

    #[error(transparent)]
    Difference(#[from] DifferenceError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("malformed result record {path}: {reason}")]
    Record { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, LabError>;
