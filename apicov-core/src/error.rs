use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for apicov.
///
/// Only conditions that abort a run live here. Per-record problems in the log
/// (bad JSON, unknown routes, undeclared status codes) are counted by the
/// replayer instead.
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Failed to read contract {}: {source}", path.display())]
    ContractRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse contract {}: {message}", path.display())]
    ContractParse { path: PathBuf, message: String },

    #[error("Failed to open log file {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read log at line {line}: {source}")]
    LogRead {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl CoverageError {
    /// Which input failed: `"contract"`, `"logs"` or `"config"`.
    pub fn input(&self) -> &'static str {
        match self {
            CoverageError::ContractRead { .. } | CoverageError::ContractParse { .. } => "contract",
            CoverageError::LogOpen { .. } | CoverageError::LogRead { .. } => "logs",
            CoverageError::Config(_) => "config",
        }
    }
}

pub type Result<T, E = CoverageError> = std::result::Result<T, E>;
