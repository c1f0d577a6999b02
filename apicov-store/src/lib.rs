pub mod logs;
pub mod openapi;

pub use logs::open_logs;
pub use openapi::OpenApiDocument;

use apicov_core::error::Result;
use apicov_core::replay::ReplayStats;
use apicov_core::summary::Summary;
use std::path::Path;

/// Compute coverage for a contract file and a log file on disk.
///
/// The contract is loaded first; a missing log file is reported only after
/// the contract parsed.
pub fn coverage_from_files(
    contract_path: &Path,
    logs_path: &Path,
    strip_url_prefix: &str,
) -> Result<(Summary, ReplayStats)> {
    let contract = OpenApiDocument::load(contract_path)?;
    let logs = open_logs(logs_path)?;
    apicov_core::coverage(&contract, logs, strip_url_prefix)
}
