use apicov_core::error::{CoverageError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Open a newline-delimited request log for replay.
pub fn open_logs(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| CoverageError::LogOpen {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Log file opened");
    Ok(BufReader::new(file))
}
