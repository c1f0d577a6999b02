use crate::endpoint::{Endpoint, LogRecord};
use crate::error::{CoverageError, Result};
use crate::router::{RequestMatcher, canonical_path};
use serde::Serialize;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{debug, info, trace};

/// Per-run diagnostics. These never feed into the coverage numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Non-blank lines read
    pub lines: usize,
    /// Lines that were not a valid log record
    pub malformed: usize,
    /// Records whose request resolved to no declared route
    pub unmatched: usize,
    /// Records that resolved, but with a status code the operation does not declare
    pub undeclared_status: usize,
    /// Records that marked an endpoint (repeat hits included)
    pub touched: usize,
}

/// Replay a newline-delimited log against the contract, marking every
/// endpoint that a record resolves to.
///
/// Bad lines and unresolvable requests are skipped. Only I/O failure on the
/// source aborts.
pub fn replay<R: BufRead>(
    mut source: R,
    matcher: &RequestMatcher,
    endpoints: &mut [Endpoint],
    strip_url_prefix: &str,
) -> Result<ReplayStats> {
    let index = endpoint_index(endpoints);
    let mut stats = ReplayStats::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        // Raw bytes: a line that is not UTF-8 is malformed, not an I/O failure.
        let read = source
            .read_until(b'\n', &mut buf)
            .map_err(|err| CoverageError::LogRead {
                line: line_no + 1,
                source: err,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        let record: LogRecord = match serde_json::from_slice(line) {
            Ok(record) => record,
            Err(e) => {
                debug!(line = line_no, error = %e, "Skipping malformed log line");
                stats.malformed += 1;
                continue;
            }
        };

        let Some(path) = strip_prefix(&record.url, strip_url_prefix) else {
            debug!(line = line_no, url = %record.url, "Unparseable request URL");
            stats.unmatched += 1;
            continue;
        };

        let Some(matched) = matcher.resolve(&record.method, &path) else {
            trace!(method = %record.method, url = %record.url, "No route for request");
            stats.unmatched += 1;
            continue;
        };

        let key = (
            matched.operation_id,
            record.method.to_ascii_uppercase(),
            record.status_code.to_string(),
        );
        match index.get(&key) {
            Some(&i) => {
                endpoints[i].touch();
                stats.touched += 1;
            }
            None => {
                trace!(
                    operation_id = %key.0,
                    method = %key.1,
                    status = record.status_code,
                    "Status code not declared for operation"
                );
                stats.undeclared_status += 1;
            }
        }
    }

    info!(
        lines = stats.lines,
        malformed = stats.malformed,
        unmatched = stats.unmatched,
        undeclared_status = stats.undeclared_status,
        touched = stats.touched,
        "Log replay finished"
    );
    Ok(stats)
}

/// (operation id, method, status code) → position of the first endpoint with that identity.
fn endpoint_index(endpoints: &[Endpoint]) -> HashMap<(String, String, String), usize> {
    let mut index = HashMap::with_capacity(endpoints.len());
    for (i, endpoint) in endpoints.iter().enumerate() {
        index
            .entry((
                endpoint.operation_id.clone(),
                endpoint.method.clone(),
                endpoint.status_code.clone(),
            ))
            .or_insert(i);
    }
    index
}

/// Canonicalize `url` and remove the API mount point from its path.
///
/// The prefix is only removed on a segment boundary, and a URL equal to the
/// prefix becomes `/`.
pub fn strip_prefix(url: &str, prefix: &str) -> Option<String> {
    let path = canonical_path(url)?;
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }

    match path.strip_prefix(prefix) {
        Some("") => Some("/".to_string()),
        Some(rest) if rest.starts_with('/') => Some(rest.to_string()),
        _ => Some(path),
    }
}
