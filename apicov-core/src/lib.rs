pub mod config;
pub mod contract;
pub mod endpoint;
pub mod error;
pub mod replay;
pub mod router;
pub mod summary;

pub use config::CoverageConfig;
pub use contract::{ContractSource, DeclaredOperation, extract_endpoints};
pub use endpoint::{Endpoint, LogRecord};
pub use error::{CoverageError, Result};
pub use replay::{ReplayStats, replay};
pub use router::{RequestMatcher, RouteMatch};
pub use summary::{Summary, SummaryStats, aggregate};

use std::io::BufRead;

/// Run the whole pipeline: extract, build the matcher, replay the log, aggregate.
pub fn coverage<C, R>(
    contract: &C,
    logs: R,
    strip_url_prefix: &str,
) -> Result<(Summary, ReplayStats)>
where
    C: ContractSource + ?Sized,
    R: BufRead,
{
    let mut endpoints = extract_endpoints(contract);
    let matcher = RequestMatcher::build(&endpoints);
    let stats = replay(logs, &matcher, &mut endpoints, strip_url_prefix)?;
    Ok((aggregate(endpoints), stats))
}
