use crate::endpoint::Endpoint;
use serde::{Deserialize, Serialize};

/// Coverage over the whole contract, with every endpoint for detailed reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub total_matched: usize,
    pub endpoints: Vec<Endpoint>,
    pub coverage: f64,
}

/// [`Summary`] without the endpoint list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SummaryStats {
    pub total: usize,
    pub total_matched: usize,
    pub coverage: f64,
}

impl Summary {
    pub fn stats(&self) -> SummaryStats {
        SummaryStats {
            total: self.total,
            total_matched: self.total_matched,
            coverage: self.coverage,
        }
    }
}

/// Reduce the replayed endpoint list to counts and a coverage ratio.
pub fn aggregate(endpoints: Vec<Endpoint>) -> Summary {
    let total = endpoints.len();
    let total_matched = endpoints.iter().filter(|e| e.touched).count();

    Summary {
        total,
        total_matched,
        coverage: coverage_ratio(total_matched, total),
        endpoints,
    }
}

/// `matched / total`, or `0.0` for an empty contract.
pub fn coverage_ratio(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}
