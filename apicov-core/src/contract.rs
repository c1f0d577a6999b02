use crate::endpoint::Endpoint;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, warn};

/// One operation as declared by an API contract, independent of the
/// document format it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredOperation {
    /// Path template, e.g. `/users/{id}`
    pub path: String,

    /// HTTP verb, any case
    pub method: String,

    /// Contract-level identifier. `None` when the contract omits it.
    pub operation_id: Option<String>,

    /// Documented response codes
    pub status_codes: Vec<String>,
}

/// Anything that can describe paths → methods → {status codes, operation id}.
///
/// Implementors may return operations in any order; extraction sorts them.
pub trait ContractSource {
    fn declared_operations(&self) -> Vec<DeclaredOperation>;
}

impl ContractSource for Vec<DeclaredOperation> {
    fn declared_operations(&self) -> Vec<DeclaredOperation> {
        self.clone()
    }
}

/// Flatten a contract into one [`Endpoint`] per (path, method, status code).
///
/// Output is ordered by path, then method, then status code. Operations
/// without an operation id are skipped, so a malformed contract produces a
/// partial (possibly empty) list.
pub fn extract_endpoints<C: ContractSource + ?Sized>(contract: &C) -> Vec<Endpoint> {
    // (path, method, status) → operation id of the first declaration.
    let mut triples: BTreeMap<(String, String, String), String> = BTreeMap::new();

    for op in contract.declared_operations() {
        let method = op.method.to_ascii_uppercase();
        let Some(operation_id) = op.operation_id.filter(|id| !id.is_empty()) else {
            warn!(path = %op.path, method = %method, "Operation has no operationId, skipping");
            continue;
        };

        for status_code in op.status_codes {
            match triples.entry((op.path.clone(), method.clone(), status_code)) {
                Entry::Vacant(slot) => {
                    slot.insert(operation_id.clone());
                }
                Entry::Occupied(slot) if slot.get() != &operation_id => {
                    let (path, method, status) = slot.key();
                    warn!(
                        path = %path,
                        method = %method,
                        status = %status,
                        kept = %slot.get(),
                        dropped = %operation_id,
                        "Duplicate declaration, keeping first"
                    );
                }
                Entry::Occupied(_) => {}
            }
        }
    }

    let endpoints: Vec<Endpoint> = triples
        .into_iter()
        .map(|((path, method, status_code), operation_id)| {
            Endpoint::new(&path, &method, &status_code, &operation_id)
        })
        .collect();

    debug!(endpoints = endpoints.len(), "Endpoints extracted");
    endpoints
}
