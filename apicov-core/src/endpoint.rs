use serde::{Deserialize, Serialize};

/// One declared unit of API surface: a path template, a method and a single
/// documented response status, bound to the operation that declares it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoint {
    /// Path template, e.g. `/users/{id}`
    pub path: String,

    /// Upper-case HTTP verb
    pub method: String,

    /// Declared response code as written in the contract (`200`, `default`, `4XX`)
    pub status_code: String,

    /// Contract-level operation identifier
    pub operation_id: String,

    /// Set once at least one log record resolved to this endpoint
    #[serde(default)]
    pub touched: bool,
}

impl Endpoint {
    pub fn new(path: &str, method: &str, status_code: &str, operation_id: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_ascii_uppercase(),
            status_code: status_code.to_string(),
            operation_id: operation_id.to_string(),
            touched: false,
        }
    }

    /// Mark as covered. Idempotent.
    #[inline]
    pub fn touch(&mut self) {
        self.touched = true;
    }
}

/// A single observed request/response pair from the newline-delimited log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogRecord {
    pub method: String,
    pub url: String,
    pub status_code: u16,
}
