//! Minimal OpenAPI document model.
//!
//! Only the parts coverage needs are modelled: paths, their operations, each
//! operation's `operationId` and response keys. Everything else in the
//! document (schemas, parameters, servers, ...) is ignored.

use apicov_core::contract::{ContractSource, DeclaredOperation};
use apicov_core::error::{CoverageError, Result};
use serde::de::{self, IgnoredAny, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// An OpenAPI (3.x, or Swagger 2.0) document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
    /// `openapi` version (3.x). Kept as a raw value: YAML often leaves it unquoted.
    #[serde(default)]
    pub openapi: Option<serde_json::Value>,

    /// `swagger` version (2.0)
    #[serde(default)]
    pub swagger: Option<serde_json::Value>,

    #[serde(default)]
    pub paths: Option<BTreeMap<String, PathItem>>,
}

/// Operations declared under one path, keyed by method.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,

    /// Response key → response object (contents unused)
    #[serde(default)]
    pub responses: Option<BTreeMap<ResponseCode, IgnoredAny>>,
}

/// A response key: a status code (`200`), a range (`2XX`) or `default`.
///
/// YAML documents commonly write status codes as bare integers, so both
/// integer and string keys are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResponseCode(pub String);

impl<'de> Deserialize<'de> for ResponseCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CodeVisitor;

        impl Visitor<'_> for CodeVisitor {
            type Value = ResponseCode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an HTTP status code, a status range or `default`")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Ok(ResponseCode(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(ResponseCode(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                Ok(ResponseCode(v.to_string()))
            }
        }

        deserializer.deserialize_any(CodeVisitor)
    }
}

impl PathItem {
    /// Declared operations with their upper-case method names.
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("GET", &self.get),
            ("PUT", &self.put),
            ("POST", &self.post),
            ("DELETE", &self.delete),
            ("OPTIONS", &self.options),
            ("HEAD", &self.head),
            ("PATCH", &self.patch),
            ("TRACE", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
        .collect()
    }
}

impl OpenApiDocument {
    pub fn from_yaml_str(data: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }

    pub fn from_json_str(data: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Load a document from disk. `.json` files are read as JSON, anything
    /// else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| CoverageError::ContractRead {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&data).map_err(|e| e.to_string())
        } else {
            Self::from_yaml_str(&data).map_err(|e| e.to_string())
        };
        let doc = parsed.map_err(|message| CoverageError::ContractParse {
            path: path.to_path_buf(),
            message,
        })?;

        let paths = doc.paths.as_ref().map_or(0, BTreeMap::len);
        if paths == 0 {
            warn!(path = %path.display(), "Contract declares no paths");
        }
        info!(path = %path.display(), version = %doc.version(), paths, "Contract loaded");
        Ok(doc)
    }

    /// Declared spec version, e.g. `3.0.3` or `2.0`.
    pub fn version(&self) -> String {
        match self.openapi.as_ref().or(self.swagger.as_ref()) {
            Some(serde_json::Value::String(v)) => v.clone(),
            Some(other) => other.to_string(),
            None => "unknown".to_string(),
        }
    }
}

impl ContractSource for OpenApiDocument {
    fn declared_operations(&self) -> Vec<DeclaredOperation> {
        let Some(paths) = &self.paths else {
            return Vec::new();
        };

        let mut declared = Vec::new();
        for (path, item) in paths {
            for (method, op) in item.operations() {
                let status_codes: Vec<String> = op
                    .responses
                    .iter()
                    .flat_map(|responses| responses.keys())
                    .map(|code| code.0.clone())
                    .collect();
                if status_codes.is_empty() {
                    debug!(path = %path, method, "Operation declares no responses");
                }
                declared.push(DeclaredOperation {
                    path: path.clone(),
                    method: method.to_string(),
                    operation_id: op.operation_id.clone(),
                    status_codes,
                });
            }
        }
        declared
    }
}
