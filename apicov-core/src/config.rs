use crate::error::{CoverageError, Result};
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoverageConfig {
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub output: OutputMode,
}

/// Where the API contract lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractConfig {
    #[serde(default = "default_contract_path")]
    pub path: PathBuf,
}

/// Where the request log lives and how its URLs are mounted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogsConfig {
    #[serde(default = "default_logs_path")]
    pub path: PathBuf,
    /// Removed from each logged URL before matching, e.g. `/api/v1`.
    #[serde(default = "default_strip_url_prefix")]
    pub strip_url_prefix: String,
}

/// What the report prints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Counts, ratio and every endpoint
    #[default]
    Summary,
    /// Counts and ratio only
    Stats,
    /// The bare ratio
    Coverage,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_contract_path() -> PathBuf { PathBuf::from("./openapi.yaml") }
fn default_logs_path() -> PathBuf { PathBuf::from("./logs.ndjson") }
fn default_strip_url_prefix() -> String { "/api/v1".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            path: default_contract_path(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            path: default_logs_path(),
            strip_url_prefix: default_strip_url_prefix(),
        }
    }
}

impl CoverageConfig {
    /// Load configuration from an optional YAML file + env overrides.
    ///
    /// A file that is named but missing is an error. Environment keys use
    /// the `APICOV_` prefix with `__` between sections,
    /// e.g. `APICOV_LOGS__STRIP_URL_PREFIX=/v2`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.is_file() {
                return Err(CoverageError::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("APICOV_").split("__"))
            .extract()
            .map_err(|e| CoverageError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // ── Default values ────────────────────────────────────────────

    #[test]
    fn default_config_has_expected_values() {
        let cfg = CoverageConfig::default();
        assert_eq!(cfg.contract.path, PathBuf::from("./openapi.yaml"));
        assert_eq!(cfg.logs.path, PathBuf::from("./logs.ndjson"));
        assert_eq!(cfg.logs.strip_url_prefix, "/api/v1");
        assert_eq!(cfg.output, OutputMode::Summary);
    }

    // ── OutputMode serde ──────────────────────────────────────────

    #[test]
    fn output_mode_serializes_to_lowercase() {
        assert_eq!(serde_json::to_string(&OutputMode::Stats).unwrap(), "\"stats\"");
        assert_eq!(serde_json::to_string(&OutputMode::Coverage).unwrap(), "\"coverage\"");
        let mode: OutputMode = serde_json::from_str("\"summary\"").unwrap();
        assert_eq!(mode, OutputMode::Summary);
    }

    // ── CoverageConfig::load() ────────────────────────────────────

    #[test]
    fn load_from_valid_yaml_overrides_defaults() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "logs:\n  strip_url_prefix: \"/v2\"\noutput: stats\n").unwrap();
        let cfg = CoverageConfig::load(Some(tmpfile.path())).unwrap();
        assert_eq!(cfg.logs.strip_url_prefix, "/v2");
        assert_eq!(cfg.output, OutputMode::Stats);
        // Defaults still apply for unspecified fields
        assert_eq!(cfg.logs.path, PathBuf::from("./logs.ndjson"));
        assert_eq!(cfg.contract.path, PathBuf::from("./openapi.yaml"));
    }

    #[test]
    fn load_yaml_with_paths() {
        let yaml = r#"
contract:
  path: "/srv/api/openapi.json"
logs:
  path: "/var/log/e2e.ndjson"
"#;
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "{yaml}").unwrap();
        let cfg = CoverageConfig::load(Some(tmpfile.path())).unwrap();
        assert_eq!(cfg.contract.path, PathBuf::from("/srv/api/openapi.json"));
        assert_eq!(cfg.logs.path, PathBuf::from("/var/log/e2e.ndjson"));
        assert_eq!(cfg.logs.strip_url_prefix, "/api/v1");
    }

    #[test]
    fn load_with_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("typo.yaml");
        let err = CoverageConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, CoverageError::Config(_)));
        assert!(err.to_string().contains("typo.yaml"), "{err}");
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let cfg = CoverageConfig::load(None).unwrap();
        assert_eq!(cfg.contract.path, PathBuf::from("./openapi.yaml"));
    }

    #[test]
    fn load_with_invalid_output_mode_is_config_error() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "output: verbose\n").unwrap();
        let err = CoverageConfig::load(Some(tmpfile.path())).unwrap_err();
        assert!(matches!(err, CoverageError::Config(_)));
    }
}
