// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  apicov: API test coverage from recorded traffic
//
//  Input:   OpenAPI contract (YAML/JSON) + NDJSON request log
//  Output:  summary / stats JSON, or the bare coverage ratio, on stdout
//  Logs:    tracing on stderr
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use apicov_core::config::{CoverageConfig, OutputMode};
use apicov_core::error::CoverageError;
use apicov_core::summary::Summary;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "apicov",
    version,
    about = "API test coverage from an OpenAPI contract and request logs"
)]
struct Cli {
    /// Optional YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the OpenAPI document
    #[arg(long)]
    openapi: Option<PathBuf>,

    /// Path to the newline-delimited request log
    #[arg(long)]
    logs: Option<PathBuf>,

    /// URL prefix to remove from logged URLs before matching
    #[arg(long)]
    url_prefix: Option<String>,

    /// Print only the coverage ratio
    #[arg(long)]
    coverage: bool,

    /// Print counts and ratio without endpoint data
    #[arg(long)]
    stats: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    /// Explicit flags win over the config file and environment.
    fn apply(&self, config: &mut CoverageConfig) {
        if let Some(path) = &self.openapi {
            config.contract.path = path.clone();
        }
        if let Some(path) = &self.logs {
            config.logs.path = path.clone();
        }
        if let Some(prefix) = &self.url_prefix {
            config.logs.strip_url_prefix = prefix.clone();
        }
        if self.coverage {
            config.output = OutputMode::Coverage;
        } else if self.stats {
            config.output = OutputMode::Stats;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing (stderr: stdout carries the report) ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // ── Config ──
    let mut config = CoverageConfig::load(cli.config.as_deref()).map_err(describe)?;
    cli.apply(&mut config);
    debug!(?config, "Effective configuration");

    // ── Coverage ──
    let (summary, stats) = apicov_store::coverage_from_files(
        &config.contract.path,
        &config.logs.path,
        &config.logs.strip_url_prefix,
    )
    .map_err(describe)?;

    info!(
        total = summary.total,
        total_matched = summary.total_matched,
        coverage = summary.coverage,
        skipped = stats.malformed + stats.unmatched + stats.undeclared_status,
        "Coverage computed"
    );

    println!("{}", render(&summary, config.output)?);
    Ok(())
}

/// Name the failing input ahead of the underlying cause.
fn describe(err: CoverageError) -> anyhow::Error {
    let input = err.input();
    anyhow::Error::new(err).context(format!("Invalid {input} input"))
}

fn render(summary: &Summary, mode: OutputMode) -> anyhow::Result<String> {
    Ok(match mode {
        OutputMode::Coverage => summary.coverage.to_string(),
        OutputMode::Stats => serde_json::to_string(&summary.stats())?,
        OutputMode::Summary => serde_json::to_string(summary)?,
    })
}
