// # apihub-health - Service Health Runner
//
// Thin command-line layer over `apihub-core`: it registers the built-in
// services, probes them concurrently and reports the outcome. All client,
// retry and isolation logic lives in the library.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `APIHUB_SERVICES`: Comma-separated subset of services to probe (default: all).
//   `claude` is accepted for `anthropic`.
// - `APIHUB_PROBE_CONCURRENCY`: Maximum probes in flight, 1..=64 (default: 8)
// - `APIHUB_OUTPUT`: `text` or `json` (default: text)
// - `APIHUB_REPORT_PATH`: Also write the JSON report to this file
// - `APIHUB_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// Credentials are read by each service (`GITHUB_TOKEN`, `VERCEL_TOKEN`, ...).
//
// ## Example
//
// ```bash
// export GITHUB_TOKEN=ghp_...
// export APIHUB_SERVICES=github,anthropic
// apihub-health
// ```
//
// ## Exit codes
//
// - 0: every probed service is healthy
// - 1: at least one service is unhealthy
// - 2: configuration error
// - 3: runtime error

mod report;

use anyhow::{Context, Result};
use apihub_core::{RegistryConfig, ServiceRegistry};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use report::HealthReport;

/// Exit codes for different outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HealthExitCode {
    /// All probed services healthy
    Healthy = 0,
    /// At least one service unhealthy
    Degraded = 1,
    /// Configuration error or startup failure
    ConfigError = 2,
    /// Runtime error (unexpected failure)
    RuntimeError = 3,
}

impl From<HealthExitCode> for ExitCode {
    fn from(code: HealthExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// How the report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

/// Runner configuration
#[derive(Debug)]
struct Config {
    services: Option<Vec<String>>,
    probe_concurrency: usize,
    output: OutputFormat,
    report_path: Option<PathBuf>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let services = lookup("APIHUB_SERVICES").map(|raw| {
            let mut names: Vec<String> = Vec::new();
            for name in raw.split(',').map(|s| s.trim().to_lowercase()) {
                if name.is_empty() {
                    continue;
                }
                let name = apihub_services::canonical_name(&name).to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            names
        });

        let probe_concurrency = match lookup("APIHUB_PROBE_CONCURRENCY") {
            Some(raw) => raw.trim().parse().with_context(|| {
                format!("APIHUB_PROBE_CONCURRENCY must be a number. Got: '{}'", raw)
            })?,
            None => RegistryConfig::default().probe_concurrency,
        };

        let output = match lookup("APIHUB_OUTPUT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => OutputFormat::Text,
            Some("json") => OutputFormat::Json,
            Some(other) => anyhow::bail!(
                "APIHUB_OUTPUT '{}' is not supported. Supported formats: text, json",
                other
            ),
        };

        Ok(Self {
            services,
            probe_concurrency,
            output,
            report_path: lookup("APIHUB_REPORT_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            log_level: lookup("APIHUB_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if let Some(services) = &self.services {
            if services.is_empty() {
                anyhow::bail!(
                    "APIHUB_SERVICES is set but names no services. \
                    Unset it to probe every service."
                );
            }

            for name in services {
                if !apihub_services::SERVICE_NAMES.contains(&name.as_str()) {
                    anyhow::bail!(
                        "APIHUB_SERVICES names unknown service '{}'. Known services: {}",
                        name,
                        apihub_services::SERVICE_NAMES.join(", ")
                    );
                }
            }
        }

        if !(1..=64).contains(&self.probe_concurrency) {
            anyhow::bail!(
                "APIHUB_PROBE_CONCURRENCY must be between 1 and 64. Got: {}",
                self.probe_concurrency
            );
        }

        if let Some(path) = &self.report_path
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "APIHUB_REPORT_PATH parent directory does not exist: {}",
                parent.display()
            );
        }

        parse_level(&self.log_level)?;

        Ok(())
    }
}

fn parse_level(raw: &str) -> Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "APIHUB_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return HealthExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return HealthExitCode::ConfigError.into();
    }

    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    // Logs go to stderr so stdout carries only the report
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HealthExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HealthExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run(&config).await {
            Ok(report) if report.is_healthy() => HealthExitCode::Healthy,
            Ok(_) => HealthExitCode::Degraded,
            Err(e) => {
                error!("Health check failed: {:#}", e);
                HealthExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Probe the selected services and emit the report
async fn run(config: &Config) -> Result<HealthReport> {
    let registry = ServiceRegistry::with_config(RegistryConfig {
        probe_concurrency: config.probe_concurrency,
    })?;
    apihub_services::register(&registry);

    let names = config.services.clone().unwrap_or_else(|| registry.list());
    info!("Probing {} service(s): {}", names.len(), names.join(", "));

    let report = HealthReport::new(registry.health_check(&names).await);
    info!(
        "Sweep finished: {}/{} healthy",
        report.healthy_count, report.total_checks
    );

    match config.output {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if let Some(path) = &config.report_path {
        tokio::fs::write(path, report.to_json()?)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(report)
}
