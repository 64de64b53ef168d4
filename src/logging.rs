// src/logging.rs

//! Logging setup for `runvisor` using `tracing` + `tracing-subscriber`.
//!
//! Filter priority:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `RUNVISOR_LOG`, either a bare level ("debug") or full directives
//!    ("runvisor::manager=trace,info")
//! 3. default to `info`
//!
//! Logs go to STDERR. Worker output is teed to the server's own stdout and
//! stderr, so keeping logs on one stream makes the two easy to tell apart.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable read when no `--log-level` is given.
pub const LOG_ENV: &str = "RUNVISOR_LOG";

/// HTTP plumbing is chatty at `debug`; keep it at `warn` unless asked.
const QUIET_DEPS: &str = "hyper=warn,hyper_util=warn,h2=warn,reqwest=warn";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// Resolve the filter from the CLI flag and the raw `RUNVISOR_LOG` value.
///
/// An unparsable environment value falls back to the default.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return with_quiet_deps(level_name(lvl));
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => match parse_level_str(raw) {
            Some(level) => with_quiet_deps(level),
            None => EnvFilter::try_new(raw).unwrap_or_else(|_| with_quiet_deps("info")),
        },
        None => with_quiet_deps("info"),
    }
}

fn with_quiet_deps(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},{QUIET_DEPS}"))
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Bare level names, case-insensitive. `warning` is accepted for `warn`.
pub fn parse_level_str(s: &str) -> Option<&'static str> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}
