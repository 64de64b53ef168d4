// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::client::DEFAULT_ENDPOINT;

/// Command-line arguments for `runvisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runvisor",
    version,
    about = "Launch pipeline runs in worker processes and stream their status.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the run server.
    Serve(ServeArgs),
    /// List the pipelines a server knows about.
    List(EndpointArgs),
    /// Start a run on a server.
    Run(StartArgs),
    /// Stream the status of a run until it completes.
    Status(StatusArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Runvisor.toml")]
    pub config: PathBuf,

    /// Interface to bind; overrides `[server].host`.
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port to bind; overrides `[server].port`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Worker threads handling RPCs; overrides `[server].max_workers`.
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Parse + validate, print the pipelines, but don't serve.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct EndpointArgs {
    /// Base URL of the server.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Debug, Clone, Args)]
pub struct StartArgs {
    /// Pipeline to run; empty means `__default__`.
    #[arg(default_value = "")]
    pub name: String,

    /// Tag passed to the worker; repeatable.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Keep streaming the run's status after starting it.
    #[arg(long)]
    pub follow: bool,

    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    pub run_id: String,

    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
