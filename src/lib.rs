// src/lib.rs

pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod server;
pub mod service;
pub mod types;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures_util::StreamExt;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, EndpointArgs, ServeArgs, StartArgs, StatusArgs};
use crate::client::RunvisorClient;
use crate::config::{ConfigFile, load_and_validate};
use crate::context::ProjectContext;
use crate::errors::RunvisorError;
use crate::service::{RunParams, RunStatusResponse};

/// High-level entry point used by `main.rs`.
///
/// `serve` builds its own multi-threaded runtime sized by `max_workers`;
/// the client subcommands run on a small current-thread runtime.
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Serve(serve) => serve_from_args(serve),
        Command::List(endpoint) => block_on(list_pipelines(endpoint)),
        Command::Run(run) => block_on(start_run(run)),
        Command::Status(status) => block_on(stream_status(status)),
    }
}

fn block_on<F>(fut: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(fut)
}

/// Load the config and run the server until Ctrl-C.
///
/// Any failure to obtain the execution context, apply the overrides or bind
/// is surfaced as [`RunvisorError::Startup`].
pub fn serve_from_args(args: ServeArgs) -> Result<()> {
    let mut cfg = load_and_validate(&args.config).map_err(|e| {
        RunvisorError::startup(
            format!("could not load execution context from {}", args.config.display()),
            e,
        )
    })?;
    apply_overrides(&mut cfg, &args)
        .map_err(|e| RunvisorError::startup("invalid command-line override", e))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    info!(
        host = %cfg.server.host,
        port = cfg.server.port,
        max_workers = cfg.server.max_workers,
        pipelines = cfg.pipeline.len(),
        "starting runvisor server"
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cfg.server.max_workers)
        .thread_name("runvisor-rpc")
        .enable_all()
        .build()
        .map_err(|e| RunvisorError::startup("could not build the RPC runtime", e))?;

    let context = Arc::new(ProjectContext::from_config(&cfg));
    rt.block_on(server::serve(&cfg.server, context))?;
    Ok(())
}

fn apply_overrides(cfg: &mut ConfigFile, args: &ServeArgs) -> errors::Result<()> {
    if let Some(ref host) = args.host {
        cfg.server.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(max_workers) = args.max_workers {
        if max_workers == 0 {
            return Err(RunvisorError::ConfigError(
                "--max-workers must be >= 1".to_string(),
            ));
        }
        cfg.server.max_workers = max_workers;
    }
    cfg.server.socket_addr()?;
    Ok(())
}

async fn list_pipelines(args: EndpointArgs) -> Result<()> {
    let client = RunvisorClient::new(args.endpoint);
    for name in client.list_pipelines().await?.names {
        println!("{name}");
    }
    Ok(())
}

async fn start_run(args: StartArgs) -> Result<()> {
    let client = RunvisorClient::new(args.endpoint.endpoint);
    let params = RunParams {
        name: args.name,
        tags: args.tags,
    };
    let summary = client.run(&params).await?;
    println!("{}", summary.success);
    if args.follow {
        follow_status(&client, &summary.run_id).await?;
    } else {
        println!("{}", summary.run_id);
    }
    Ok(())
}

async fn stream_status(args: StatusArgs) -> Result<()> {
    let client = RunvisorClient::new(args.endpoint.endpoint);
    follow_status(&client, &args.run_id).await
}

/// Print events as they arrive. The server sends the cumulative log each
/// time, so only the unseen tail of each message is printed.
async fn follow_status(client: &RunvisorClient, run_id: &str) -> Result<()> {
    let mut stream = client.status_stream(run_id).await?;
    let mut printed = 0usize;
    let mut last: Option<RunStatusResponse> = None;

    while let Some(msg) = stream.next().await {
        let msg = msg?;
        for event in msg.events.iter().skip(printed) {
            println!("{event}");
        }
        printed = printed.max(msg.events.len());
        debug!(run_status = %msg.run_status, "status message received");
        last = Some(msg);
    }

    if let Some(last) = last {
        let exit = if last.exit_code.is_empty() { "-" } else { last.exit_code.as_str() };
        println!("run {}: {} (exit code {}) - {}", last.run_id, last.run_status, exit, last.success);
    }
    Ok(())
}

/// Simple dry-run output: print server settings and pipelines.
fn print_dry_run(cfg: &ConfigFile) {
    println!("runvisor dry-run");
    println!("  server.host = {}", cfg.server.host);
    println!("  server.port = {}", cfg.server.port);
    println!("  server.max_workers = {}", cfg.server.max_workers);
    println!("  server.poll_interval_ms = {}", cfg.server.poll_interval_ms);
    println!();

    println!("pipelines ({}):", cfg.pipeline.len());
    for (name, pipeline) in cfg.pipeline.iter() {
        println!("  - {name}");
        println!("      cmd: {}", pipeline.cmd);
        if let Some(ref description) = pipeline.description {
            println!("      description: {description}");
        }
        if let Some(ref cwd) = pipeline.cwd {
            println!("      cwd: {}", cwd.display());
        }
        if !pipeline.env.is_empty() {
            println!("      env: {:?}", pipeline.env);
        }
    }

    debug!("dry-run complete (no server started)");
}
