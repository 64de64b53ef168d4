// src/context/mod.rs

//! Execution context: the catalog of work definitions and the recipe for
//! turning one of them into a worker process.
//!
//! The run manager never inspects a context beyond this trait. Production
//! code uses [`ProjectContext`], built from the `[pipeline.*]` tables of the
//! config file; tests can provide their own implementation.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

use crate::errors::Result;
use crate::types::{RunArgs, RunId};

pub mod project;

pub use project::ProjectContext;

/// Environment variable carrying the run identifier into the worker.
pub const ENV_RUN_ID: &str = "RUNVISOR_RUN_ID";
/// Environment variable carrying the pipeline name into the worker.
pub const ENV_PIPELINE: &str = "RUNVISOR_PIPELINE";
/// Environment variable carrying the comma-joined tags into the worker.
pub const ENV_TAGS: &str = "RUNVISOR_TAGS";

/// Catalog of work definitions plus the `run` operation.
pub trait ExecutionContext: Send + Sync + Debug {
    /// Names of the known work definitions, sorted.
    fn pipeline_names(&self) -> Vec<String>;

    /// Resolve a run request into the process that performs the work.
    fn worker_command(&self, run_id: &RunId, args: &RunArgs) -> Result<WorkerCommand>;

    /// Independent copy of this context, so a run never shares mutable
    /// state with other runs or with the service.
    fn fork(&self) -> Arc<dyn ExecutionContext>;
}

/// Description of a worker process, kept separate from
/// `tokio::process::Command` so it can be inspected and cloned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl WorkerCommand {
    /// Run `cmd` through the platform shell.
    pub fn shell(cmd: &str) -> Self {
        let (program, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        Self {
            program: program.to_string(),
            args: vec![flag.to_string(), cmd.to_string()],
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Build the Tokio command with both output streams piped and stdin closed.
    ///
    /// `kill_on_drop` stays off: dropping the supervisor's handle (e.g. a
    /// client that stops polling) must not terminate the run.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}
