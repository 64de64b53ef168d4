use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use runvisor::context::ExecutionContext;
use runvisor::errors::{Result, RunvisorError};
use runvisor::manager::RunManager;
use runvisor::service::ManagerFactory;
use runvisor::types::{RunArgs, RunId, RunSnapshot, RunStatus};

/// A run manager that needs no worker at all.
///
/// Each `status()` call after `start()` appends the next scripted batch of
/// events. Once the script is exhausted the run reports `Completed` with
/// the configured exit code.
#[derive(Debug)]
pub struct ScriptedRunManager {
    run_id: RunId,
    args: RunArgs,
    exit_code: Option<i32>,
    started: AtomicBool,
    polls: AtomicUsize,
    script: Mutex<VecDeque<Vec<String>>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedRunManager {
    pub fn new(script: Vec<Vec<&str>>, exit_code: Option<i32>) -> Self {
        Self::with_args(RunArgs::default(), script, exit_code)
    }

    pub fn with_args(args: RunArgs, script: Vec<Vec<&str>>, exit_code: Option<i32>) -> Self {
        Self {
            run_id: RunId::generate(),
            args,
            exit_code,
            started: AtomicBool::new(false),
            polls: AtomicUsize::new(0),
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|batch| batch.into_iter().map(str::to_string).collect())
                    .collect(),
            ),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl RunManager for ScriptedRunManager {
    fn run_id(&self) -> &RunId {
        &self.run_id
    }

    fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RunvisorError::AlreadyStarted(self.run_id.to_string()));
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        Err(RunvisorError::Unsupported("stop"))
    }

    fn status(&self) -> RunSnapshot {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut log = self.log.lock();

        if !self.is_started() {
            return RunSnapshot {
                run_status: RunStatus::Pending,
                events: log.clone(),
                exit_code: None,
            };
        }

        let mut script = self.script.lock();
        if let Some(batch) = script.pop_front() {
            log.extend(batch);
        }
        let done = script.is_empty();

        RunSnapshot {
            run_status: if done { RunStatus::Completed } else { RunStatus::Pending },
            events: log.clone(),
            exit_code: if done { self.exit_code } else { None },
        }
    }
}

/// Factory handing out scripted managers and remembering each one, so a
/// test can inspect the managers the service created.
#[derive(Debug, Clone)]
pub struct ScriptedFactory {
    script: Vec<Vec<String>>,
    exit_code: Option<i32>,
    created: Arc<Mutex<Vec<Arc<ScriptedRunManager>>>>,
}

impl ScriptedFactory {
    pub fn new(script: Vec<Vec<&str>>, exit_code: Option<i32>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|batch| batch.into_iter().map(str::to_string).collect())
                .collect(),
            exit_code,
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn created(&self) -> Vec<Arc<ScriptedRunManager>> {
        self.created.lock().clone()
    }
}

impl ManagerFactory for ScriptedFactory {
    fn create(&self, _context: Arc<dyn ExecutionContext>, args: RunArgs) -> Arc<dyn RunManager> {
        let script = self
            .script
            .iter()
            .map(|batch| batch.iter().map(String::as_str).collect())
            .collect();
        let manager = Arc::new(ScriptedRunManager::with_args(args, script, self.exit_code));
        self.created.lock().push(Arc::clone(&manager));
        manager
    }
}
