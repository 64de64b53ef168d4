// src/manager/process.rs

//! Out-of-process run manager.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::context::ExecutionContext;
use crate::errors::{Result, RunvisorError};
use crate::events::{EventReceiver, EventSender, event_channel};
use crate::manager::traits::RunManager;
use crate::manager::worker::WorkerHandle;
use crate::types::{RunArgs, RunId, RunSnapshot, RunStatus};

/// [`RunManager`] backed by a separate OS process.
///
/// - `start` resolves the work through the execution context and hands it
///   to a [`WorkerHandle`]; it never waits for the worker.
/// - `status` drains the event channel into the manager's own log and
///   reports `Pending` while the worker is alive, `Completed` afterwards.
/// - `stop` is not supported.
pub struct ProcessRunManager {
    run_id: RunId,
    context: Arc<dyn ExecutionContext>,
    args: RunArgs,
    mirror_output: bool,
    state: Mutex<ManagerState>,
}

struct ManagerState {
    /// Producer end, parked here until `start` moves it into the worker.
    sender: Option<EventSender>,
    receiver: EventReceiver,
    /// Append-only log of every event drained so far.
    events: Vec<String>,
    worker: Option<WorkerHandle>,
}

impl ProcessRunManager {
    pub fn new(context: Arc<dyn ExecutionContext>, args: RunArgs) -> Self {
        Self::with_run_id(RunId::generate(), context, args)
    }

    pub fn with_run_id(run_id: RunId, context: Arc<dyn ExecutionContext>, args: RunArgs) -> Self {
        let (sender, receiver) = event_channel();
        Self {
            run_id,
            context,
            args,
            mirror_output: true,
            state: Mutex::new(ManagerState {
                sender: Some(sender),
                receiver,
                events: Vec::new(),
                worker: None,
            }),
        }
    }

    /// Whether worker output is also copied to this process's stdout/stderr.
    /// On by default.
    pub fn mirror_output(mut self, mirror: bool) -> Self {
        self.mirror_output = mirror;
        self
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }
}

impl fmt::Debug for ProcessRunManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRunManager")
            .field("run_id", &self.run_id)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl RunManager for ProcessRunManager {
    fn run_id(&self) -> &RunId {
        &self.run_id
    }

    fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        let sender = state
            .sender
            .take()
            .ok_or_else(|| RunvisorError::AlreadyStarted(self.run_id.to_string()))?;

        let command = self.context.worker_command(&self.run_id, &self.args);
        let worker = WorkerHandle::spawn(self.run_id.clone(), command, sender, self.mirror_output)?;
        state.worker = Some(worker);

        info!(
            run_id = %self.run_id,
            pipeline = %self.args.pipeline,
            tags = ?self.args.tags,
            "run started"
        );
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        Err(RunvisorError::Unsupported("stop"))
    }

    fn status(&self) -> RunSnapshot {
        let mut state = self.state.lock();

        // Sample liveness before draining: once the exit is visible, every
        // event of the run is already queued, so a Completed snapshot is
        // never missing its tail.
        let exit = state.worker.as_ref().and_then(|w| w.exit());

        let fresh = state.receiver.drain();
        if !fresh.is_empty() {
            debug!(run_id = %self.run_id, count = fresh.len(), "drained run events");
        }
        state.events.extend(fresh);

        RunSnapshot {
            run_status: if exit.is_some() {
                RunStatus::Completed
            } else {
                RunStatus::Pending
            },
            events: state.events.clone(),
            exit_code: exit.and_then(|e| e.code),
        }
    }
}
