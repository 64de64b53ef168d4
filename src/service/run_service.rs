// src/service/run_service.rs

use std::sync::Arc;
use std::time::Duration;

use futures_util::Stream;
use futures_util::stream;
use tracing::{debug, error, info};

use crate::context::ExecutionContext;
use crate::errors::Result;
use crate::manager::{ProcessRunManager, RunManager};
use crate::registry::RunRegistry;
use crate::service::messages::{
    PipelineSummary, RunIdRequest, RunParams, RunStatusResponse, RunSummary,
};
use crate::types::{RunArgs, RunId};

/// Default delay between two polls of a run in a status stream.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Builds the manager for a new run.
///
/// The service never names a concrete manager type; swapping process
/// workers for another mechanism only means passing a different factory.
pub trait ManagerFactory: Send + Sync {
    fn create(&self, context: Arc<dyn ExecutionContext>, args: RunArgs) -> Arc<dyn RunManager>;
}

impl<F> ManagerFactory for F
where
    F: Fn(Arc<dyn ExecutionContext>, RunArgs) -> Arc<dyn RunManager> + Send + Sync,
{
    fn create(&self, context: Arc<dyn ExecutionContext>, args: RunArgs) -> Arc<dyn RunManager> {
        self(context, args)
    }
}

/// Factory producing [`ProcessRunManager`]s.
#[derive(Debug, Clone, Copy)]
pub struct ProcessManagerFactory {
    pub mirror_output: bool,
}

impl Default for ProcessManagerFactory {
    fn default() -> Self {
        Self { mirror_output: true }
    }
}

impl ManagerFactory for ProcessManagerFactory {
    fn create(&self, context: Arc<dyn ExecutionContext>, args: RunArgs) -> Arc<dyn RunManager> {
        Arc::new(ProcessRunManager::new(context, args).mirror_output(self.mirror_output))
    }
}

/// The three RPC operations.
///
/// Cheap to clone: everything is behind `Arc`, and clones share one
/// registry.
#[derive(Clone)]
pub struct RunService {
    context: Arc<dyn ExecutionContext>,
    registry: Arc<RunRegistry>,
    factory: Arc<dyn ManagerFactory>,
    poll_interval: Duration,
}

impl RunService {
    pub fn new(context: Arc<dyn ExecutionContext>) -> Self {
        Self {
            context,
            registry: Arc::new(RunRegistry::new()),
            factory: Arc::new(ProcessManagerFactory::default()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_registry(mut self, registry: Arc<RunRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn ManagerFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// `ListPipelines`.
    pub fn list_pipelines(&self) -> PipelineSummary {
        PipelineSummary {
            names: self.context.pipeline_names(),
        }
    }

    /// `Run`: register and start a new run, returning without waiting for it.
    ///
    /// The manager is inserted into the registry *before* it starts, so a
    /// status request issued right after this returns always finds it.
    pub fn run(&self, params: RunParams) -> Result<RunSummary> {
        let args = RunArgs::new(params.name, params.tags);
        let manager = self.factory.create(self.context.fork(), args);
        let run_id = manager.run_id().clone();

        self.registry.insert(Arc::clone(&manager))?;

        if let Err(err) = manager.start() {
            error!(run_id = %run_id, error = %err, "failed to start run");
            return Err(err);
        }

        info!(run_id = %run_id, "run dispatched");
        Ok(RunSummary::dispatched(&run_id))
    }

    /// `Status`: stream the state of a run until it completes.
    ///
    /// - Unknown id: exactly one `Error` message, no polling.
    /// - Known id: one message per poll, the last one `Completed`. The first
    ///   poll is immediate; later polls wait `poll_interval`. Nothing is
    ///   locked while waiting.
    ///
    /// Dropping the stream stops polling but leaves the run alone.
    pub fn status(
        &self,
        request: RunIdRequest,
    ) -> impl Stream<Item = RunStatusResponse> + Send + 'static + use<> {
        let run_id = RunId::from(request.run_id);
        let initial = match self.registry.get(&run_id) {
            Some(manager) => StreamState::Polling {
                manager,
                first: true,
            },
            None => StreamState::NotFound(run_id),
        };
        let interval = self.poll_interval;

        stream::unfold(initial, move |state| async move {
            match state {
                StreamState::NotFound(run_id) => {
                    debug!(run_id = %run_id, "status requested for unknown run");
                    Some((RunStatusResponse::not_found(run_id.as_str()), StreamState::Done))
                }
                StreamState::Polling { manager, first } => {
                    if !first {
                        tokio::time::sleep(interval).await;
                    }
                    let snapshot = manager.status();
                    let terminal = snapshot.run_status.is_terminal();
                    let response = RunStatusResponse::from_snapshot(manager.run_id(), snapshot);
                    let next = if terminal {
                        debug!(run_id = %manager.run_id(), "status stream reached terminal state");
                        StreamState::Done
                    } else {
                        StreamState::Polling {
                            manager,
                            first: false,
                        }
                    };
                    Some((response, next))
                }
                StreamState::Done => None,
            }
        })
    }
}

enum StreamState {
    NotFound(RunId),
    Polling {
        manager: Arc<dyn RunManager>,
        first: bool,
    },
    Done,
}
