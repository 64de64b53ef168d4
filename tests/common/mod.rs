#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use runvisor::context::ProjectContext;
use runvisor::manager::ProcessRunManager;
use runvisor::service::{ProcessManagerFactory, RunService};
use runvisor::types::RunArgs;
use runvisor_test_utils::builders::ConfigFileBuilder;

#[allow(unused_imports)]
pub use runvisor_test_utils::{init_tracing, poll_until_complete, with_timeout};

pub const FAST_POLL: Duration = Duration::from_millis(25);

/// Context with one shell pipeline per `(name, cmd)` pair.
pub fn shell_context(pipelines: &[(&str, &str)]) -> Arc<ProjectContext> {
    let builder = pipelines
        .iter()
        .fold(ConfigFileBuilder::new(), |b, (name, cmd)| b.with_cmd(name, cmd));
    Arc::new(builder.build_context())
}

/// Process-backed manager for a single-pipeline context, output not mirrored.
pub fn quiet_manager(cmd: &str) -> ProcessRunManager {
    ProcessRunManager::new(shell_context(&[("job", cmd)]), RunArgs::new("job", vec![]))
        .mirror_output(false)
}

/// Service over real processes that polls quickly and keeps test output clean.
pub fn fast_service(pipelines: &[(&str, &str)]) -> RunService {
    RunService::new(shell_context(pipelines))
        .with_factory(Arc::new(ProcessManagerFactory {
            mirror_output: false,
        }))
        .with_poll_interval(FAST_POLL)
}
