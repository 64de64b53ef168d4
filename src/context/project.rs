// src/context/project.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::model::{DEFAULT_PIPELINE, PipelineConfig};
use crate::config::ConfigFile;
use crate::context::{ENV_PIPELINE, ENV_RUN_ID, ENV_TAGS, ExecutionContext, WorkerCommand};
use crate::errors::{Result, RunvisorError};
use crate::types::{RunArgs, RunId};

/// Execution context backed by the `[pipeline.<name>]` tables of the config.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pipelines: BTreeMap<String, PipelineConfig>,
}

impl ProjectContext {
    pub fn new(pipelines: BTreeMap<String, PipelineConfig>) -> Self {
        Self { pipelines }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.pipeline.clone())
    }

    pub fn pipeline(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines.get(name)
    }
}

impl ExecutionContext for ProjectContext {
    fn pipeline_names(&self) -> Vec<String> {
        // BTreeMap keys are already ordered.
        self.pipelines.keys().cloned().collect()
    }

    fn worker_command(&self, run_id: &RunId, args: &RunArgs) -> Result<WorkerCommand> {
        let name = if args.pipeline.trim().is_empty() {
            DEFAULT_PIPELINE
        } else {
            args.pipeline.as_str()
        };

        let pipeline = self
            .pipelines
            .get(name)
            .ok_or_else(|| RunvisorError::UnknownPipeline(name.to_string()))?;

        let mut command = WorkerCommand::shell(&pipeline.cmd);
        for (key, value) in pipeline.env.iter() {
            command = command.env(key, value);
        }
        command.cwd = pipeline.cwd.clone();

        Ok(command
            .env(ENV_RUN_ID, run_id.as_str())
            .env(ENV_PIPELINE, name)
            .env(ENV_TAGS, args.tags.join(",")))
    }

    fn fork(&self) -> Arc<dyn ExecutionContext> {
        Arc::new(self.clone())
    }
}
