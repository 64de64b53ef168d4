#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use runvisor::config::{ConfigFile, PipelineConfig, RawConfigFile, ServerConfig};
use runvisor::context::ProjectContext;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                server: ServerConfig::default(),
                pipeline: BTreeMap::new(),
            },
        }
    }

    pub fn with_pipeline(mut self, name: &str, pipeline: PipelineConfig) -> Self {
        self.config.pipeline.insert(name.to_string(), pipeline);
        self
    }

    /// Shorthand for a pipeline that is just a shell command.
    pub fn with_cmd(self, name: &str, cmd: &str) -> Self {
        self.with_pipeline(name, PipelineConfigBuilder::new(cmd).build())
    }

    /// Loopback, ephemeral port, fast polling: what most tests want.
    pub fn for_tests(mut self) -> Self {
        self.config.server.host = "127.0.0.1".to_string();
        self.config.server.port = 0;
        self.config.server.max_workers = 2;
        self.config.server.poll_interval_ms = 25;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.server.poll_interval_ms = ms;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn build_context(self) -> ProjectContext {
        ProjectContext::from_config(&self.build())
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PipelineConfig`.
pub struct PipelineConfigBuilder {
    pipeline: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            pipeline: PipelineConfig::new(cmd),
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.pipeline.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pipeline.cwd = Some(dir.into());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.pipeline.description = Some(text.to_string());
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.pipeline
    }
}
