// src/config/model.rs

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Result, RunvisorError};

/// Default pipeline name used when a run request carries no name.
pub const DEFAULT_PIPELINE: &str = "__default__";

/// Top-level config file as deserialized, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineConfig>,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind; 0 picks an ephemeral port.
    pub port: u16,
    /// Worker threads for the runtime hosting RPC handlers.
    pub max_workers: usize,
    /// Delay between two polls of a run inside a status stream.
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            max_workers: 10,
            poll_interval_ms: 1000,
        }
    }
}

impl ServerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resolve `host:port` into a socket address.
    ///
    /// `[::]` style bracketed hosts are accepted as well as bare addresses.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let ip: IpAddr = match host {
            "localhost" => IpAddr::from([127, 0, 0, 1]),
            other => other.parse().map_err(|e| {
                RunvisorError::ConfigError(format!("invalid [server].host '{}': {}", self.host, e))
            })?,
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// `[pipeline.<name>]` section: one work definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    /// Shell command executed by the worker process.
    pub cmd: String,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl PipelineConfig {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: None,
            env: BTreeMap::new(),
            description: None,
        }
    }
}

/// Validated configuration. Only constructible through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub pipeline: BTreeMap<String, PipelineConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        server: ServerConfig,
        pipeline: BTreeMap<String, PipelineConfig>,
    ) -> Self {
        Self { server, pipeline }
    }
}
