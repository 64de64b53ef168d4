// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RunvisorError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RunvisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.server, raw.pipeline))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_pipelines(cfg)?;
    validate_server_config(cfg)?;
    validate_pipelines(cfg)?;
    Ok(())
}

fn ensure_has_pipelines(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.is_empty() {
        return Err(RunvisorError::ConfigError(
            "config must contain at least one [pipeline.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_server_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.max_workers == 0 {
        return Err(RunvisorError::ConfigError(
            "[server].max_workers must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.server.poll_interval_ms == 0 {
        return Err(RunvisorError::ConfigError(
            "[server].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    cfg.server.socket_addr()?;
    Ok(())
}

fn validate_pipelines(cfg: &RawConfigFile) -> Result<()> {
    for (name, pipeline) in cfg.pipeline.iter() {
        if name.trim().is_empty() {
            return Err(RunvisorError::ConfigError(
                "pipeline names must not be blank".to_string(),
            ));
        }
        if pipeline.cmd.trim().is_empty() {
            return Err(RunvisorError::ConfigError(format!(
                "pipeline '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}
