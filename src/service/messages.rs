// src/service/messages.rs

//! Request/response messages of the RPC surface.

use serde::{Deserialize, Serialize};

use crate::types::{RunId, RunSnapshot, RunStatus};

/// `run_status` of the single message sent for an unknown run id.
pub const STATUS_ERROR: &str = "Error";
/// `success` of the single message sent for an unknown run id.
pub const RUN_NOT_FOUND: &str = "Run ID doesn't exist";
/// `success` of every message describing a known run.
pub const STATUS_CHECKED: &str = "Status check was performed successfully";

/// Response of `ListPipelines`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub names: Vec<String>,
}

/// Request of `Run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RunParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Response of `Run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub success: String,
}

impl RunSummary {
    pub fn dispatched(run_id: &RunId) -> Self {
        Self {
            run_id: run_id.to_string(),
            success: format!("Run {run_id} dispatched"),
        }
    }
}

/// Request of `Status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdRequest {
    pub run_id: String,
}

/// One message of the `Status` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatusResponse {
    pub run_id: String,
    pub run_status: String,
    pub exit_code: String,
    pub events: Vec<String>,
    pub success: String,
}

impl RunStatusResponse {
    pub fn not_found(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            run_status: STATUS_ERROR.to_string(),
            exit_code: String::new(),
            events: Vec::new(),
            success: RUN_NOT_FOUND.to_string(),
        }
    }

    pub fn from_snapshot(run_id: &RunId, snapshot: RunSnapshot) -> Self {
        Self {
            run_id: run_id.to_string(),
            run_status: snapshot.run_status.to_string(),
            exit_code: snapshot.exit_code.map(|c| c.to_string()).unwrap_or_default(),
            events: snapshot.events,
            success: STATUS_CHECKED.to_string(),
        }
    }

    /// Whether this message ends a status stream.
    pub fn is_terminal(&self) -> bool {
        self.run_status == RunStatus::Completed.as_str() || self.run_status == STATUS_ERROR
    }
}
