// src/types.rs

//! Small value types shared by the manager, registry and service layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the event pushed before the work starts.
pub const STARTING_RUN: &str = "Starting run";
/// Name of the event pushed once the worker is gone.
pub const COMPLETED_RUN: &str = "Completed run";

/// Opaque, collision-resistant run identifier (UUID v4 in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Allocate a fresh random identifier.
    pub fn generate() -> Self {
        RunId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        RunId(s)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        RunId(s.to_string())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Liveness of a run as seen by its manager.
///
/// `Pending` may repeat any number of times; `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Completed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "Pending",
            RunStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments a run is started with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub pipeline: String,
    pub tags: Vec<String>,
}

impl RunArgs {
    pub fn new(pipeline: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            tags,
        }
    }
}

/// Point-in-time view returned by `RunManager::status`.
///
/// `events` is the *cumulative* log, not the increment since the last call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    pub run_status: RunStatus,
    pub events: Vec<String>,
    /// Process exit code; the negated signal number when the worker was
    /// killed by a signal; `None` while pending or if the worker never ran.
    pub exit_code: Option<i32>,
}

impl RunSnapshot {
    pub fn succeeded(&self) -> bool {
        self.run_status.is_terminal() && self.exit_code == Some(0)
    }
}
