// src/registry.rs

//! Directory of runs by identifier.
//!
//! The registry is the only state shared between request handlers: every
//! `Run` call inserts, every `Status` call reads. Entries are never removed,
//! so memory grows with the number of runs for the life of the process.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::errors::{Result, RunvisorError};
use crate::manager::RunManager;
use crate::types::RunId;

#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<RunId, Arc<dyn RunManager>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manager under its own run id.
    pub fn insert(&self, manager: Arc<dyn RunManager>) -> Result<()> {
        let run_id = manager.run_id().clone();
        let mut runs = self.runs.write();
        if runs.contains_key(&run_id) {
            return Err(RunvisorError::DuplicateRun(run_id.to_string()));
        }
        debug!(run_id = %run_id, total = runs.len() + 1, "run registered");
        runs.insert(run_id, manager);
        Ok(())
    }

    /// Look a run up. The returned `Arc` is independent of the registry
    /// lock, so callers may hold it across awaits.
    pub fn get(&self, run_id: &RunId) -> Option<Arc<dyn RunManager>> {
        self.runs.read().get(run_id).cloned()
    }

    pub fn contains(&self, run_id: &RunId) -> bool {
        self.runs.read().contains_key(run_id)
    }

    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    /// All known run ids, sorted.
    pub fn run_ids(&self) -> Vec<RunId> {
        let mut ids: Vec<RunId> = self.runs.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}
