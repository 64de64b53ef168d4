// src/service/mod.rs

//! Transport-independent run service.
//!
//! [`RunService`] implements the three RPC operations (list pipelines,
//! start a run, stream a run's status) on top of the execution context, the
//! run managers and the registry. The HTTP layer in [`crate::server`] only
//! translates requests and responses.

pub mod messages;
pub mod run_service;

pub use messages::{PipelineSummary, RunIdRequest, RunParams, RunStatusResponse, RunSummary};
pub use run_service::{ManagerFactory, ProcessManagerFactory, RunService};
