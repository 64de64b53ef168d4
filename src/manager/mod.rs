// src/manager/mod.rs

//! Run managers.
//!
//! A run manager owns exactly one run: it starts the worker, answers
//! non-blocking status polls and is the unit stored in the
//! [`RunRegistry`](crate::registry::RunRegistry).
//!
//! - [`traits`] defines the [`RunManager`] contract.
//! - [`process`] is the out-of-process implementation used in production.
//! - [`worker`] holds the supervising task that runs a worker process and
//!   tees its output into the event channel.

pub mod process;
pub mod traits;
pub mod worker;

pub use process::ProcessRunManager;
pub use traits::RunManager;
pub use worker::{WorkerExit, WorkerHandle};
