// src/manager/traits.rs

use std::fmt::Debug;

use crate::errors::Result;
use crate::types::{RunId, RunSnapshot};

/// Lifecycle of a single run.
///
/// The mechanism is up to the implementation (child process, thread, remote
/// worker); the run service only ever talks to this trait.
pub trait RunManager: Send + Sync + Debug {
    fn run_id(&self) -> &RunId;

    /// Begin executing the work and return immediately.
    ///
    /// Must not wait for the work to finish. Starting twice is an error.
    fn start(&self) -> Result<()>;

    /// Request cancellation.
    ///
    /// Implementations that cannot cancel must return
    /// [`RunvisorError::Unsupported`](crate::errors::RunvisorError::Unsupported)
    /// rather than pretend to succeed.
    fn stop(&self) -> Result<()>;

    /// Non-blocking poll.
    ///
    /// Returns the liveness of the run and the cumulative event log. Two
    /// successive calls return logs where the first is a prefix of the
    /// second.
    fn status(&self) -> RunSnapshot;
}
