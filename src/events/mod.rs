// src/events/mod.rs

//! Event plumbing between a worker and its supervisor.
//!
//! - [`channel`] is the FIFO queue carrying text events out of a worker.
//! - [`intercept`] wraps an output stream so that every non-blank line
//!   written to it is also pushed onto that queue.

pub mod channel;
pub mod intercept;

pub use channel::{EventReceiver, EventSender, event_channel};
pub use intercept::InterceptedWriter;
