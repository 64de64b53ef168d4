// src/events/channel.rs

//! Unbounded FIFO carrying text events from a worker to its supervisor.
//!
//! Any number of producers (one per intercepted stream, plus the worker's
//! lifecycle markers) may hold an [`EventSender`]; exactly one
//! [`EventReceiver`] consumes. Order is FIFO per producer and arrival order
//! across producers.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Create a connected sender/receiver pair.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producing end. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<String>,
}

impl EventSender {
    /// Enqueue one event. Returns `false` if the receiver is gone, in which
    /// case the event is dropped; a worker never fails because nobody is
    /// listening any more.
    pub fn send(&self, event: impl Into<String>) -> bool {
        self.tx.send(event.into()).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consuming end, owned by exactly one run manager.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl EventReceiver {
    /// Take every event that has arrived so far, without waiting.
    pub fn drain(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Wait for the next event; `None` once every sender is dropped and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
