//! Trigger channel between the timer task and the sampling worker thread
//!
//! Behaves like a counting semaphore: the timer posts, the worker waits and
//! consumes one trigger per sampling cycle. The channel is unbounded so a
//! post never blocks and never drops; triggers that arrive while a cycle is
//! still running queue up and are handed out in FIFO order.

use async_channel::{Receiver, Sender, unbounded};
use tracing::trace;

/// One "collect now" signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// Position of this trigger in the posting order, starting at 0
    pub sequence: u64,
}

/// Posting side, owned by the timer (async)
pub struct TriggerSender {
    tx: Sender<Trigger>,
    next_sequence: u64,
}

impl TriggerSender {
    /// Post a trigger
    ///
    /// Fails only when the worker side has gone away.
    pub async fn post(&mut self) -> crate::Result<Trigger> {
        let trigger = self.next_trigger();
        self.tx
            .send(trigger)
            .await
            .map_err(|e| crate::Error::Channel(e.to_string()))?;
        self.next_sequence += 1;
        trace!("Posted trigger {} (backlog {})", trigger.sequence, self.tx.len());
        Ok(trigger)
    }

    /// Post a trigger from a non-async context
    pub fn post_blocking(&mut self) -> crate::Result<Trigger> {
        let trigger = self.next_trigger();
        self.tx
            .send_blocking(trigger)
            .map_err(|e| crate::Error::Channel(e.to_string()))?;
        self.next_sequence += 1;
        trace!("Posted trigger {} (backlog {})", trigger.sequence, self.tx.len());
        Ok(trigger)
    }

    /// Number of triggers successfully posted so far
    pub fn posted(&self) -> u64 {
        self.next_sequence
    }

    /// Number of triggers posted but not yet taken by the worker
    pub fn backlog(&self) -> usize {
        self.tx.len()
    }

    /// Whether the worker side has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn next_trigger(&self) -> Trigger {
        Trigger {
            sequence: self.next_sequence,
        }
    }
}

/// Waiting side, owned by the sampling worker (blocking)
pub struct TriggerReceiver {
    rx: Receiver<Trigger>,
}

impl TriggerReceiver {
    /// Block until a trigger is available
    ///
    /// Queued triggers are still delivered after the sender is dropped; an
    /// error is returned only once the queue is empty and the sender is gone.
    pub fn wait(&self) -> crate::Result<Trigger> {
        let trigger = self
            .rx
            .recv_blocking()
            .map_err(|e| crate::Error::Channel(e.to_string()))?;
        trace!("Took trigger {} ({} queued)", trigger.sequence, self.rx.len());
        Ok(trigger)
    }

    /// Take a trigger without blocking
    pub fn try_wait(&self) -> Option<Trigger> {
        self.rx.try_recv().ok()
    }

    /// Wait for a trigger from an async context
    pub async fn recv(&self) -> crate::Result<Trigger> {
        self.rx
            .recv()
            .await
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Number of triggers waiting to be processed
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Create the trigger channel
///
/// Returns (TriggerSender for the timer, TriggerReceiver for the worker)
pub fn create_trigger_channel() -> (TriggerSender, TriggerReceiver) {
    let (tx, rx) = unbounded();

    (
        TriggerSender {
            tx,
            next_sequence: 0,
        },
        TriggerReceiver { rx },
    )
}
