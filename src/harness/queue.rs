//! Shared pull queue for pooled mode
//!
//! The queue is filled with every item up front and its sender dropped, so
//! workers drain it until it reports empty-and-disconnected. Each `recv`
//! hands an item to exactly one worker.

use crate::discovery::WorkItem;
use crossbeam_channel::{unbounded, Receiver};

/// Closed queue holding a run's items
pub struct ItemQueue {
    receiver: Receiver<WorkItem>,
}

impl ItemQueue {
    /// Create a queue pre-filled with `items`, in order
    pub fn from_items(items: &[WorkItem]) -> Self {
        let (sender, receiver) = unbounded();

        for item in items {
            // The receiver is alive, so send cannot fail
            let _ = sender.send(item.clone());
        }

        Self { receiver }
    }

    /// Get a receiver for this queue (clone for each worker)
    pub fn receiver(&self) -> ItemQueueReceiver {
        ItemQueueReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Items not yet handed out
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Worker-side handle for pulling items
#[derive(Clone)]
pub struct ItemQueueReceiver {
    receiver: Receiver<WorkItem>,
}

impl ItemQueueReceiver {
    /// Take the next item, or `None` once the queue is drained
    pub fn next_item(&self) -> Option<WorkItem> {
        self.receiver.recv().ok()
    }
}
