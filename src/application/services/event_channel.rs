//! Queue of lifecycle events waiting for a consumer.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::warn;

use crate::domain::LifecycleEvent;

/// Bounded FIFO of lifecycle events; each event is delivered at most once.
#[derive(Debug)]
pub struct EventChannel {
    queue: Mutex<VecDeque<LifecycleEvent>>,
    capacity: usize,
    notify: Notify,
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventChannel {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
        }
    }

    /// Appends an event, evicting the oldest one when full.
    pub fn push(&self, event: LifecycleEvent) {
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                if let Some(evicted) = queue.pop_front() {
                    warn!(event = %evicted, "Event channel full, dropping oldest event");
                }
            }
            queue.push_back(event);
        }
        self.notify.notify_one();
    }

    /// Removes and returns the oldest event without blocking.
    #[must_use]
    pub fn consume(&self) -> Option<LifecycleEvent> {
        self.queue.lock().pop_front()
    }

    /// Removes and returns every queued event in order.
    #[must_use]
    pub fn drain(&self) -> Vec<LifecycleEvent> {
        self.queue.lock().drain(..).collect()
    }

    /// Waits for the next event.
    pub async fn next(&self) -> LifecycleEvent {
        loop {
            let notified = self.notify.notified();
            if let Some(event) = self.consume() {
                return event;
            }
            notified.await;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
