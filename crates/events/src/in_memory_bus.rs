//! Process-local bus the workshop publishes order notifications on.

use std::sync::{Mutex, mpsc};

use crate::bus::{EventBus, Subscription};

#[derive(Debug)]
pub enum InMemoryBusError {
    /// The subscriber list lock was poisoned by a panicking thread.
    Poisoned,
}

/// Fans each notification out to every live subscription over `mpsc`
/// channels. A subscription that was dropped is forgotten on the next publish.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriptions still attached to the bus as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, notification: M) -> Result<(), Self::Error> {
        let mut subscribers = self.subscribers.lock().map_err(|_| InMemoryBusError::Poisoned)?;
        subscribers.retain(|tx| tx.send(notification.clone()).is_ok());
        Ok(())
    }

    /// A subscription taken while the lock is poisoned never receives
    /// anything.
    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        Subscription::new(rx)
    }
}
