//! Subscription hub - registry of live subscribers and tick fan-out.
//!
//! Every produced sample is offered to every registered subscriber; each
//! subscriber filters on its own channel set. Broadcasts iterate over a
//! snapshot of the registry taken once per tick, so registrations and
//! removals that race with a broadcast never corrupt it, and a subscriber
//! registered mid-tick receives either the whole tick or none of it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::subscriber::{Delivery, Subscriber, SubscriptionHandle};
use crate::error::{RelayError, Result};
use crate::types::Sample;

/// Configuration for the subscription hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Outbound queue length per subscriber
    pub buffer_size: usize,
    /// Maximum concurrent subscribers
    pub max_subscribers: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            max_subscribers: 1024,
        }
    }
}

/// Thread-safe subscriber registry.
#[derive(Debug)]
pub struct SubscriptionHub {
    config: HubConfig,
    /// Active subscribers by ID
    subscribers: RwLock<HashMap<u64, Arc<Subscriber>>>,
    next_id: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl SubscriptionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Create and register a new subscriber with an empty channel set.
    ///
    /// Returns the capability handle and the receiving end of the
    /// subscriber's outbound queue.
    pub fn register(
        self: &Arc<Self>,
    ) -> Result<(SubscriptionHandle, mpsc::Receiver<Arc<Sample>>)> {
        let (sender, receiver) = mpsc::channel(self.config.buffer_size.max(1));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber::new(id, sender));

        self.subscribe(Arc::clone(&subscriber))?;

        Ok((SubscriptionHandle::new(Arc::clone(self), subscriber), receiver))
    }

    /// Register a subscriber for every future tick.
    ///
    /// Re-registering the same subscriber is a no-op.
    pub fn subscribe(&self, subscriber: Arc<Subscriber>) -> Result<()> {
        let mut subscribers = self.subscribers.write();
        if subscribers.contains_key(&subscriber.id()) {
            return Ok(());
        }
        if subscribers.len() >= self.config.max_subscribers {
            return Err(RelayError::MaxSubscribers {
                max: self.config.max_subscribers,
            });
        }

        debug!("Subscriber {} registered", subscriber.id());
        subscribers.insert(subscriber.id(), subscriber);
        Ok(())
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            debug!("Subscriber {} removed", id);
        }
        removed
    }

    /// Offer one sample to every subscriber.
    ///
    /// Returns the number of subscribers the sample was queued for.
    pub fn notify(&self, sample: Arc<Sample>) -> usize {
        self.notify_tick(std::slice::from_ref(&sample))
    }

    /// Offer all samples of one tick to every subscriber, using a single
    /// registry snapshot for the whole tick.
    pub fn notify_tick(&self, samples: &[Arc<Sample>]) -> usize {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return 0;
        }

        let mut sent = 0;
        let mut dropped = 0;
        let mut dead = Vec::new();

        for subscriber in &snapshot {
            for sample in samples {
                match subscriber.deliver(sample) {
                    Delivery::Sent => sent += 1,
                    Delivery::Filtered => {}
                    Delivery::Dropped => dropped += 1,
                    Delivery::Closed => {
                        dead.push(subscriber.id());
                        break;
                    }
                }
            }
        }

        // Structural changes only after the broadcast
        for id in dead {
            self.unsubscribe(id);
        }

        self.delivered.fetch_add(sent as u64, Ordering::Relaxed);
        self.dropped.fetch_add(dropped, Ordering::Relaxed);
        trace!("Tick of {} samples queued {} times", samples.len(), sent);
        sent
    }

    /// Number of registered subscribers
    pub fn count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.subscribers.read().contains_key(&id)
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            subscribers: self.count(),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn snapshot(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.read().values().cloned().collect()
    }
}

impl Default for SubscriptionHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

/// Statistics about the hub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Current number of subscribers
    pub subscribers: usize,
    /// Samples queued to subscribers since startup
    pub delivered: u64,
    /// Samples dropped on full queues since startup
    pub dropped: u64,
}
