//! Subscribers and their capability handles
//!
//! Each realtime connection gets one `Subscriber`, which tracks:
//! - Unique ID for the connection
//! - The set of channels the connection opted into
//! - Channel sender for async sample delivery
//!
//! The connection never touches the `Subscriber` directly. It holds a
//! `SubscriptionHandle` returned by the hub at registration time; dropping
//! or closing the handle removes the subscriber from the hub exactly once.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::registry::SubscriptionHub;
use crate::types::{ChannelId, Sample};

/// Outcome of offering one sample to one subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the connection
    Sent,
    /// Channel not in the subscriber's set
    Filtered,
    /// Queue full, sample dropped for this subscriber only
    Dropped,
    /// Subscriber closed or receiver gone
    Closed,
}

/// A single realtime subscriber (connected client)
#[derive(Debug)]
pub struct Subscriber {
    /// Unique identifier
    id: u64,
    /// Active channel subscriptions
    channels: RwLock<HashSet<ChannelId>>,
    /// Channel sender for sample delivery
    sender: mpsc::Sender<Arc<Sample>>,
    /// Set once the connection is gone; no delivery after this
    closed: AtomicBool,
    /// Tracks full-queue state so overflow is logged once per episode
    lagging: AtomicBool,
}

impl Subscriber {
    pub fn new(id: u64, sender: mpsc::Sender<Arc<Sample>>) -> Self {
        Self {
            id,
            channels: RwLock::new(HashSet::new()),
            sender,
            closed: AtomicBool::new(false),
            lagging: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Check if a sample's channel is in this subscriber's set
    #[inline]
    pub fn matches(&self, sample: &Sample) -> bool {
        self.channels.read().contains(sample.id.as_str())
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.sender.is_closed()
    }

    /// Offer a sample; never blocks.
    pub fn deliver(&self, sample: &Arc<Sample>) -> Delivery {
        if self.is_closed() {
            return Delivery::Closed;
        }
        if !self.matches(sample) {
            return Delivery::Filtered;
        }

        match self.sender.try_send(Arc::clone(sample)) {
            Ok(()) => {
                self.lagging.store(false, Ordering::Relaxed);
                Delivery::Sent
            }
            Err(TrySendError::Full(_)) => {
                if !self.lagging.swap(true, Ordering::Relaxed) {
                    warn!(
                        "Subscriber {} queue full, dropping samples until it drains",
                        self.id
                    );
                }
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    fn add_channel(&self, id: ChannelId) -> bool {
        self.channels.write().insert(id)
    }

    fn remove_channel(&self, id: &str) -> bool {
        self.channels.write().remove(id)
    }

    fn channels(&self) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self.channels.read().iter().cloned().collect();
        ids.sort();
        ids
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Capability token for one hub registration.
///
/// Owns the right to edit the subscriber's channel set and to remove it
/// from the hub. Removal happens exactly once, on `close()` or on drop.
#[derive(Debug)]
pub struct SubscriptionHandle {
    hub: Arc<SubscriptionHub>,
    subscriber: Arc<Subscriber>,
    released: bool,
}

impl SubscriptionHandle {
    pub(crate) fn new(hub: Arc<SubscriptionHub>, subscriber: Arc<Subscriber>) -> Self {
        Self {
            hub,
            subscriber,
            released: false,
        }
    }

    /// Subscriber ID assigned by the hub
    pub fn id(&self) -> u64 {
        self.subscriber.id()
    }

    /// Opt into a channel. Returns false if it was already subscribed.
    pub fn subscribe_channel(&self, id: impl Into<ChannelId>) -> bool {
        self.subscriber.add_channel(id.into())
    }

    /// Opt out of a channel. Returns false if it was not subscribed.
    pub fn unsubscribe_channel(&self, id: &str) -> bool {
        self.subscriber.remove_channel(id)
    }

    /// Current channel set, sorted
    pub fn channels(&self) -> Vec<ChannelId> {
        self.subscriber.channels()
    }

    /// Stop delivery and leave the hub.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.subscriber.mark_closed();
        self.hub.unsubscribe(self.subscriber.id());
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}
