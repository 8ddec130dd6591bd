//! Realtime session - one per push connection.
//!
//! # Control protocol
//!
//! Inbound frames are plain text, space delimited:
//!
//! ```text
//! subscribe <channelId>
//! unsubscribe <channelId>
//! ```
//!
//! Anything else (unknown verb, missing channel) is ignored. Outbound frames
//! are one JSON-encoded sample each, `{"timestamp":..,"value":..,"id":..}`.
//!
//! # Lifecycle
//!
//! `open` registers an empty subscriber with the hub. The session owns the
//! hub handle and the receiving end of its outbound queue; `close` (or
//! dropping the session) removes the subscriber exactly once.

use std::sync::Arc;

use log::{debug, trace};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::hub::{SubscriptionHandle, SubscriptionHub};
use crate::types::{ChannelId, Sample};

/// One parsed control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    Subscribe(ChannelId),
    Unsubscribe(ChannelId),
    Unrecognized,
}

impl ControlMessage {
    /// Parse `<verb> <channelId>`. Tokens after the channel are ignored.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(' ');
        let verb = parts.next().unwrap_or_default();
        let channel = match parts.next() {
            Some(id) if !id.is_empty() => ChannelId::from(id),
            _ => return ControlMessage::Unrecognized,
        };

        match verb {
            "subscribe" => ControlMessage::Subscribe(channel),
            "unsubscribe" => ControlMessage::Unsubscribe(channel),
            _ => ControlMessage::Unrecognized,
        }
    }
}

/// Per-connection subscription state.
#[derive(Debug)]
pub struct RealtimeSession {
    handle: SubscriptionHandle,
    outbound: mpsc::Receiver<Arc<Sample>>,
}

impl RealtimeSession {
    /// Register a new, empty subscriber with `hub`.
    pub fn open(hub: &Arc<SubscriptionHub>) -> Result<Self> {
        let (handle, outbound) = hub.register()?;
        debug!("Realtime session {} opened", handle.id());
        Ok(Self { handle, outbound })
    }

    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    /// Apply one inbound text frame. Returns the parsed message.
    pub fn handle_message(&self, text: &str) -> ControlMessage {
        let message = ControlMessage::parse(text);
        match &message {
            ControlMessage::Subscribe(id) => {
                self.handle.subscribe_channel(id.clone());
                trace!("Session {} subscribed to {}", self.id(), id);
            }
            ControlMessage::Unsubscribe(id) => {
                self.handle.unsubscribe_channel(id.as_str());
                trace!("Session {} unsubscribed from {}", self.id(), id);
            }
            ControlMessage::Unrecognized => {
                trace!("Session {} ignored {:?}", self.id(), text);
            }
        }
        message
    }

    /// Wait for the next sample to push.
    ///
    /// Cancel safe; returns `None` once the session has left the hub.
    pub async fn next_push(&mut self) -> Option<Arc<Sample>> {
        self.outbound.recv().await
    }

    /// A queued sample, if one is ready right now.
    pub fn try_next_push(&mut self) -> Option<Arc<Sample>> {
        self.outbound.try_recv().ok()
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        self.handle.channels()
    }

    /// Leave the hub. Samples already queued are discarded.
    pub fn close(self) {
        let id = self.id();
        self.handle.close();
        debug!("Realtime session {} closed", id);
    }
}

/// Encode one outbound push frame.
pub fn encode_push(sample: &Sample) -> Result<String> {
    Ok(serde_json::to_string(sample)?)
}
