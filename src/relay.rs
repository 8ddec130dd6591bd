use crate::config::RelayConfig;
use crate::hub::{HubStats, SubscriptionHub};
use crate::storage::{HistoryStats, HistoryStore};
use crate::types::Sample;
use log::trace;
use std::sync::Arc;
use std::time::Instant;

/// The relay ties the history store and the subscription hub together
/// behind one ingestion entrypoint.
///
/// # Data Flow
/// - Source → (tick) → `Relay::ingest`
/// - `ingest` appends every sample to the history store, then fans the
///   whole tick out to the hub with one subscriber snapshot
/// - The request service only reads the history store
///
/// Both halves are passed in at construction; services hold clones of
/// the same `Arc`s.
#[derive(Debug)]
pub struct Relay {
    history: Arc<HistoryStore>,
    hub: Arc<SubscriptionHub>,
    started_at: Instant,
}

impl Relay {
    pub fn new(history: Arc<HistoryStore>, hub: Arc<SubscriptionHub>) -> Self {
        Relay {
            history,
            hub,
            started_at: Instant::now(),
        }
    }

    /// Build a fresh store and hub from configuration.
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            Arc::new(HistoryStore::with_config(config.history.clone())),
            Arc::new(SubscriptionHub::new(config.hub.clone())),
        )
    }

    /// Ingest one tick worth of samples.
    ///
    /// History first, then notification: a subscriber that reacts to a push
    /// by querying history will find the pushed sample there. Returns the
    /// number of subscriber deliveries.
    pub fn ingest(&self, samples: Vec<Sample>) -> usize {
        if samples.is_empty() {
            return 0;
        }

        let shared: Vec<Arc<Sample>> = samples.into_iter().map(Arc::new).collect();
        for sample in &shared {
            self.history.append(Sample::clone(sample));
        }

        let sent = self.hub.notify_tick(&shared);
        trace!("Ingested {} samples, {} deliveries", shared.len(), sent);
        sent
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn hub(&self) -> &Arc<SubscriptionHub> {
        &self.hub
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            history: self.history.stats(),
            hub: self.hub.stats(),
        }
    }
}

/// Combined relay statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStats {
    pub history: HistoryStats,
    pub hub: HubStats,
}
