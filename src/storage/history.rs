//! History store - per-channel, time-ordered sample logs.
//!
//! Each channel owns a `VecDeque<Sample>` behind its own `RwLock`, so a
//! query on one channel never waits on an append to another. Samples are
//! fully built before the write lock is taken; readers therefore only ever
//! see whole samples (a consistent prefix of the log).

use log::debug;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::{HistoryConfig, HistoryStats};
use crate::types::{ChannelId, Sample, TimeRange};

type ChannelLog = Arc<RwLock<VecDeque<Sample>>>;

/// Thread-safe history store.
#[derive(Debug, Default)]
pub struct HistoryStore {
    config: HistoryConfig,

    /// Channel ID -> ordered log
    logs: RwLock<HashMap<ChannelId, ChannelLog>>,

    appended: AtomicU64,
    evicted: AtomicU64,
}

impl HistoryStore {
    /// Create a store with unbounded retention.
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        HistoryStore {
            config,
            logs: RwLock::new(HashMap::new()),
            appended: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    /// Create empty logs for a known set of channels.
    pub fn register_channels<I>(&self, channels: I)
    where
        I: IntoIterator<Item = ChannelId>,
    {
        let mut logs = self.logs.write();
        for id in channels {
            logs.entry(id).or_default();
        }
    }

    /// Append a sample to its channel's log.
    ///
    /// Never fails. Out-of-order samples (older than the channel's newest)
    /// are inserted after every sample with an equal or smaller timestamp,
    /// keeping the log sorted and ties in arrival order.
    pub fn append(&self, sample: Sample) {
        let log = self.log_for(&sample.id);
        let mut samples = log.write();

        match samples.back().map(|s| s.timestamp) {
            Some(newest) if newest > sample.timestamp => {
                debug!(
                    "Out-of-order sample for {} at {} (newest {})",
                    sample.id, sample.timestamp, newest
                );
                let pos = samples.partition_point(|s| s.timestamp <= sample.timestamp);
                samples.insert(pos, sample);
            }
            _ => samples.push_back(sample),
        }
        self.appended.fetch_add(1, Ordering::Relaxed);

        if let Some(cap) = self.config.retention {
            while samples.len() > cap {
                samples.pop_front();
                self.evicted.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Samples of the requested channels with `start < timestamp < end`.
    ///
    /// Results are concatenated in the order the channels were requested,
    /// each channel's samples in timestamp order. Unknown channels add
    /// nothing. A window with `start >= end` (or a `NaN` bound) is empty.
    pub fn query(&self, ids: &[ChannelId], range: TimeRange) -> Vec<Sample> {
        if range.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for id in ids {
            let log = match self.logs.read().get(id.as_str()) {
                Some(log) => Arc::clone(log),
                None => continue,
            };
            let samples = log.read();
            let lo = samples.partition_point(|s| (s.timestamp as f64) <= range.start);
            let hi = samples.partition_point(|s| (s.timestamp as f64) < range.end);
            if lo < hi {
                out.extend(samples.range(lo..hi).cloned());
            }
        }
        out
    }

    /// Most recent sample of a channel.
    pub fn latest(&self, id: &str) -> Option<Sample> {
        let log = self.logs.read().get(id).map(Arc::clone)?;
        let samples = log.read();
        samples.back().cloned()
    }

    /// Number of retained samples for a channel (0 if unknown).
    pub fn len(&self, id: &str) -> usize {
        self.logs
            .read()
            .get(id)
            .map(|log| log.read().len())
            .unwrap_or(0)
    }

    /// Channel IDs with a log, sorted.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self.logs.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn stats(&self) -> HistoryStats {
        let logs = self.logs.read();
        HistoryStats {
            channels: logs.len(),
            samples: logs.values().map(|log| log.read().len()).sum(),
            appended: self.appended.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    fn log_for(&self, id: &ChannelId) -> ChannelLog {
        if let Some(log) = self.logs.read().get(id.as_str()) {
            return Arc::clone(log);
        }
        let mut logs = self.logs.write();
        Arc::clone(logs.entry(id.clone()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ChannelId> {
        names.iter().map(|n| ChannelId::from(*n)).collect()
    }

    #[test]
    fn test_query_excludes_boundaries() {
        let store = HistoryStore::new();
        for ts in [1000, 1500, 2000] {
            store.append(Sample::new("fuel", ts, 1.0));
        }

        let result = store.query(&ids(&["fuel"]), TimeRange::new(1000.0, 2000.0));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].timestamp, 1500);
    }

    #[test]
    fn test_query_fuel_scenario() {
        let store = HistoryStore::new();
        store.append(Sample::new("fuel", 1000, 77.0));
        store.append(Sample::new("thruster", 1000, "OFF"));
        store.append(Sample::new("fuel", 2000, 76.5));
        store.append(Sample::new("thruster", 2000, "ON"));

        let result = store.query(&ids(&["fuel"]), TimeRange::new(999.0, 2001.0));
        assert_eq!(
            result,
            vec![
                Sample::new("fuel", 1000, 77.0),
                Sample::new("fuel", 2000, 76.5),
            ]
        );
    }

    #[test]
    fn test_query_concatenates_in_request_order() {
        let store = HistoryStore::new();
        store.append(Sample::new("a", 10, 1.0));
        store.append(Sample::new("b", 5, 2.0));
        store.append(Sample::new("a", 20, 3.0));

        let result = store.query(&ids(&["b", "a"]), TimeRange::unbounded());
        let order: Vec<(&str, u64)> = result
            .iter()
            .map(|s| (s.id.as_str(), s.timestamp))
            .collect();
        assert_eq!(order, vec![("b", 5), ("a", 10), ("a", 20)]);
    }

    #[test]
    fn test_unknown_channel_contributes_nothing() {
        let store = HistoryStore::new();
        store.append(Sample::new("fuel", 10, 1.0));

        let result = store.query(&ids(&["ghost", "fuel", "other"]), TimeRange::unbounded());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.as_str(), "fuel");

        assert!(store
            .query(&ids(&["ghost"]), TimeRange::unbounded())
            .is_empty());
    }

    #[test]
    fn test_inverted_or_nan_window_is_empty() {
        let store = HistoryStore::new();
        store.append(Sample::new("fuel", 10, 1.0));

        assert!(store.query(&ids(&["fuel"]), TimeRange::new(20.0, 0.0)).is_empty());
        assert!(store.query(&ids(&["fuel"]), TimeRange::new(10.0, 10.0)).is_empty());
        assert!(store
            .query(&ids(&["fuel"]), TimeRange::new(f64::NAN, 100.0))
            .is_empty());
        assert!(store
            .query(&ids(&["fuel"]), TimeRange::new(0.0, f64::NAN))
            .is_empty());
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let store = HistoryStore::new();
        store.append(Sample::new("x", 5, 1.0));
        store.append(Sample::new("x", 5, 2.0));
        store.append(Sample::new("x", 5, 3.0));

        let values: Vec<f64> = store
            .query(&ids(&["x"]), TimeRange::unbounded())
            .iter()
            .filter_map(|s| s.value.as_f64())
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_out_of_order_append_stays_sorted() {
        let store = HistoryStore::new();
        store.append(Sample::new("x", 10, 1.0));
        store.append(Sample::new("x", 30, 3.0));
        store.append(Sample::new("x", 20, 2.0));
        store.append(Sample::new("x", 10, 4.0));

        let stamps: Vec<u64> = store
            .query(&ids(&["x"]), TimeRange::unbounded())
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(stamps, vec![10, 10, 20, 30]);
    }

    #[test]
    fn test_retention_evicts_from_front() {
        let store = HistoryStore::with_config(HistoryConfig::capped(3));
        for ts in 1..=5 {
            store.append(Sample::new("x", ts, ts as f64));
        }

        assert_eq!(store.len("x"), 3);
        let stamps: Vec<u64> = store
            .query(&ids(&["x"]), TimeRange::unbounded())
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(stamps, vec![3, 4, 5]);

        let stats = store.stats();
        assert_eq!(stats.appended, 5);
        assert_eq!(stats.evicted, 2);
        assert_eq!(stats.samples, 3);
    }

    #[test]
    fn test_register_channels_and_latest() {
        let store = HistoryStore::new();
        store.register_channels(ids(&["b", "a"]));
        assert_eq!(store.channel_ids(), ids(&["a", "b"]));
        assert_eq!(store.len("a"), 0);
        assert!(store.latest("a").is_none());

        store.append(Sample::new("a", 1, 1.0));
        store.append(Sample::new("a", 2, 2.0));
        assert_eq!(store.latest("a").unwrap().timestamp, 2);
        assert_eq!(store.stats().channels, 2);
    }

    #[test]
    fn test_concurrent_reads_during_appends() {
        let store = Arc::new(HistoryStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for ts in 0..2000u64 {
                    store.append(Sample::new("x", ts, ts as f64));
                }
            })
        };

        let channel = ids(&["x"]);
        for _ in 0..200 {
            let snapshot = store.query(&channel, TimeRange::unbounded());
            // Always a gap-free prefix of the appended sequence
            for (i, s) in snapshot.iter().enumerate() {
                assert_eq!(s.timestamp, i as u64);
            }
        }
        writer.join().unwrap();
        assert_eq!(store.len("x"), 2000);
    }
}
