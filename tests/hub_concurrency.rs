//! Concurrency tests for the subscription hub.
//!
//! Tests verify:
//! - Registrations racing with broadcasts see whole ticks or nothing
//! - Closing subscribers mid-broadcast never corrupts the registry
//! - A full subscriber queue does not hold back other subscribers
//! - Readers query history while the tick driver appends

use relay::hub::{HubConfig, SubscriptionHub};
use relay::storage::HistoryStore;
use relay::{ChannelId, Relay, Sample, TimeRange};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const CHANNELS: [&str; 4] = ["a", "b", "c", "d"];

fn tick(ts: u64) -> Vec<Sample> {
    CHANNELS
        .iter()
        .map(|id| Sample::new(*id, ts, ts as f64))
        .collect()
}

fn relay_with_hub(config: HubConfig) -> Arc<Relay> {
    Arc::new(Relay::new(
        Arc::new(HistoryStore::new()),
        Arc::new(SubscriptionHub::new(config)),
    ))
}

// ============================================================================
// REGISTRY RACES
// ============================================================================

#[test]
fn test_mid_tick_registration_sees_whole_ticks() {
    let relay = relay_with_hub(HubConfig {
        buffer_size: 10_000,
        max_subscribers: 1024,
    });
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let relay = Arc::clone(&relay);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for ts in 1..=500 {
                relay.ingest(tick(ts));
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let mut sessions = Vec::new();
    while !done.load(Ordering::SeqCst) && sessions.len() < 50 {
        let (handle, rx) = relay.hub().register().unwrap();
        for id in CHANNELS {
            handle.subscribe_channel(id);
        }
        // Ticks after this one start broadcasting with the full channel set
        let settled = relay.history().latest("d").map(|s| s.timestamp).unwrap_or(0);
        sessions.push((handle, rx, settled));
        thread::yield_now();
    }
    producer.join().unwrap();

    for (handle, mut rx, settled) in sessions {
        let mut counts = std::collections::BTreeMap::new();
        while let Ok(sample) = rx.try_recv() {
            *counts.entry(sample.timestamp).or_insert(0) += 1;
        }
        for ts in (settled + 1)..=500 {
            assert_eq!(
                counts.get(&ts).copied().unwrap_or(0),
                CHANNELS.len(),
                "subscriber {} at {}",
                handle.id(),
                ts
            );
        }
    }
}

#[test]
fn test_close_during_broadcast() {
    let relay = relay_with_hub(HubConfig::default());

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let (handle, rx) = relay.hub().register().unwrap();
            handle.subscribe_channel("a");
            (handle, rx)
        })
        .collect();

    let producer = {
        let relay = Arc::clone(&relay);
        thread::spawn(move || {
            for ts in 1..=200 {
                relay.ingest(tick(ts));
            }
        })
    };

    for (handle, rx) in handles {
        drop(rx);
        handle.close();
    }
    producer.join().unwrap();

    assert_eq!(relay.hub().count(), 0);
    assert_eq!(relay.ingest(tick(1_000)), 0);
}

// ============================================================================
// BACKPRESSURE
// ============================================================================

#[test]
fn test_full_queue_does_not_block_others() {
    let relay = relay_with_hub(HubConfig {
        buffer_size: 1,
        max_subscribers: 16,
    });

    let (slow, _slow_rx) = relay.hub().register().unwrap();
    slow.subscribe_channel("a");
    let (fast, mut fast_rx) = relay.hub().register().unwrap();
    fast.subscribe_channel("a");

    let mut fast_seen = Vec::new();
    for ts in 1..=10 {
        relay.ingest(tick(ts));
        while let Ok(sample) = fast_rx.try_recv() {
            fast_seen.push(sample.timestamp);
        }
    }

    assert_eq!(fast_seen, (1..=10).collect::<Vec<_>>());
    let stats = relay.hub().stats();
    assert_eq!(stats.dropped, 9);
    assert_eq!(stats.subscribers, 2);
}

#[test]
fn test_max_subscribers_enforced() {
    let relay = relay_with_hub(HubConfig {
        buffer_size: 4,
        max_subscribers: 2,
    });

    let _a = relay.hub().register().unwrap();
    let b = relay.hub().register().unwrap();
    assert!(relay.hub().register().is_err());

    drop(b);
    assert!(relay.hub().register().is_ok());
}

// ============================================================================
// READERS DURING APPENDS
// ============================================================================

#[test]
fn test_queries_see_consistent_prefixes() {
    let relay = relay_with_hub(HubConfig::default());
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let relay = Arc::clone(&relay);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for ts in 1..=2_000 {
                relay.ingest(tick(ts));
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let relay = Arc::clone(&relay);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let ids = [ChannelId::from("a")];
                while !done.load(Ordering::SeqCst) {
                    let samples = relay.history().query(&ids, TimeRange::unbounded());
                    for (i, sample) in samples.iter().enumerate() {
                        assert_eq!(sample.timestamp, i as u64 + 1);
                    }
                }
            })
        })
        .collect();

    producer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(relay.history().len("a"), 2_000);
}
