//! Tick scheduler - the single driver of the telemetry source.
//!
//! The scheduler owns the source and is the only code that calls it. Timer
//! ticks and stimulus bursts both go through the same lock, so:
//!
//! 1. **One writer**: the history store and the hub only ever see one tick
//!    being ingested at a time.
//! 2. **Monotonic time**: every tick is stamped with `max(last, now)`, so
//!    timestamps never decrease across ticks, whatever the wall clock does.
//! 3. **Whole ticks**: a tick is ingested (stored and broadcast) before the
//!    lock is released and the next tick can start.
//!
//! The default period is one second. The first timer tick fires one period
//! after `start()`.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::clock::{Clock, MonotonicStamp, SystemClock};
use crate::relay::Relay;
use crate::source::{Stimulus, TelemetrySource};
use log::{debug, info};

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between timer ticks
    pub tick_interval: Duration,
    /// Whether the timer runs at all (stimuli still work when disabled)
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000),
            enabled: true,
        }
    }
}

struct Driver {
    source: Box<dyn TelemetrySource>,
    stamp: MonotonicStamp,
}

/// Periodic driver feeding the relay from a telemetry source.
pub struct TickScheduler {
    relay: Arc<Relay>,
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    driver: Mutex<Driver>,
    ticks: AtomicU64,
    bursts: AtomicU64,
    /// Timestamp of the most recent tick or burst
    last_tick_at: RwLock<Option<u64>>,
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("config", &self.config)
            .field("ticks", &self.ticks.load(Ordering::Relaxed))
            .field("bursts", &self.bursts.load(Ordering::Relaxed))
            .finish()
    }
}

impl TickScheduler {
    /// Creates a scheduler stamping ticks with system time.
    ///
    /// The source's channels are registered with the history store up
    /// front, so they show up (empty) before the first tick.
    pub fn new(
        relay: Arc<Relay>,
        source: Box<dyn TelemetrySource>,
        config: SchedulerConfig,
    ) -> Self {
        Self::with_clock(relay, source, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        relay: Arc<Relay>,
        source: Box<dyn TelemetrySource>,
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        relay.history().register_channels(source.channels());
        Self {
            relay,
            config,
            clock,
            driver: Mutex::new(Driver {
                source,
                stamp: MonotonicStamp::default(),
            }),
            ticks: AtomicU64::new(0),
            bursts: AtomicU64::new(0),
            last_tick_at: RwLock::new(None),
        }
    }

    /// Run one timer tick now: advance the source, sample, ingest.
    ///
    /// Returns the number of subscriber deliveries.
    pub fn tick_now(&self) -> usize {
        let mut driver = self.driver.lock();
        let timestamp = driver.stamp.stamp(self.clock.now_ms());
        let samples = driver.source.tick(timestamp);
        let sent = self.relay.ingest(samples);

        self.ticks.fetch_add(1, Ordering::Relaxed);
        *self.last_tick_at.write() = Some(timestamp);
        sent
    }

    /// Apply an external stimulus, ingesting an immediate burst if the
    /// source asks for one. Returns true when a burst was produced.
    pub fn stimulate(&self, stimulus: Stimulus) -> bool {
        let mut driver = self.driver.lock();
        if !driver.source.stimulus(stimulus) {
            return false;
        }

        let timestamp = driver.stamp.stamp(self.clock.now_ms());
        let samples = driver.source.sample(timestamp);
        self.relay.ingest(samples);

        self.bursts.fetch_add(1, Ordering::Relaxed);
        *self.last_tick_at.write() = Some(timestamp);
        debug!("Stimulus {:?} produced burst at {}", stimulus, timestamp);
        true
    }

    /// Runs the timer loop forever. Returns immediately if disabled.
    ///
    /// Should be spawned as a tokio task; see `spawn`.
    pub async fn start(self: Arc<Self>) {
        if !self.config.enabled {
            info!("Tick timer is disabled, skipping");
            return;
        }

        info!(
            "Starting tick timer with {}ms interval",
            self.config.tick_interval.as_millis()
        );

        let period = self.config.tick_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick_now();
        }
    }

    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(Arc::clone(self).start())
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            bursts: self.bursts.load(Ordering::Relaxed),
            last_tick_at: *self.last_tick_at.read(),
        }
    }
}

/// Scheduler statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Timer ticks produced
    pub ticks: u64,
    /// Stimulus bursts produced
    pub bursts: u64,
    /// Timestamp of the last tick or burst
    pub last_tick_at: Option<u64>,
}
