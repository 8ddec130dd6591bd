//! Tick driving for the telemetry source.
//!
//! Provides two ways to produce samples:
//! 1. **Timer ticks** (TickScheduler::start): fixed-period background task (1 second default)
//! 2. **Stimulus bursts** (TickScheduler::stimulate): out-of-band samples on operator input

pub mod clock;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{SchedulerConfig, SchedulerStats, TickScheduler};
