//! Telemetry sources.
//!
//! A source owns the simulated (or real) state behind a fixed set of
//! channels. The tick scheduler is its only caller: it advances the state
//! on every period and asks for one sample per channel, all stamped with
//! the same timestamp.

pub mod spacecraft;

pub use spacecraft::Spacecraft;

use crate::types::{ChannelId, Sample};

/// External event that mutates a source between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stimulus {
    /// Operator toggles the thrusters on or off
    ToggleThrusters,
}

/// Periodic producer of samples.
pub trait TelemetrySource: Send {
    /// Channels this source emits, in emission order
    fn channels(&self) -> Vec<ChannelId>;

    /// Advance internal state by one period.
    fn advance(&mut self);

    /// One sample per channel, all with `timestamp`.
    fn sample(&mut self, timestamp: u64) -> Vec<Sample>;

    /// Apply a stimulus. Returns true when the source wants an immediate
    /// out-of-band sample burst.
    fn stimulus(&mut self, stimulus: Stimulus) -> bool;

    /// Advance then sample.
    fn tick(&mut self, timestamp: u64) -> Vec<Sample> {
        self.advance();
        self.sample(timestamp)
    }
}
