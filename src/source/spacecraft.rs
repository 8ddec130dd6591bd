//! Simulated spacecraft producing propulsion, comms and power telemetry.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Stimulus, TelemetrySource};
use crate::types::{ChannelId, Sample, SampleValue};

pub const FUEL: &str = "prop.fuel";
pub const THRUSTERS: &str = "prop.thrusters";
pub const COMMS_RECD: &str = "comms.recd";
pub const COMMS_SENT: &str = "comms.sent";
pub const PWR_TEMP: &str = "pwr.temp";
pub const PWR_CURRENT: &str = "pwr.c";
pub const PWR_VOLTAGE: &str = "pwr.v";

/// Emission order
const CHANNELS: [&str; 7] = [
    FUEL,
    THRUSTERS,
    COMMS_RECD,
    COMMS_SENT,
    PWR_TEMP,
    PWR_CURRENT,
    PWR_VOLTAGE,
];

const FUEL_BURN_PER_TICK: f64 = 0.5;
const DECAY: f64 = 0.985;
const NOMINAL_CURRENT: f64 = 8.15;
const NOMINAL_VOLTAGE: f64 = 30.0;
/// Bytes received per operator command
const COMMAND_SIZE: f64 = 32.0;

/// Small spacecraft simulator.
#[derive(Debug)]
pub struct Spacecraft {
    fuel: f64,
    thrusters_on: bool,
    comms_recd: f64,
    comms_sent: f64,
    temperature: f64,
    current: f64,
    voltage: f64,
    rng: StdRng,
}

impl Spacecraft {
    /// Spacecraft with OS-seeded noise.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Spacecraft with reproducible noise.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Spacecraft {
            fuel: 77.0,
            thrusters_on: false,
            comms_recd: 0.0,
            comms_sent: 0.0,
            temperature: 245.0,
            current: NOMINAL_CURRENT,
            voltage: NOMINAL_VOLTAGE,
            rng,
        }
    }

    pub fn fuel(&self) -> f64 {
        self.fuel
    }

    pub fn thrusters_on(&self) -> bool {
        self.thrusters_on
    }

    pub fn bytes_received(&self) -> f64 {
        self.comms_recd
    }

    pub fn bytes_sent(&self) -> f64 {
        self.comms_sent
    }

    fn thruster_state(&self) -> &'static str {
        if self.thrusters_on {
            "ON"
        } else {
            "OFF"
        }
    }

    /// Current value of one of this craft's channels.
    pub fn value_of(&self, channel: &str) -> Option<SampleValue> {
        let value: SampleValue = match channel {
            FUEL => self.fuel.into(),
            THRUSTERS => self.thruster_state().into(),
            COMMS_RECD => self.comms_recd.into(),
            COMMS_SENT => self.comms_sent.into(),
            PWR_TEMP => self.temperature.into(),
            PWR_CURRENT => self.current.into(),
            PWR_VOLTAGE => self.voltage.into(),
            _ => return None,
        };
        Some(value)
    }
}

impl Default for Spacecraft {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for Spacecraft {
    fn channels(&self) -> Vec<ChannelId> {
        CHANNELS.iter().map(|c| ChannelId::from(*c)).collect()
    }

    fn advance(&mut self) {
        if self.thrusters_on {
            self.fuel = (self.fuel - FUEL_BURN_PER_TICK).max(0.0);
            self.current = NOMINAL_CURRENT;
        } else {
            self.current *= DECAY;
        }

        let jitter: f64 = self.rng.gen_range(-1.0..=1.0);
        self.temperature = self.temperature * DECAY + self.rng.gen::<f64>() * 0.25 + jitter;
        self.voltage = NOMINAL_VOLTAGE + self.rng.gen::<f64>().powi(3);
    }

    fn sample(&mut self, timestamp: u64) -> Vec<Sample> {
        let mut samples = Vec::with_capacity(CHANNELS.len());
        for channel in CHANNELS {
            let Some(value) = self.value_of(channel) else {
                continue;
            };
            let sample = Sample::new(channel, timestamp, value);
            // Downlink accounting: every emitted sample counts toward comms.sent
            self.comms_sent += serde_json::to_string(&sample)
                .map(|json| json.len() as f64)
                .unwrap_or(0.0);
            samples.push(sample);
        }
        samples
    }

    fn stimulus(&mut self, stimulus: Stimulus) -> bool {
        match stimulus {
            Stimulus::ToggleThrusters => {
                self.thrusters_on = !self.thrusters_on;
                self.comms_recd += COMMAND_SIZE;
                info!("Thrusters {}", self.thruster_state());
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(samples: &[Sample], channel: &str) -> SampleValue {
        samples
            .iter()
            .find(|s| s.id.as_str() == channel)
            .map(|s| s.value.clone())
            .unwrap()
    }

    #[test]
    fn test_one_sample_per_channel_with_shared_timestamp() {
        let mut craft = Spacecraft::seeded(7);
        let samples = craft.tick(1000);

        assert_eq!(samples.len(), 7);
        assert!(samples.iter().all(|s| s.timestamp == 1000));
        let ids: Vec<ChannelId> = samples.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, craft.channels());
    }

    #[test]
    fn test_value_of_unknown_channel() {
        let craft = Spacecraft::seeded(1);
        assert_eq!(craft.value_of("pwr.x"), None);
        assert_eq!(craft.value_of(""), None);
        assert_eq!(craft.value_of(PWR_VOLTAGE), Some(SampleValue::Number(30.0)));
        for channel in CHANNELS {
            assert!(craft.value_of(channel).is_some(), "{}", channel);
        }
    }

    #[test]
    fn test_initial_state() {
        let mut craft = Spacecraft::seeded(1);
        let samples = craft.sample(1);

        assert_eq!(value(&samples, FUEL), SampleValue::Number(77.0));
        assert_eq!(value(&samples, THRUSTERS), SampleValue::from("OFF"));
        assert_eq!(value(&samples, COMMS_RECD), SampleValue::Number(0.0));
        assert_eq!(value(&samples, PWR_TEMP), SampleValue::Number(245.0));
    }

    #[test]
    fn test_fuel_burns_only_with_thrusters_on() {
        let mut craft = Spacecraft::seeded(3);
        craft.advance();
        assert_eq!(craft.fuel(), 77.0);

        assert!(craft.stimulus(Stimulus::ToggleThrusters));
        assert!(craft.thrusters_on());
        assert_eq!(craft.bytes_received(), 32.0);

        craft.advance();
        assert_eq!(craft.fuel(), 76.5);
        let samples = craft.sample(2000);
        assert_eq!(value(&samples, FUEL), SampleValue::Number(76.5));
        assert_eq!(value(&samples, THRUSTERS), SampleValue::from("ON"));
        assert_eq!(value(&samples, PWR_CURRENT), SampleValue::Number(8.15));
    }

    #[test]
    fn test_fuel_never_negative() {
        let mut craft = Spacecraft::seeded(3);
        craft.stimulus(Stimulus::ToggleThrusters);
        for _ in 0..200 {
            craft.advance();
        }
        assert_eq!(craft.fuel(), 0.0);
    }

    #[test]
    fn test_current_decays_with_thrusters_off() {
        let mut craft = Spacecraft::seeded(5);
        craft.advance();
        let samples = craft.sample(1);
        let current = value(&samples, PWR_CURRENT).as_f64().unwrap();
        assert!((current - 8.15 * 0.985).abs() < 1e-9);
    }

    #[test]
    fn test_voltage_stays_in_band() {
        let mut craft = Spacecraft::seeded(11);
        for _ in 0..50 {
            craft.advance();
            let samples = craft.sample(1);
            let v = value(&samples, PWR_VOLTAGE).as_f64().unwrap();
            assert!((30.0..=31.0).contains(&v));
        }
    }

    #[test]
    fn test_comms_sent_counts_emitted_bytes() {
        let mut craft = Spacecraft::seeded(2);
        let first = craft.sample(1);
        let expected: usize = first
            .iter()
            .map(|s| serde_json::to_string(s).unwrap().len())
            .sum();
        assert_eq!(craft.bytes_sent(), expected as f64);

        // comms.sent is emitted fourth, after three samples of its own tick
        let second = craft.sample(2);
        let before: usize = second[..3]
            .iter()
            .map(|s| serde_json::to_string(s).unwrap().len())
            .sum();
        assert_eq!(
            value(&second, COMMS_SENT),
            SampleValue::Number((expected + before) as f64)
        );
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = Spacecraft::seeded(42);
        let mut b = Spacecraft::seeded(42);
        for ts in 0..10 {
            assert_eq!(a.tick(ts), b.tick(ts));
        }
    }
}
