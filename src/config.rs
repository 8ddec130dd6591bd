//! Relay configuration.
//!
//! Defaults match the classic two-port layout (history on 8081, realtime
//! on 8082, one tick per second). Every field can be overridden from the
//! environment:
//!
//! | Variable                  | Field                     | Default        |
//! |---------------------------|---------------------------|----------------|
//! | `RELAY_HISTORY_ADDR`      | `history_addr`            | `0.0.0.0:8081` |
//! | `RELAY_REALTIME_ADDR`     | `realtime_addr`           | `0.0.0.0:8082` |
//! | `RELAY_TICK_INTERVAL_MS`  | `scheduler.tick_interval` | `1000`         |
//! | `RELAY_RETENTION`         | `history.retention`       | unbounded      |
//! | `RELAY_SUBSCRIBER_BUFFER` | `hub.buffer_size`         | `256`          |
//! | `RELAY_MAX_SUBSCRIBERS`   | `hub.max_subscribers`     | `1024`         |
//! | `RELAY_STDIN_TOGGLE`      | `stdin_toggle`            | `true`         |
//! | `RELAY_SEED`              | `seed`                    | none           |

use std::str::FromStr;
use std::time::Duration;

use crate::error::{RelayError, Result};
use crate::hub::HubConfig;
use crate::storage::HistoryConfig;
use crate::tick::SchedulerConfig;

pub const ENV_HISTORY_ADDR: &str = "RELAY_HISTORY_ADDR";
pub const ENV_REALTIME_ADDR: &str = "RELAY_REALTIME_ADDR";
pub const ENV_TICK_INTERVAL_MS: &str = "RELAY_TICK_INTERVAL_MS";
pub const ENV_RETENTION: &str = "RELAY_RETENTION";
pub const ENV_SUBSCRIBER_BUFFER: &str = "RELAY_SUBSCRIBER_BUFFER";
pub const ENV_MAX_SUBSCRIBERS: &str = "RELAY_MAX_SUBSCRIBERS";
pub const ENV_STDIN_TOGGLE: &str = "RELAY_STDIN_TOGGLE";
pub const ENV_SEED: &str = "RELAY_SEED";

/// Top-level relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bind address of the history (query) server
    pub history_addr: String,
    /// Bind address of the realtime (WebSocket) server
    pub realtime_addr: String,
    pub scheduler: SchedulerConfig,
    pub hub: HubConfig,
    pub history: HistoryConfig,
    /// Toggle thrusters on every line read from stdin
    pub stdin_toggle: bool,
    /// Seed for simulator noise
    pub seed: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            history_addr: "0.0.0.0:8081".to_string(),
            realtime_addr: "0.0.0.0:8082".to_string(),
            scheduler: SchedulerConfig::default(),
            hub: HubConfig::default(),
            history: HistoryConfig::default(),
            stdin_toggle: true,
            seed: None,
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = RelayConfig::default();

        if let Some(addr) = lookup(ENV_HISTORY_ADDR) {
            config.history_addr = non_empty(ENV_HISTORY_ADDR, addr)?;
        }
        if let Some(addr) = lookup(ENV_REALTIME_ADDR) {
            config.realtime_addr = non_empty(ENV_REALTIME_ADDR, addr)?;
        }
        if let Some(raw) = lookup(ENV_TICK_INTERVAL_MS) {
            let ms: u64 = parse_positive(ENV_TICK_INTERVAL_MS, &raw)?;
            config.scheduler.tick_interval = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup(ENV_RETENTION) {
            config.history.retention = Some(parse_positive(ENV_RETENTION, &raw)?);
        }
        if let Some(raw) = lookup(ENV_SUBSCRIBER_BUFFER) {
            config.hub.buffer_size = parse_positive(ENV_SUBSCRIBER_BUFFER, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_SUBSCRIBERS) {
            config.hub.max_subscribers = parse_positive(ENV_MAX_SUBSCRIBERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STDIN_TOGGLE) {
            config.stdin_toggle = parse_bool(ENV_STDIN_TOGGLE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            config.seed = Some(parse(ENV_SEED, &raw)?);
        }

        Ok(config)
    }
}

fn non_empty(key: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RelayError::config(key, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| RelayError::config(key, format!("{:?}: {}", raw, e)))
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value: T = parse(key, raw)?;
    if value <= T::default() {
        return Err(RelayError::config(key, "must be greater than zero"));
    }
    Ok(value)
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RelayError::config(key, format!("not a boolean: {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.history_addr, "0.0.0.0:8081");
        assert_eq!(config.realtime_addr, "0.0.0.0:8082");
        assert_eq!(config.scheduler.tick_interval, Duration::from_millis(1000));
        assert!(config.scheduler.enabled);
        assert_eq!(config.history.retention, None);
        assert_eq!(config.hub.buffer_size, 256);
        assert!(config.stdin_toggle);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_overrides() {
        let config = RelayConfig::from_lookup(lookup(&[
            (ENV_HISTORY_ADDR, "127.0.0.1:9001"),
            (ENV_TICK_INTERVAL_MS, "250"),
            (ENV_RETENTION, "1000"),
            (ENV_SUBSCRIBER_BUFFER, "16"),
            (ENV_MAX_SUBSCRIBERS, "4"),
            (ENV_STDIN_TOGGLE, "off"),
            (ENV_SEED, "42"),
        ]))
        .unwrap();

        assert_eq!(config.history_addr, "127.0.0.1:9001");
        assert_eq!(config.scheduler.tick_interval, Duration::from_millis(250));
        assert_eq!(config.history.retention, Some(1000));
        assert_eq!(config.hub.buffer_size, 16);
        assert_eq!(config.hub.max_subscribers, 4);
        assert!(!config.stdin_toggle);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            (ENV_TICK_INTERVAL_MS, "soon"),
            (ENV_TICK_INTERVAL_MS, "0"),
            (ENV_RETENTION, "-5"),
            (ENV_STDIN_TOGGLE, "maybe"),
            (ENV_REALTIME_ADDR, "  "),
        ] {
            let result = RelayConfig::from_lookup(lookup(&[(key, value)]));
            assert!(
                matches!(result, Err(RelayError::Config { .. })),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }
}
