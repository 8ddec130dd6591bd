//! # Telemetry Relay
//!
//! In-memory telemetry history and realtime distribution.
//!
//! ```text
//!   TelemetrySource ──tick──► TickScheduler ──► Relay::ingest
//!                                                  │
//!                              ┌───────────────────┴───────────────────┐
//!                              ▼                                       ▼
//!                        HistoryStore                           SubscriptionHub
//!                              │                                       │
//!                   GET /telemetry/{ids}                   WebSocket "subscribe <id>"
//! ```
//!
//! - [`storage`]: per-channel ordered sample logs with range queries
//! - [`hub`]: subscriber registry and per-tick fan-out
//! - [`source`]: the source contract and the spacecraft simulator
//! - [`tick`]: the single driver that ticks the source
//! - [`service`]: HTTP history routes and the WebSocket realtime route
//! - [`client`]: reqwest client for the history routes

pub mod client;
pub mod config;
pub mod error;
pub mod hub;
pub mod relay;
pub mod service;
pub mod source;
pub mod storage;
pub mod tick;
pub mod types;

pub use client::HistoryClient;
pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use hub::{SubscriptionHandle, SubscriptionHub};
pub use relay::{Relay, RelayStats};
pub use source::{Spacecraft, Stimulus, TelemetrySource};
pub use storage::HistoryStore;
pub use tick::TickScheduler;
pub use types::{ChannelId, Sample, SampleValue, TimeRange};
