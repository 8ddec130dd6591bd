//! Subscription hub for realtime fan-out.
//!
//! ```text
//! TickScheduler ──→ Relay::ingest
//!                       │
//!                ┌──────┴──────┐
//!                ▼             ▼
//!          HistoryStore   SubscriptionHub ◄── register / close (per connection)
//!                              │
//!                              ▼
//!                    Subscriber queues (bounded, per connection)
//!                              │
//!                              ▼
//!                     Realtime sessions (WebSocket)
//! ```

pub mod registry;
pub mod subscriber;

pub use registry::{HubConfig, HubStats, SubscriptionHub};
pub use subscriber::{Delivery, Subscriber, SubscriptionHandle};
