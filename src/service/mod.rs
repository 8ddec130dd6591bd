//! Network-facing services.
//!
//! ```text
//!                       ┌────────────────┐
//!   GET /telemetry/.. ─►│ history (http) │──► HistoryStore::query
//!                       └────────────────┘
//!                       ┌────────────────┐
//!   "subscribe x"     ─►│ realtime (ws)  │◄── SubscriptionHub (per-session queue)
//!                       └────────────────┘
//! ```
//!
//! Both routers share one `Arc<Relay>`; neither writes to the store.

pub mod http;
pub mod realtime;
pub mod request;
pub mod ws;

pub use http::{build_history_router, HealthResponse};
pub use realtime::{ControlMessage, RealtimeSession};
pub use request::HistoryRequest;
pub use ws::build_realtime_router;

use axum::Router;
use log::info;
use tokio::net::TcpListener;

use crate::error::{RelayError, Result};

/// Bind a listener, reporting the address on failure.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|e| RelayError::Bind {
        addr: addr.to_string(),
        source: e,
    })
}

/// Serve `router` on an already bound listener until the server stops.
pub async fn serve(name: &str, listener: TcpListener, router: Router) -> Result<()> {
    let local = listener.local_addr()?;
    info!("{} server listening on {}", name, local);
    axum::serve(listener, router).await?;
    Ok(())
}
