//! Realtime WebSocket route.
//!
//! Each upgraded connection gets a `RealtimeSession`. The connection task
//! waits on two things at once: inbound control frames from the socket and
//! outbound samples from the session queue. It ends on socket close, socket
//! error or a failed send, and closes the session exactly once on the way out.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use log::{debug, warn};

use super::realtime::{encode_push, RealtimeSession};
use crate::relay::Relay;

/// Build the realtime router. Clients connect to `/`.
pub fn build_realtime_router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/", get(upgrade))
        .with_state(relay)
}

async fn upgrade(ws: WebSocketUpgrade, State(relay): State<Arc<Relay>>) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, relay))
}

async fn run_connection(mut socket: WebSocket, relay: Arc<Relay>) {
    let mut session = match RealtimeSession::open(relay.hub()) {
        Ok(session) => session,
        Err(e) => {
            warn!("Rejecting realtime connection: {}", e);
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    session.handle_message(text.as_str());
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Session {} socket error: {}", session.id(), e);
                    break;
                }
            },
            push = session.next_push() => {
                let Some(sample) = push else { break };
                let frame = match encode_push(&sample) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Failed to encode sample for {}: {}", sample.id, e);
                        continue;
                    }
                };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    session.close();
}
