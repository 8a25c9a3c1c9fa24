//! Per-client receive loop.
//!
//! Every accepted socket gets its own `Connection`, which owns the simulator
//! state for that client. Nothing here is shared between connections.

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rand::Rng;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::telemetry::{Command, Request, TelemetrySimulator};

/// State owned by one client connection.
pub struct Connection<R> {
    peer: SocketAddr,
    simulator: TelemetrySimulator<R>,
}

impl<R: Rng> Connection<R> {
    pub fn new(peer: SocketAddr, simulator: TelemetrySimulator<R>) -> Self {
        Self { peer, simulator }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    #[cfg(test)]
    pub fn simulator_mut(&mut self) -> &mut TelemetrySimulator<R> {
        &mut self.simulator
    }

    /// Handles one binary frame. The payload is treated like text when it
    /// is valid UTF-8 and dropped as malformed otherwise.
    pub fn handle_binary(&mut self, payload: &[u8]) -> Option<String> {
        match std::str::from_utf8(payload) {
            Ok(text) => self.handle_text(text),
            Err(_) => {
                debug!("[{}] Dropping non-UTF-8 binary frame", self.peer);
                None
            }
        }
    }

    /// Handles one text frame and returns the reply to send, if any.
    ///
    /// Malformed frames and unrecognized commands produce no reply.
    pub fn handle_text(&mut self, text: &str) -> Option<String> {
        let Some(request) = Request::parse(text) else {
            debug!("[{}] Dropping malformed frame", self.peer);
            return None;
        };

        match request.command() {
            Command::GetTelemetry => {
                let snapshot = self.simulator.next_snapshot();
                match snapshot.to_json() {
                    Ok(reply) => Some(reply),
                    Err(e) => {
                        warn!("[{}] Failed to encode telemetry: {}", self.peer, e);
                        None
                    }
                }
            }
            Command::Unknown(command) => {
                debug!("[{}] Ignoring unknown command '{}'", self.peer, command);
                None
            }
            Command::Missing => {
                debug!("[{}] Ignoring request without command", self.peer);
                None
            }
        }
    }
}

/// Serve one upgraded WebSocket until the peer goes away.
///
/// Transport errors end this connection only; they are logged and swallowed.
pub async fn serve_connection<S, R>(mut ws: WebSocketStream<S>, mut connection: Connection<R>)
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: Rng,
{
    let peer = connection.peer();
    info!("Client connected: {}", peer);

    while let Some(frame) = ws.next().await {
        let reply = match frame {
            Ok(Message::Text(text)) => connection.handle_text(&text),
            Ok(Message::Binary(payload)) => connection.handle_binary(&payload),
            // Ping/pong and close replies are handled by the transport.
            Ok(_) => None,
            Err(e) => {
                debug!("[{}] Connection ended: {}", peer, e);
                break;
            }
        };
        let Some(reply) = reply else {
            continue;
        };
        if let Err(e) = ws.send(Message::Text(reply)).await {
            debug!("[{}] Send failed: {}", peer, e);
            break;
        }
    }

    info!("Client disconnected: {}", peer);
}
