//! Listener bootstrap and accept loop.

use anyhow::Context;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use super::connection::{Connection, serve_connection};
use crate::config::{ServerConfig, SimulationConfig};
use crate::telemetry::TelemetrySimulator;

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Bind the listening socket. Failing here is fatal for the process.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = config.listen_addr();
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind telemetry server to {}", addr))
}

/// Accept clients forever, one task per connection.
pub async fn serve(listener: TcpListener, simulation: SimulationConfig) -> anyhow::Result<()> {
    let local_addr = listener.local_addr().context("Listener has no local address")?;
    info!("Starting telemetry server on ws://{}", local_addr);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                continue;
            }
        };

        tokio::spawn(async move {
            match accept_async(stream).await {
                Ok(ws) => {
                    let simulator = TelemetrySimulator::new(StdRng::from_entropy(), simulation);
                    serve_connection(ws, Connection::new(peer, simulator)).await;
                }
                Err(e) => warn!("WebSocket handshake with {} failed: {}", peer, e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use std::net::SocketAddr;
    use tokio::net::TcpStream;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    const GET_TELEMETRY: &str = r#"{"command": "get_telemetry"}"#;
    const QUIET_PERIOD: Duration = Duration::from_millis(200);

    fn loopback_config(perturbation: bool) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            simulation: SimulationConfig { perturbation },
        }
    }

    async fn start_server(perturbation: bool) -> SocketAddr {
        let listener = bind(&loopback_config(perturbation)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, SimulationConfig { perturbation }));
        addr
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        ws
    }

    async fn request(client: &mut Client, text: &str) {
        client.send(Message::Text(text.to_string())).await.unwrap();
    }

    async fn next_json(client: &mut Client) -> serde_json::Value {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("no reply in time")
            .expect("stream ended")
            .unwrap();
        serde_json::from_str(&frame.into_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn replies_to_get_telemetry() {
        let addr = start_server(false).await;
        let mut client = connect(addr).await;

        request(&mut client, GET_TELEMETRY).await;
        let value = next_json(&mut client).await;

        assert_eq!(value["joints"].as_object().unwrap().len(), 18);
        assert_eq!(value["joints"]["leg_1_femur"], 45);
        assert_eq!(value["voltage"].as_f64(), Some(6.1));
        assert_eq!(value["current"].as_f64(), Some(3.0));
    }

    #[tokio::test]
    async fn junk_and_unknown_commands_are_silent() {
        let addr = start_server(false).await;
        let mut client = connect(addr).await;

        request(&mut client, "definitely not json").await;
        request(&mut client, r#"{"command": "get_status"}"#).await;
        request(&mut client, r#"{"payload": 1}"#).await;
        client.send(Message::Binary(vec![0xff, 0xfe, 0x00])).await.unwrap();
        assert!(timeout(QUIET_PERIOD, client.next()).await.is_err());

        // The connection survived and still answers.
        request(&mut client, GET_TELEMETRY).await;
        let value = next_json(&mut client).await;
        assert_eq!(value["voltage"].as_f64(), Some(6.1));
        assert!(timeout(QUIET_PERIOD, client.next()).await.is_err());
    }

    #[tokio::test]
    async fn binary_request_gets_text_reply() {
        let addr = start_server(false).await;
        let mut client = connect(addr).await;

        client
            .send(Message::Binary(br#"{"command": "get_telemetry"}"#.to_vec()))
            .await
            .unwrap();
        let value = next_json(&mut client).await;
        assert_eq!(value["joints"].as_object().unwrap().len(), 18);
        assert_eq!(value["current"].as_f64(), Some(3.0));
    }

    #[tokio::test]
    async fn clients_are_served_concurrently() {
        let addr = start_server(true).await;
        let mut first = connect(addr).await;
        let mut second = connect(addr).await;

        for _ in 0..20 {
            request(&mut first, GET_TELEMETRY).await;
            request(&mut second, GET_TELEMETRY).await;
            let a = next_json(&mut second).await;
            let b = next_json(&mut first).await;
            for value in [a, b] {
                let voltage = value["voltage"].as_f64().unwrap();
                let current = value["current"].as_f64().unwrap();
                assert!(voltage > 5.5 && voltage <= 6.1);
                assert!(current > 1.9 && current <= 3.0);
            }
        }

        // Closing one client leaves the other working.
        first.close(None).await.unwrap();
        request(&mut second, GET_TELEMETRY).await;
        assert_eq!(next_json(&mut second).await["joints"]["leg_6_tibia"], -45);
    }

    #[tokio::test]
    async fn bind_fails_when_port_is_taken() {
        let taken = bind(&loopback_config(false)).await.unwrap();
        let mut config = loopback_config(false);
        config.port = taken.local_addr().unwrap().port();

        let err = bind(&config).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind"));
    }
}
