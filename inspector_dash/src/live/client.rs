//! Socket.IO websocket client with automatic reconnect

use super::{Backoff, StreamStatus};
use crate::dashboard::DashboardMsg;
use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, Stream, StreamExt};
use inspector_common::{EnginePacket, OpenHandshake, ServerEvent, SocketPacket};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Time allowed for the Engine.IO and namespace handshakes
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// One established Socket.IO session
pub struct LiveConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    handshake: OpenHandshake,
}

impl LiveConnection {
    /// Connect and complete both the Engine.IO and the namespace handshake
    pub async fn open(url: &str) -> Result<Self> {
        let (mut ws, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to live stream at {}", url))?;

        let handshake = loop {
            let msg = tokio::time::timeout(HANDSHAKE_TIMEOUT, ws.next())
                .await
                .context("Timeout waiting for Engine.IO handshake")?
                .ok_or_else(|| anyhow!("Connection closed before handshake"))?
                .context("WebSocket error")?;

            if let Message::Text(text) = msg {
                match EnginePacket::decode(text.as_str())? {
                    EnginePacket::Open(handshake) => break handshake,
                    other => bail!("Expected open packet, got {:?}", other),
                }
            }
        };
        tracing::debug!("Engine.IO session {} opened", handshake.sid);

        let mut conn = Self { ws, handshake };
        conn.send(EnginePacket::message(&SocketPacket::connect()))
            .await
            .context("Failed to join namespace")?;

        loop {
            match conn.next_packet(HANDSHAKE_TIMEOUT).await? {
                Some(SocketPacket::Connect { .. }) => return Ok(conn),
                Some(packet @ SocketPacket::ConnectError { .. }) => bail!(
                    "Backend refused connection: {}",
                    packet.error_message().unwrap_or_default()
                ),
                Some(other) => tracing::debug!("Ignoring packet before connect ack: {:?}", other),
                None => bail!("Connection closed before namespace connect"),
            }
        }
    }

    pub fn handshake(&self) -> &OpenHandshake {
        &self.handshake
    }

    async fn send(&mut self, packet: EnginePacket) -> Result<()> {
        self.ws.send(Message::Text(packet.encode().into())).await?;
        Ok(())
    }

    /// Next Socket.IO packet, answering pings on the way.
    ///
    /// `Ok(None)` means the backend closed the connection.
    async fn next_packet(&mut self, silence: Duration) -> Result<Option<SocketPacket>> {
        loop {
            let msg = match tokio::time::timeout(silence, self.ws.next()).await {
                Ok(Some(msg)) => msg.context("WebSocket error")?,
                Ok(None) => return Ok(None),
                Err(_) => bail!("No traffic for {:?}, connection presumed dead", silence),
            };

            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => return Ok(None),
                _ => continue,
            };

            match EnginePacket::decode(text.as_str()) {
                Ok(EnginePacket::Ping(data)) => {
                    self.send(EnginePacket::Pong(data))
                        .await
                        .context("Failed to answer ping")?;
                }
                Ok(EnginePacket::Message(data)) => match SocketPacket::decode(&data) {
                    Ok(packet) => return Ok(Some(packet)),
                    Err(e) => tracing::warn!("Skipping undecodable Socket.IO packet: {}", e),
                },
                Ok(EnginePacket::Close) => return Ok(None),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping undecodable frame: {}", e),
            }
        }
    }

    /// Next application event, `Ok(None)` once the session ends
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>> {
        let liveness = self.handshake.liveness_timeout();
        loop {
            match self.next_packet(liveness).await? {
                Some(SocketPacket::Event { name, args, .. }) => {
                    match ServerEvent::from_event(&name, args) {
                        Ok(event) => return Ok(Some(event)),
                        Err(e) => tracing::warn!("Skipping malformed {} event: {}", name, e),
                    }
                }
                Some(SocketPacket::Disconnect { .. }) | None => return Ok(None),
                Some(packet @ SocketPacket::ConnectError { .. }) => {
                    bail!(
                        "Backend dropped session: {}",
                        packet.error_message().unwrap_or_default()
                    )
                }
                Some(_) => {}
            }
        }
    }

    /// The session as a stream of events; an error ends the stream
    pub fn events(self) -> impl Stream<Item = Result<ServerEvent>> {
        async_stream::stream! {
            let mut conn = self;
            loop {
                match conn.next_event().await {
                    Ok(Some(event)) => yield Ok(event),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
    }
}

/// Start the live subscription.
///
/// The task keeps reconnecting until it is aborted or the receiving side of
/// `tx` is dropped.
pub fn spawn_subscriber(
    url: String,
    backoff: Backoff,
    tx: mpsc::Sender<DashboardMsg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_subscriber(url, backoff, tx).await;
        tracing::debug!("Live subscriber stopped");
    })
}

async fn run_subscriber(url: String, mut backoff: Backoff, tx: mpsc::Sender<DashboardMsg>) {
    let mut status = StreamStatus::Connecting;

    loop {
        if tx.send(DashboardMsg::StreamStatus(status)).await.is_err() {
            return;
        }

        match LiveConnection::open(&url).await {
            Ok(conn) => {
                backoff.reset();
                tracing::info!(
                    "Live stream online (session {}, ping every {}ms)",
                    conn.handshake().sid,
                    conn.handshake().ping_interval
                );
                if tx
                    .send(DashboardMsg::StreamStatus(StreamStatus::Online))
                    .await
                    .is_err()
                {
                    return;
                }

                let events = conn.events();
                tokio::pin!(events);
                while let Some(event) = events.next().await {
                    match event {
                        Ok(ServerEvent::NewRequest(record)) => {
                            if tx.send(DashboardMsg::LiveRequest(record)).await.is_err() {
                                return;
                            }
                        }
                        Ok(ServerEvent::Other { name }) => {
                            tracing::debug!("Ignoring {} event", name);
                        }
                        Err(e) => tracing::warn!("Live stream interrupted: {:#}", e),
                    }
                }
                status = StreamStatus::Reconnecting;
            }
            Err(e) => {
                tracing::warn!("Live stream connection failed: {:#}", e);
                status = StreamStatus::Offline;
            }
        }

        if tx.send(DashboardMsg::StreamStatus(status)).await.is_err() {
            return;
        }
        let delay = backoff.next_delay();
        tracing::debug!("Reconnecting live stream in {:?}", delay);
        tokio::time::sleep(delay).await;
        status = StreamStatus::Reconnecting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::{Message as AxumMessage, WebSocket, WebSocketUpgrade};
    use axum::routing::get;
    use axum::Router;

    const OPEN: &str =
        r#"0{"sid":"eio-1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

    /// Fake backend: sends `script` after the namespace connect, then echoes
    /// every frame it receives to `seen`.
    async fn fake_backend(
        connect_reply: &'static str,
        script: Vec<String>,
    ) -> (String, mpsc::UnboundedReceiver<String>) {
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();

        let app = Router::new().route(
            "/socket.io/",
            get(move |ws: WebSocketUpgrade| {
                let script = script.clone();
                let seen_tx = seen_tx.clone();
                async move {
                    ws.on_upgrade(move |socket| serve(socket, connect_reply, script, seen_tx))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (
            format!("ws://{}/socket.io/?EIO=4&transport=websocket", addr),
            seen_rx,
        )
    }

    async fn serve(
        mut socket: WebSocket,
        connect_reply: &'static str,
        script: Vec<String>,
        seen: mpsc::UnboundedSender<String>,
    ) {
        if socket.send(AxumMessage::Text(OPEN.into())).await.is_err() {
            return;
        }

        while let Some(Ok(msg)) = socket.recv().await {
            if let AxumMessage::Text(text) = msg {
                let _ = seen.send(text.as_str().to_string());
                if text.as_str() == "40" {
                    break;
                }
            }
        }

        if socket
            .send(AxumMessage::Text(connect_reply.into()))
            .await
            .is_err()
        {
            return;
        }
        for frame in script {
            if socket.send(AxumMessage::Text(frame.into())).await.is_err() {
                return;
            }
        }

        while let Some(Ok(msg)) = socket.recv().await {
            if let AxumMessage::Text(text) = msg {
                let _ = seen.send(text.as_str().to_string());
            }
        }
    }

    fn new_request_frame(path: &str) -> String {
        format!(r#"42["new_request",{{"method":"POST","path":"{}"}}]"#, path)
    }

    #[tokio::test]
    async fn test_connection_yields_new_requests() {
        let (url, mut seen) = fake_backend(
            r#"40{"sid":"sio-1"}"#,
            vec![
                "2".to_string(),
                r#"42["status",{"ok":true}]"#.to_string(),
                "4garbage".to_string(),
                new_request_frame("/first"),
                new_request_frame("/second"),
                "41".to_string(),
            ],
        )
        .await;

        let conn = LiveConnection::open(&url).await.unwrap();
        assert_eq!(conn.handshake().sid, "eio-1");

        let events: Vec<ServerEvent> = conn
            .events()
            .map(|event| event.unwrap())
            .collect()
            .await;

        let paths: Vec<String> = events
            .iter()
            .filter_map(|event| match event {
                ServerEvent::NewRequest(record) => Some(record.path_str().to_string()),
                ServerEvent::Other { .. } => None,
            })
            .collect();
        assert_eq!(paths, vec!["/first", "/second"]);
        assert!(events.contains(&ServerEvent::Other {
            name: "status".to_string()
        }));

        assert_eq!(seen.recv().await.as_deref(), Some("40"));
        assert_eq!(seen.recv().await.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_connect_error_is_reported() {
        let (url, _seen) = fake_backend(
            r#"44{"message":"Connection rejected by server"}"#,
            Vec::new(),
        )
        .await;

        let error = LiveConnection::open(&url).await.err().unwrap();

        assert!(format!("{:#}", error).contains("Connection rejected by server"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = LiveConnection::open(&format!("ws://{}/socket.io/?EIO=4", addr)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_subscriber_publishes_status_and_records() {
        let (url, _seen) = fake_backend(
            r#"40{"sid":"sio-1"}"#,
            vec![new_request_frame("/live")],
        )
        .await;
        let (tx, mut rx) = mpsc::channel(16);

        let handle = spawn_subscriber(url, Backoff::default(), tx);

        assert!(matches!(
            rx.recv().await,
            Some(DashboardMsg::StreamStatus(StreamStatus::Connecting))
        ));
        assert!(matches!(
            rx.recv().await,
            Some(DashboardMsg::StreamStatus(StreamStatus::Online))
        ));
        match rx.recv().await {
            Some(DashboardMsg::LiveRequest(record)) => assert_eq!(record.path_str(), "/live"),
            other => panic!("Unexpected message: {:?}", other),
        }

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_subscriber_stops_when_receiver_dropped() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let handle = spawn_subscriber(
            format!("ws://{}/socket.io/", addr),
            Backoff::new(Duration::from_millis(10), Duration::from_millis(20)),
            tx,
        );

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
