use super::frame::{Command, Frame, FrameError, Incoming};
use crate::error::TransportError;
use crate::transport::connector::{Connection, Connector, HeartbeatPolicy};
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::LinkEvent;
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use duet_core::RoomId;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use uuid::Uuid;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

const ACCEPT_VERSION: &str = "1.2,1.1,1.0";

/// Connects to a STOMP broker over a plain WebSocket.
#[derive(Debug, Default, Clone, Copy)]
pub struct StompConnector;

#[async_trait]
impl Connector for StompConnector {
    async fn connect(
        &self,
        room: RoomId,
        config: &TransportConfig,
        event_tx: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let (ws, _response) = connect_async(config.broker_url.as_str())
            .await
            .with_context(|| format!("websocket connect to {}", config.broker_url))
            .map_err(TransportError::Connect)?;
        let (mut sink, mut stream) = ws.split();

        let mut connect = Frame::new(Command::Connect)
            .header("accept-version", ACCEPT_VERSION)
            .header(
                "heart-beat",
                format!(
                    "{},{}",
                    millis(config.heartbeat_outgoing),
                    millis(config.heartbeat_incoming)
                ),
            );
        if let Some(credential) = &config.credential {
            connect = connect.header("Authorization", credential.bearer());
        }
        send_frame(&mut sink, &connect).await?;

        let connected = await_connected(&mut stream).await?;
        let policy = negotiate_heartbeat(config, connected.get("heart-beat"));
        debug!(
            room = %room,
            version = connected.get("version").unwrap_or("1.0"),
            ?policy,
            "STOMP session established"
        );

        let subscription = format!("sub-{}", Uuid::new_v4());
        let destination = config.subscribe_destination(room);
        let subscribe = Frame::new(Command::Subscribe)
            .header("id", &subscription)
            .header("destination", &destination)
            .header("ack", "auto");
        send_frame(&mut sink, &subscribe).await?;
        info!(room = %room, %destination, "Subscribed to room topic");

        let reader = tokio::spawn(read_loop(stream, event_tx));
        Ok(Box::new(StompConnection {
            sink: Mutex::new(sink),
            destination: config.publish_destination(room),
            subscription,
            policy,
            reader,
        }))
    }
}

struct StompConnection {
    sink: Mutex<WsSink>,
    destination: String,
    subscription: String,
    policy: HeartbeatPolicy,
    reader: JoinHandle<()>,
}

#[async_trait]
impl Connection for StompConnection {
    async fn publish(&self, payload: Bytes) -> Result<(), TransportError> {
        let frame = Frame::new(Command::Send)
            .header("destination", &self.destination)
            .header("content-type", "application/json")
            .with_body(payload);
        let mut sink = self.sink.lock().await;
        send_frame(&mut sink, &frame).await
    }

    async fn send_heartbeat(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(Message::Text("\n".to_owned()))
            .await
            .context("heartbeat send failed")?;
        Ok(())
    }

    async fn close(&self) {
        let mut sink = self.sink.lock().await;
        let unsubscribe = Frame::new(Command::Unsubscribe).header("id", &self.subscription);
        if let Err(e) = send_frame(&mut sink, &unsubscribe).await {
            debug!("Skipping graceful STOMP close: {}", e);
        } else {
            let _ = send_frame(&mut sink, &Frame::new(Command::Disconnect)).await;
        }
        let _ = sink.close().await;
        self.reader.abort();
    }

    fn heartbeat(&self) -> HeartbeatPolicy {
        self.policy
    }
}

impl Drop for StompConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Applies the STOMP heart-beat rule: each direction runs at the slower of
/// the two proposals and is disabled if either side proposes zero.
pub fn negotiate_heartbeat(config: &TransportConfig, server: Option<&str>) -> HeartbeatPolicy {
    let (server_out, server_in) = server.and_then(parse_heartbeat).unwrap_or((0, 0));
    let pick = |ours: u64, theirs: u64| {
        (ours != 0 && theirs != 0).then(|| Duration::from_millis(ours.max(theirs)))
    };
    HeartbeatPolicy {
        outgoing: pick(millis(config.heartbeat_outgoing), server_in),
        incoming: pick(millis(config.heartbeat_incoming), server_out),
    }
}

fn parse_heartbeat(value: &str) -> Option<(u64, u64)> {
    let (out, inc) = value.split_once(',')?;
    Some((out.trim().parse().ok()?, inc.trim().parse().ok()?))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn to_message(frame: &Frame) -> Message {
    match String::from_utf8(frame.encode()) {
        Ok(text) => Message::Text(text),
        Err(e) => Message::Binary(e.into_bytes()),
    }
}

async fn send_frame(sink: &mut WsSink, frame: &Frame) -> Result<(), TransportError> {
    sink.send(to_message(frame))
        .await
        .with_context(|| format!("sending {} frame", frame.command.as_str()))?;
    Ok(())
}

fn error_reason(frame: &Frame) -> String {
    frame
        .get("message")
        .map(str::to_owned)
        .unwrap_or_else(|| String::from_utf8_lossy(&frame.body).into_owned())
}

enum WsEvent {
    Stomp(Incoming),
    Liveness,
    Closed,
    Ignored,
}

fn classify(message: Message) -> Result<WsEvent, FrameError> {
    match message {
        Message::Text(text) => Frame::decode(text.as_bytes()).map(WsEvent::Stomp),
        Message::Binary(data) => Frame::decode(&data).map(WsEvent::Stomp),
        Message::Ping(_) | Message::Pong(_) => Ok(WsEvent::Liveness),
        Message::Close(_) => Ok(WsEvent::Closed),
        Message::Frame(_) => Ok(WsEvent::Ignored),
    }
}

async fn await_connected(stream: &mut WsRead) -> Result<Frame, TransportError> {
    while let Some(message) = stream.next().await {
        let message = message.context("websocket receive failed")?;
        let event = classify(message).map_err(|e| TransportError::Handshake(e.to_string()))?;
        match event {
            WsEvent::Stomp(Incoming::Frame(frame)) => match frame.command {
                Command::Connected => return Ok(frame),
                Command::Error => return Err(TransportError::Rejected(error_reason(&frame))),
                other => debug!("Ignoring {} before CONNECTED", other.as_str()),
            },
            WsEvent::Closed => return Err(TransportError::Closed),
            WsEvent::Stomp(Incoming::Heartbeat) | WsEvent::Liveness | WsEvent::Ignored => {}
        }
    }
    Err(TransportError::Closed)
}

async fn read_loop(mut stream: WsRead, event_tx: mpsc::Sender<LinkEvent>) {
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                debug!("WebSocket read failed: {}", e);
                break;
            }
        };

        let event = match classify(message) {
            Ok(WsEvent::Stomp(Incoming::Heartbeat)) | Ok(WsEvent::Liveness) => LinkEvent::Heartbeat,
            Ok(WsEvent::Stomp(Incoming::Frame(frame))) => match frame.command {
                Command::Message => LinkEvent::Message {
                    id: frame.get("message-id").map(str::to_owned),
                    payload: frame.body,
                },
                Command::Error => LinkEvent::Error(error_reason(&frame)),
                other => {
                    debug!("Ignoring inbound {} frame", other.as_str());
                    continue;
                }
            },
            Ok(WsEvent::Closed) => break,
            Ok(WsEvent::Ignored) => continue,
            Err(e) => {
                warn!("Discarding undecodable STOMP frame: {}", e);
                continue;
            }
        };

        if event_tx.send(event).await.is_err() {
            return;
        }
    }
    let _ = event_tx.send(LinkEvent::Disconnected).await;
}
