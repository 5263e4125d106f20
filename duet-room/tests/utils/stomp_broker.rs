use duet_core::{ClientEvent, Round, ServerEvent};
use duet_room::transport::stomp::{Command, Frame, Incoming};
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// How the test broker answers CONNECT.
#[derive(Clone)]
pub enum StompScript {
    Accept,
    RejectConnect(String),
}

/// Minimal STOMP-over-WebSocket broker on a local port.
///
/// Records every client frame and answers a game start with the configured rounds.
pub struct StompTestBroker {
    pub url: String,
    frames: Arc<Mutex<Vec<Frame>>>,
    task: JoinHandle<()>,
}

impl StompTestBroker {
    pub async fn start(script: StompScript, rounds: Vec<Round>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test broker");
        let addr = listener.local_addr().expect("Listener has an address");
        let frames = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(serve(listener, script, rounds, frames.clone()));

        Self {
            url: format!("ws://{}/stomp/chat", addr),
            frames,
            task,
        }
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn find(&self, command: Command) -> Option<Frame> {
        self.frames().into_iter().find(|f| f.command == command)
    }

    pub async fn wait_for_frame(&self, command: Command, timeout_ms: u64) -> Option<Frame> {
        let start = Instant::now();
        loop {
            if let Some(frame) = self.find(command) {
                return Some(frame);
            }
            if start.elapsed() > Duration::from_millis(timeout_ms) {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for StompTestBroker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    listener: TcpListener,
    script: StompScript,
    rounds: Vec<Round>,
    frames: Arc<Mutex<Vec<Frame>>>,
) {
    while let Ok((tcp, _)) = listener.accept().await {
        let Ok(ws) = accept_async(tcp).await else {
            continue;
        };
        let (mut sink, mut stream) = ws.split();
        let mut subscription: Option<(String, String)> = None;
        let mut next_message = 0u32;

        while let Some(Ok(message)) = stream.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let Ok(Incoming::Frame(frame)) = Frame::decode(text.as_bytes()) else {
                continue;
            };
            tracing::info!("[StompTestBroker] received {}", frame.command.as_str());
            frames.lock().unwrap().push(frame.clone());

            let reply = match frame.command {
                Command::Connect => match &script {
                    StompScript::Accept => Some(
                        Frame::new(Command::Connected)
                            .header("version", "1.2")
                            .header("heart-beat", "0,0"),
                    ),
                    StompScript::RejectConnect(reason) => {
                        Some(Frame::new(Command::Error).header("message", reason.clone()))
                    }
                },
                Command::Subscribe => {
                    subscription = frame
                        .get("id")
                        .zip(frame.get("destination"))
                        .map(|(id, dest)| (id.to_owned(), dest.to_owned()));
                    None
                }
                Command::Send => match (ClientEvent::decode(&frame.body), &subscription) {
                    (Ok(ClientEvent::GameStart), Some((id, destination))) => {
                        next_message += 1;
                        let event = ServerEvent::GameStarted {
                            rounds: rounds.clone(),
                        };
                        Some(
                            Frame::new(Command::Message)
                                .header("subscription", id.clone())
                                .header("message-id", format!("m-{}", next_message))
                                .header("destination", destination.clone())
                                .header("content-type", "application/json")
                                .with_body(event.encode()),
                        )
                    }
                    _ => None,
                },
                Command::Disconnect => break,
                _ => None,
            };

            if let Some(reply) = reply {
                let text = String::from_utf8(reply.encode()).expect("Test frames are UTF-8");
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    }
}
