//! Connection tracking and per-connection message handling.

use super::codec;
use super::protocol::{ErrorCode, ErrorPayload, WireMessage};
use super::sink::{FrameSink, TransportError};
use ace_application::{ConverseError, SessionOrchestrator};
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Text frames read ahead of the one being handled.
const INBOUND_BUFFER: usize = 32;

/// Opaque identifier of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first group is plenty to tell connections apart in logs.
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

/// Tracks live connections and runs each one's read-dispatch-reply loop.
///
/// Shared across connection tasks behind an `Arc`. The only shared mutable
/// state is the active set; everything conversational lives in the
/// orchestrator's history store.
pub struct ConnectionManager {
    orchestrator: Arc<SessionOrchestrator>,
    active: RwLock<HashMap<ConnectionId, SocketAddr>>,
}

impl ConnectionManager {
    pub fn new(orchestrator: Arc<SessionOrchestrator>) -> Self {
        Self {
            orchestrator,
            active: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection from `peer`.
    pub async fn accept(&self, peer: SocketAddr) -> ConnectionId {
        let id = ConnectionId::new();
        let mut active = self.active.write().await;
        active.insert(id, peer);
        info!("Client {} connected from {} ({} active)", id, peer, active.len());
        id
    }

    /// Deregister a connection. Returns `false` if it was already gone.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut active = self.active.write().await;
        let removed = active.remove(&id).is_some();
        if removed {
            info!("Client {} disconnected ({} active)", id, active.len());
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Handle one raw text frame, writing every reply to `sink`.
    ///
    /// Protocol, backend and persistence failures are reported to the peer
    /// and leave the connection usable. Only a failed write is returned.
    /// Once `closed` fires, an in-flight response is dropped unfinished.
    pub async fn dispatch<K>(
        &self,
        sink: &mut K,
        raw: &str,
        closed: &CancellationToken,
    ) -> Result<(), TransportError>
    where
        K: FrameSink + ?Sized,
    {
        let message = match codec::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!("Rejected frame: {}", e);
                return sink.send_text(codec::encode_error(&e)).await;
            }
        };

        match message {
            WireMessage::ConnectionPing => {
                sink.send_text(codec::encode(&WireMessage::ConnectionPong))
                    .await
            }
            WireMessage::UserInputText(input) => {
                self.respond(sink, &input.session_id, &input.text, closed)
                    .await
            }
            // decode never yields outgoing variants
            other => {
                warn!("Ignoring unexpected {} message", other.kind());
                Ok(())
            }
        }
    }

    /// Stream the orchestrator's answer to `sink`.
    ///
    /// One fragment is held back so the last frame can carry
    /// `isPartial: false`. An empty response still sends one final frame.
    async fn respond<K>(
        &self,
        sink: &mut K,
        session_id: &str,
        text: &str,
        closed: &CancellationToken,
    ) -> Result<(), TransportError>
    where
        K: FrameSink + ?Sized,
    {
        let mut stream = match self.orchestrator.handle_user_message(session_id, text).await {
            Ok(stream) => stream,
            Err(e) => return sink.send_text(error_frame(&e, session_id)).await,
        };

        let mut pending: Option<String> = None;
        loop {
            let next = tokio::select! {
                biased;
                _ = closed.cancelled() => {
                    // Dropping the stream stops the backend call.
                    debug!(session_id, "Peer gone, abandoning response");
                    return Ok(());
                }
                next = stream.next_fragment() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    if let Some(previous) = pending.replace(fragment) {
                        sink.send_text(response_frame(previous, true, session_id))
                            .await?;
                    }
                }
                Some(Err(e)) => {
                    if let Some(previous) = pending.take() {
                        sink.send_text(response_frame(previous, true, session_id))
                            .await?;
                    }
                    return sink.send_text(error_frame(&e, session_id)).await;
                }
                None => {
                    let last = pending.take().unwrap_or_default();
                    return sink.send_text(response_frame(last, false, session_id)).await;
                }
            }
        }
    }

    /// Run one upgraded WebSocket until the peer leaves, the transport
    /// fails, or `shutdown` fires.
    ///
    /// Frames are handled strictly one at a time. A separate reader keeps
    /// watching the socket so a disconnect is noticed mid-response.
    pub async fn serve(&self, socket: WebSocket, peer: SocketAddr, shutdown: CancellationToken) {
        let id = self.accept(peer).await;
        let (mut sender, receiver) = socket.split();

        let closed = shutdown.child_token();
        let (inbound_tx, mut inbound) = mpsc::channel(INBOUND_BUFFER);
        let reader = tokio::spawn(read_frames(id, receiver, inbound_tx, closed.clone()));

        loop {
            let text = tokio::select! {
                biased;
                _ = closed.cancelled() => break,
                text = inbound.recv() => match text {
                    Some(text) => text,
                    None => break,
                },
            };

            if let Err(e) = self.dispatch(&mut sender, &text, &closed).await {
                warn!("Client {}: {}", id, e);
                break;
            }
        }

        if shutdown.is_cancelled() {
            debug!("Closing client {} for shutdown", id);
            let _ = sender.send(Message::Close(None)).await;
        }
        reader.abort();
        self.disconnect(id).await;
    }
}

/// Forward text frames until the socket closes, then fire `closed`.
///
/// Pings are answered by the WebSocket layer itself.
async fn read_frames(
    id: ConnectionId,
    mut receiver: SplitStream<WebSocket>,
    inbound: mpsc::Sender<String>,
    closed: CancellationToken,
) {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if inbound.send(text.as_str().to_owned()).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => debug!("Client {}: ignoring non-text frame", id),
            Err(e) => {
                warn!("Client {}: WebSocket error: {}", id, e);
                break;
            }
        }
    }
    closed.cancel();
}

fn response_frame(text: String, is_partial: bool, session_id: &str) -> String {
    codec::encode(&WireMessage::response(text, is_partial, session_id))
}

fn error_frame(error: &ConverseError, session_id: &str) -> String {
    let code = match error {
        ConverseError::Gateway(_) => ErrorCode::BackendError,
        ConverseError::History(_) => ErrorCode::PersistenceError,
    };
    let payload = ErrorPayload {
        code,
        message: error.to_string(),
        context: None,
    }
    .with_context(session_id);
    codec::encode(&WireMessage::Error(payload))
}
