//! The Transport component (`spec.md` §4.1): owns at most one live duplex
//! connection, frames outbound events with a stamped `event_id`, parses
//! inbound frames, and fans them out on a named event bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::RealtimeConfig;
use crate::error::{map_deserialization_error, RealtimeError};
use crate::event_emitter::EventEmitter;
use crate::traits::EventType;
use crate::types::realtime::{RealtimeClientEvent, RealtimeServerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = futures_util::stream::SplitSink<WsStream, Message>;

/// The payload carried on the Transport's event bus: either a locally
/// originated client event (`client.<type>`/`client.*`) or a dispatched
/// server event (`server.<type>`/`server.*`), exactly the two buses
/// `spec.md` §4.1 describes.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Client(RealtimeClientEvent),
    Server(RealtimeServerEvent),
}

/// Generates event ids of the shape `<prefix><utc-milliseconds>`
/// (`spec.md` §4.1 "Event id generation"). Collisions within the same
/// process millisecond are tolerated — the id is opaque to the server.
fn generate_event_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{prefix}{millis}")
}

/// Owns the single duplex connection to the realtime endpoint.
pub struct Transport<C: RealtimeConfig> {
    config: C,
    event_id_prefix: String,
    sink: AsyncMutex<Option<WsSink>>,
    pump: AsyncMutex<Option<JoinHandle<()>>>,
    connected: AtomicBool,
    emitter: Arc<EventEmitter<TransportEvent>>,
}

impl<C: RealtimeConfig + Clone + 'static> Transport<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            event_id_prefix: "evt_".to_string(),
            sink: AsyncMutex::new(None),
            pump: AsyncMutex::new(None),
            connected: AtomicBool::new(false),
            emitter: Arc::new(EventEmitter::new()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Subscribes `handler` to a named event, e.g. `server.response.created`,
    /// `server.*`, `client.session.update`, or `client.*`.
    pub fn on<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(TransportEvent) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.emitter.on(name, handler);
    }

    pub async fn wait_for_next(&self, name: impl Into<String>) -> TransportEvent {
        self.emitter.wait_for_next(name).await
    }

    pub fn clear_subscriptions(&self) {
        self.emitter.clear_all();
    }

    /// Opens the duplex stream and begins the inbound pump. Fails if already
    /// connected.
    pub async fn connect(&self) -> Result<(), RealtimeError> {
        if self.connected.swap(true, Ordering::SeqCst) {
            return Err(RealtimeError::AlreadyConnected);
        }

        let mut request = self
            .config
            .url()
            .into_client_request()
            .map_err(RealtimeError::Transport)?;
        {
            let headers = request.headers_mut();
            for (name, value) in self.config.headers().iter() {
                headers.insert(name, value.clone());
            }
        }

        let (stream, _response) = match connect_async(request).await {
            Ok(pair) => pair,
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                return Err(RealtimeError::Transport(e));
            }
        };
        let (write, mut read) = stream.split();
        *self.sink.lock().await = Some(write);

        let emitter = self.emitter.clone();
        let handle = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!("realtime transport read error: {e}");
                        break;
                    }
                };
                let text = match message {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };
                Self::handle_inbound_frame(&emitter, &text);
            }
        });
        *self.pump.lock().await = Some(handle);

        Ok(())
    }

    fn handle_inbound_frame(emitter: &Arc<EventEmitter<TransportEvent>>, text: &str) {
        let raw: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("dropping non-JSON inbound frame");
                return;
            }
        };
        if raw.get("type").and_then(|t| t.as_str()) == Some("error") {
            tracing::error!(frame = %text, "server reported an error event");
        }
        let event: RealtimeServerEvent = match serde_json::from_value(raw) {
            Ok(event) => event,
            Err(e) => {
                let _ = map_deserialization_error(e, text.as_bytes());
                return;
            }
        };
        tracing::debug!(event_type = event.event_type(), "received server event");
        let name = format!("server.{}", event.event_type());
        emitter.dispatch(&name, TransportEvent::Server(event.clone()));
        emitter.dispatch("server.*", TransportEvent::Server(event));
    }

    /// Stamps `event_id`, dispatches locally to `client.<type>`/`client.*`,
    /// and transmits the event as a JSON text frame. Fails if disconnected.
    pub async fn send(&self, mut event: RealtimeClientEvent) -> Result<(), RealtimeError> {
        if !self.is_connected() {
            return Err(RealtimeError::NotConnected);
        }
        event.set_event_id(generate_event_id(&self.event_id_prefix));
        tracing::debug!(event_type = event.event_type(), "sending client event");

        let name = format!("client.{}", event.event_type());
        self.emitter.dispatch(&name, TransportEvent::Client(event.clone()));
        self.emitter.dispatch("client.*", TransportEvent::Client(event.clone()));

        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(RealtimeError::NotConnected)?;
        sink.send(Message::from(event))
            .await
            .map_err(RealtimeError::Transport)
    }

    /// Closes the stream. Idempotent.
    pub async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
        if let Some(handle) = self.pump.lock().await.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::realtime::server_event::{ErrorEvent, SessionCreatedEvent};

    #[test]
    fn dropping_non_json_frame_does_not_panic() {
        let emitter: Arc<EventEmitter<TransportEvent>> = Arc::new(EventEmitter::new());
        Transport::<crate::config::DirectConfig>::handle_inbound_frame(&emitter, "not json");
    }

    #[test]
    fn unknown_event_type_is_dropped_not_fatal() {
        let emitter: Arc<EventEmitter<TransportEvent>> = Arc::new(EventEmitter::new());
        Transport::<crate::config::DirectConfig>::handle_inbound_frame(
            &emitter,
            r#"{"type": "not.a.real.event", "event_id": "evt_1"}"#,
        );
    }

    #[test]
    fn session_created_and_error_still_parse_through_the_same_path() {
        let raw = serde_json::to_string(&RealtimeServerEvent::SessionCreated(SessionCreatedEvent {
            event_id: "evt_1".to_string(),
            session: Default::default(),
        }))
        .unwrap();
        let emitter: Arc<EventEmitter<TransportEvent>> = Arc::new(EventEmitter::new());
        Transport::<crate::config::DirectConfig>::handle_inbound_frame(&emitter, &raw);

        let raw_err = serde_json::to_string(&RealtimeServerEvent::Error(ErrorEvent {
            event_id: "evt_2".to_string(),
            error: crate::error::RealtimeApiError {
                r#type: Some("invalid_request_error".to_string()),
                code: None,
                message: "boom".to_string(),
                param: None,
                event_id: None,
            },
        }))
        .unwrap();
        Transport::<crate::config::DirectConfig>::handle_inbound_frame(&emitter, &raw_err);
    }
}
