//! The Client component (`spec.md` §4.3): composes [`Transport`] and
//! [`ConversationStore`], owns session configuration and the tool registry,
//! translates application actions into wire events, and drives the
//! tool-invocation loop.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::audio::sample_index_to_ms;
use crate::config::RealtimeConfig;
use crate::conversation::{ConversationStore, Delta, FormattedTool, ItemPayload, StoreItem};
use crate::error::RealtimeError;
use crate::event_emitter::EventEmitter;
use crate::transport::{Transport, TransportEvent};
use crate::types::realtime::item::{ContentPart, ContentPartType, ConversationItem, ItemRole, ItemStatus};
use crate::types::realtime::{
    ConversationItemCreateEvent, ConversationItemDeleteEvent, ConversationItemTruncateEvent,
    InputAudioBufferAppendEvent, InputAudioBufferCommitEvent, RealtimeClientEvent,
    ResponseCancelEvent, ResponseCreateEvent, SessionConfig, ToolDefinition,
};

/// A JSON-serializable tool result, or an error message on failure. Failures
/// are caught by the tool-call loop and materialized as a
/// `function_call_output` carrying `{error}` — never surfaced to callers of
/// this crate (`spec.md` §4.3, §7).
pub type ToolResult = Result<serde_json::Value, String>;

type BoxToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;
type ToolHandler = Arc<dyn Fn(serde_json::Value) -> BoxToolFuture + Send + Sync>;

/// The tool registry: definitions merged into `session.tools` plus the
/// handlers invoked by the tool-call loop (`spec.md` §4.3).
#[derive(Default)]
struct ToolRegistry {
    tools: HashMap<String, (ToolDefinition, ToolHandler)>,
}

impl ToolRegistry {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|(def, _)| def.clone()).collect()
    }

    fn get(&self, name: &str) -> Option<(ToolDefinition, ToolHandler)> {
        self.tools.get(name).cloned()
    }

    fn clear(&mut self) {
        self.tools.clear();
    }
}

/// Which side of the wire an event mirrored on `realtime.event` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Client,
    Server,
}

/// The payload shape of every application-subscribable name listed in
/// `spec.md` §4.3 "Observable outbound events".
#[derive(Debug, Clone)]
pub enum ClientEvent {
    RealtimeEvent {
        source: EventSource,
        event: serde_json::Value,
    },
    ConversationUpdated {
        item: StoreItem,
        delta: Option<Delta>,
    },
    ItemAppended {
        item: StoreItem,
    },
    ItemCompleted {
        item: StoreItem,
    },
    Interrupted {
        item_id: String,
        audio_start_ms: u32,
    },
}

/// Composes [`Transport`] and [`ConversationStore`]; the single entry point
/// applications drive.
pub struct RealtimeClient<C: RealtimeConfig + Clone + 'static> {
    transport: Arc<Transport<C>>,
    store: Arc<AsyncMutex<ConversationStore>>,
    session: Arc<AsyncMutex<SessionConfig>>,
    tools: Arc<AsyncMutex<ToolRegistry>>,
    input_audio_buffer: Arc<AsyncMutex<Vec<u8>>>,
    sample_rate: u32,
    session_created: Arc<AtomicBool>,
    events: Arc<EventEmitter<ClientEvent>>,
}

impl<C: RealtimeConfig + Clone + 'static> RealtimeClient<C> {
    /// Builds a client bound to `sample_rate` for the lifetime of its store
    /// (`spec.md` §9 "Sample-rate source") and wires the engine's own
    /// internal subscriptions on the transport bus.
    pub fn new(config: C, sample_rate: u32) -> Arc<Self> {
        let this = Arc::new(Self {
            transport: Arc::new(Transport::new(config)),
            store: Arc::new(AsyncMutex::new(ConversationStore::new(sample_rate))),
            session: Arc::new(AsyncMutex::new(SessionConfig::default())),
            tools: Arc::new(AsyncMutex::new(ToolRegistry::default())),
            input_audio_buffer: Arc::new(AsyncMutex::new(Vec::new())),
            sample_rate,
            session_created: Arc::new(AtomicBool::new(false)),
            events: Arc::new(EventEmitter::new()),
        });
        this.wire_internal_handlers();
        this
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn is_session_created(&self) -> bool {
        self.session_created.load(Ordering::SeqCst)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub async fn session_config(&self) -> SessionConfig {
        self.session.lock().await.clone()
    }

    pub async fn get_item(&self, id: &str) -> Option<StoreItem> {
        self.store.lock().await.get_item(id).cloned()
    }

    pub async fn get_items(&self) -> Vec<StoreItem> {
        self.store.lock().await.get_items()
    }

    /// Subscribes `handler` to an application-facing event name (one of
    /// `realtime.event`, `conversation.updated`, `conversation.item.appended`,
    /// `conversation.item.completed`, `conversation.interrupted`).
    pub fn on<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(ClientEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.events.on(name, handler);
    }

    pub async fn wait_for_next_item(&self) -> StoreItem {
        match self.events.wait_for_next("conversation.item.appended").await {
            ClientEvent::ItemAppended { item } => item,
            other => unreachable!("conversation.item.appended always carries ItemAppended: {other:?}"),
        }
    }

    /// Resolves once `session.created` has been received. Fails immediately
    /// if not connected (mirrors the original assistant's
    /// `wait_for_session_created`).
    pub async fn wait_for_session_created(&self) -> Result<(), RealtimeError> {
        if !self.is_connected() {
            return Err(RealtimeError::NotConnected);
        }
        while !self.is_session_created() {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        Ok(())
    }

    pub async fn wait_for_next_completed_item(&self) -> StoreItem {
        match self.events.wait_for_next("conversation.item.completed").await {
            ClientEvent::ItemCompleted { item } => item,
            other => unreachable!("conversation.item.completed always carries ItemCompleted: {other:?}"),
        }
    }

    /// Opens the transport, then sends `session.update` with the current
    /// (possibly default) session configuration. Fails if already connected.
    pub async fn connect(&self) -> Result<(), RealtimeError> {
        self.transport.connect().await?;
        self.update_session(SessionConfig::empty()).await
    }

    /// Closes the transport and clears the store. `session_created` resets
    /// to `false`.
    pub async fn disconnect(&self) -> Result<(), RealtimeError> {
        self.transport.disconnect().await;
        self.store.lock().await.clear();
        self.session_created.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Disconnects, clears the transport's own subscriptions, resets session
    /// configuration and tool registry to defaults, empties the store, and
    /// re-installs the engine's internal subscriptions. Application
    /// subscriptions on this client's own event bus are left untouched
    /// (`spec.md` §5 "Reset discipline").
    pub async fn reset(self: &Arc<Self>) {
        self.transport.disconnect().await;
        self.transport.clear_subscriptions();
        self.store.lock().await.clear();
        *self.session.lock().await = SessionConfig::default();
        self.tools.lock().await.clear();
        self.input_audio_buffer.lock().await.clear();
        self.session_created.store(false, Ordering::SeqCst);
        self.wire_internal_handlers();
    }

    /// Merges `partial` into the session config, rebuilds `tools` as the
    /// union of the session's own tool list and the registry, and — if
    /// connected — sends `session.update`.
    pub async fn update_session(&self, partial: SessionConfig) -> Result<(), RealtimeError> {
        {
            let mut session = self.session.lock().await;
            session.merge(partial);
        }
        self.push_session_update().await
    }

    /// Explicitly sets turn detection, including clearing it to `None`.
    /// `update_session`'s merge only ever applies `Some` fields (a shallow
    /// kwargs-style merge), so disabling turn detection — a valid, explicit
    /// session state `create_response` branches on (`spec.md` §4.3) — needs
    /// its own setter rather than going through `merge`.
    pub async fn set_turn_detection(
        &self,
        turn_detection: Option<crate::types::realtime::TurnDetection>,
    ) -> Result<(), RealtimeError> {
        {
            let mut session = self.session.lock().await;
            session.turn_detection = turn_detection;
        }
        self.push_session_update().await
    }

    async fn push_session_update(&self) -> Result<(), RealtimeError> {
        let merged = {
            let session = self.session.lock().await;
            let tools = self.tools.lock().await;
            let mut use_tools = session.tools.clone().unwrap_or_default();
            use_tools.extend(tools.definitions());
            let mut merged = session.clone();
            merged.tools = Some(use_tools);
            merged
        };
        if self.transport.is_connected() {
            self.transport
                .send(RealtimeClientEvent::SessionUpdate(
                    crate::types::realtime::SessionUpdateEvent {
                        event_id: None,
                        session: merged,
                    },
                ))
                .await?;
        }
        Ok(())
    }

    /// Registers a tool. `handler` receives the parsed `arguments` object
    /// and returns a JSON-serializable result or an error message.
    pub async fn add_tool<F, Fut>(
        &self,
        definition: ToolDefinition,
        handler: F,
    ) -> Result<(), RealtimeError>
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        let name = definition.name().to_string();
        if name.is_empty() {
            return Err(RealtimeError::InvalidArgument(
                "tool name must not be empty".to_string(),
            ));
        }
        {
            let mut tools = self.tools.lock().await;
            if tools.tools.contains_key(&name) {
                return Err(RealtimeError::InvalidArgument(format!(
                    "tool already registered: {name}"
                )));
            }
            let boxed: ToolHandler = Arc::new(move |args| Box::pin(handler(args)));
            tools.tools.insert(name, (definition, boxed));
        }
        self.update_session(SessionConfig::empty()).await
    }

    pub async fn remove_tool(&self, name: &str) -> Result<(), RealtimeError> {
        {
            let mut tools = self.tools.lock().await;
            if tools.tools.remove(name).is_none() {
                return Err(RealtimeError::InvalidArgument(format!(
                    "tool not registered: {name}"
                )));
            }
        }
        self.update_session(SessionConfig::empty()).await
    }

    /// Creates a user message item from `content` (unless empty) and always
    /// triggers `create_response()`.
    pub async fn send_user_message_content(&self, content: Vec<ContentPart>) -> Result<(), RealtimeError> {
        if !content.is_empty() {
            self.create_conversation_item(ConversationItem::new_user_message(content))
                .await?;
        }
        self.create_response().await
    }

    /// Base64-encodes `bytes` and sends `input_audio_buffer.append`; also
    /// extends the local buffer `create_response` later drains. A no-op send
    /// for an empty slice, matching the original assistant's guard.
    pub async fn append_input_audio(&self, bytes: &[u8]) -> Result<(), RealtimeError> {
        if bytes.is_empty() {
            if !self.transport.is_connected() {
                return Err(RealtimeError::NotConnected);
            }
            return Ok(());
        }
        let audio = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes);
        self.transport
            .send(RealtimeClientEvent::InputAudioBufferAppend(
                InputAudioBufferAppendEvent {
                    event_id: None,
                    audio,
                },
            ))
            .await?;
        self.input_audio_buffer.lock().await.extend_from_slice(bytes);
        Ok(())
    }

    /// If turn detection is disabled and the local input buffer is
    /// non-empty, commits the buffer and stashes it in the store via
    /// `queue_input_audio` before issuing `response.create` — the only path
    /// that attaches user audio to the next user message item.
    pub async fn create_response(&self) -> Result<(), RealtimeError> {
        if !self.transport.is_connected() {
            return Err(RealtimeError::NotConnected);
        }
        let turn_detection_enabled = self.session.lock().await.turn_detection.is_some();
        if !turn_detection_enabled {
            let drained = {
                let mut buffer = self.input_audio_buffer.lock().await;
                if buffer.is_empty() {
                    None
                } else {
                    Some(std::mem::take(&mut *buffer))
                }
            };
            if let Some(drained) = drained {
                self.transport
                    .send(RealtimeClientEvent::InputAudioBufferCommit(
                        InputAudioBufferCommitEvent { event_id: None },
                    ))
                    .await?;
                self.store.lock().await.queue_input_audio(drained);
            }
        }
        self.transport
            .send(RealtimeClientEvent::ResponseCreate(ResponseCreateEvent {
                event_id: None,
                response: None,
            }))
            .await
    }

    /// Cancels any in-progress response without truncating a specific item.
    pub async fn cancel_response(&self) -> Result<(), RealtimeError> {
        self.transport
            .send(RealtimeClientEvent::ResponseCancel(ResponseCancelEvent {
                event_id: None,
                response_id: None,
            }))
            .await
    }

    /// Cancels the in-progress response and truncates `item_id` at
    /// `sample_count` samples. `item_id` must name an assistant message
    /// item with an audio content part.
    pub async fn cancel_response_and_truncate(
        &self,
        item_id: &str,
        sample_count: usize,
    ) -> Result<(), RealtimeError> {
        let content_index = {
            let store = self.store.lock().await;
            let item = store.get_item(item_id).ok_or_else(|| {
                RealtimeError::InvalidArgument(format!("unknown item: {item_id}"))
            })?;
            let ItemPayload::Message { role, content } = &item.payload else {
                return Err(RealtimeError::InvalidArgument(
                    "cancel_response_and_truncate target must be a message item".to_string(),
                ));
            };
            if *role != ItemRole::Assistant {
                return Err(RealtimeError::InvalidArgument(
                    "cancel_response_and_truncate target must be an assistant message".to_string(),
                ));
            }
            content
                .iter()
                .position(|part| matches!(part.kind, Some(ContentPartType::Audio)))
                .ok_or_else(|| {
                    RealtimeError::InvalidArgument(
                        "item has no audio content part".to_string(),
                    )
                })?
        };

        self.cancel_response().await?;

        let audio_end_ms = sample_index_to_ms(sample_count, self.sample_rate);
        self.transport
            .send(RealtimeClientEvent::ConversationItemTruncate(
                ConversationItemTruncateEvent {
                    event_id: None,
                    item_id: item_id.to_string(),
                    content_index: content_index as u32,
                    audio_end_ms,
                },
            ))
            .await
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<(), RealtimeError> {
        self.transport
            .send(RealtimeClientEvent::ConversationItemDelete(
                ConversationItemDeleteEvent {
                    event_id: None,
                    item_id: item_id.to_string(),
                },
            ))
            .await
    }

    pub async fn create_conversation_item(&self, item: ConversationItem) -> Result<(), RealtimeError> {
        self.transport
            .send(RealtimeClientEvent::ConversationItemCreate(
                ConversationItemCreateEvent {
                    event_id: None,
                    previous_item_id: None,
                    item,
                },
            ))
            .await
    }

    async fn process_and_emit(
        self: &Arc<Self>,
        event: crate::types::realtime::server_event::RealtimeServerEvent,
        input_audio: Option<Vec<u8>>,
    ) -> Option<StoreItem> {
        let result = {
            let mut store = self.store.lock().await;
            store.process_event(event, input_audio.as_deref())
        };
        match result {
            Ok((item, delta)) => {
                if let Some(item) = &item {
                    self.events.dispatch(
                        "conversation.updated",
                        ClientEvent::ConversationUpdated {
                            item: item.clone(),
                            delta,
                        },
                    );
                }
                item
            }
            Err(e) => {
                tracing::error!("conversation store rejected event: {e}");
                None
            }
        }
    }

    async fn run_tool_call(self: Arc<Self>, tool: FormattedTool) {
        let output_json = match serde_json::from_str::<serde_json::Value>(&tool.arguments) {
            Ok(args) => {
                let handler = {
                    let tools = self.tools.lock().await;
                    tools.get(&tool.name)
                };
                match handler {
                    None => serde_json::json!({ "error": format!("tool not registered: {}", tool.name) }),
                    Some((_, handler)) => match handler(args).await {
                        Ok(value) => value,
                        Err(message) => {
                            tracing::error!("tool call error: {message}");
                            serde_json::json!({ "error": message })
                        }
                    },
                }
            }
            Err(e) => {
                tracing::error!("tool call error: invalid arguments: {e}");
                serde_json::json!({ "error": format!("invalid arguments: {e}") })
            }
        };
        let output_str = serde_json::to_string(&output_json).unwrap_or_else(|_| "null".to_string());
        let item = ConversationItem::new_function_call_output(tool.call_id.clone(), output_str);
        if let Err(e) = self.create_conversation_item(item).await {
            tracing::error!("failed to send function_call_output: {e}");
            return;
        }
        if let Err(e) = self.create_response().await {
            tracing::error!("failed to trigger response after tool call: {e}");
        }
    }

    fn wire_internal_handlers(self: &Arc<Self>) {
        let diag = self.clone();
        self.transport.on("server.*", move |event| {
            let diag = diag.clone();
            async move {
                if let TransportEvent::Server(server_event) = event {
                    diag.events.dispatch(
                        "realtime.event",
                        ClientEvent::RealtimeEvent {
                            source: EventSource::Server,
                            event: serde_json::to_value(&server_event).unwrap_or(serde_json::Value::Null),
                        },
                    );
                }
            }
        });
        let diag = self.clone();
        self.transport.on("client.*", move |event| {
            let diag = diag.clone();
            async move {
                if let TransportEvent::Client(client_event) = event {
                    diag.events.dispatch(
                        "realtime.event",
                        ClientEvent::RealtimeEvent {
                            source: EventSource::Client,
                            event: serde_json::to_value(&client_event).unwrap_or(serde_json::Value::Null),
                        },
                    );
                }
            }
        });

        let sc = self.clone();
        self.transport.on("server.session.created", move |_event| {
            let sc = sc.clone();
            async move {
                sc.session_created.store(true, Ordering::SeqCst);
            }
        });

        macro_rules! wire_passthrough {
            ($name:expr) => {{
                let this = self.clone();
                self.transport.on($name, move |event| {
                    let this = this.clone();
                    async move {
                        if let TransportEvent::Server(server_event) = event {
                            this.process_and_emit(server_event, None).await;
                        }
                    }
                });
            }};
        }
        wire_passthrough!("server.conversation.item.truncated");
        wire_passthrough!("server.conversation.item.deleted");
        wire_passthrough!("server.conversation.item.input_audio_transcription.completed");
        wire_passthrough!("server.response.created");
        wire_passthrough!("server.response.output_item.added");
        wire_passthrough!("server.response.content_part.added");
        wire_passthrough!("server.response.audio_transcript.delta");
        wire_passthrough!("server.response.audio.delta");
        wire_passthrough!("server.response.text.delta");
        wire_passthrough!("server.response.function_call_arguments.delta");

        let created = self.clone();
        self.transport.on("server.conversation.item.created", move |event| {
            let created = created.clone();
            async move {
                if let TransportEvent::Server(server_event) = event {
                    if let Some(item) = created.process_and_emit(server_event, None).await {
                        created
                            .events
                            .dispatch("conversation.item.appended", ClientEvent::ItemAppended { item: item.clone() });
                        if item.status == ItemStatus::Completed {
                            created
                                .events
                                .dispatch("conversation.item.completed", ClientEvent::ItemCompleted { item });
                        }
                    }
                }
            }
        });

        let started = self.clone();
        self.transport.on("server.input_audio_buffer.speech_started", move |event| {
            let started = started.clone();
            async move {
                if let TransportEvent::Server(server_event) = event {
                    if let crate::types::realtime::server_event::RealtimeServerEvent::InputAudioBufferSpeechStarted(ref e) = server_event {
                        started.events.dispatch(
                            "conversation.interrupted",
                            ClientEvent::Interrupted {
                                item_id: e.item_id.clone(),
                                audio_start_ms: e.audio_start_ms,
                            },
                        );
                    }
                    started.process_and_emit(server_event, None).await;
                }
            }
        });

        let stopped = self.clone();
        self.transport.on("server.input_audio_buffer.speech_stopped", move |event| {
            let stopped = stopped.clone();
            async move {
                if let TransportEvent::Server(server_event) = event {
                    let buffer = stopped.input_audio_buffer.lock().await.clone();
                    stopped.process_and_emit(server_event, Some(buffer)).await;
                }
            }
        });

        let done = self.clone();
        self.transport.on("server.response.output_item.done", move |event| {
            let done = done.clone();
            async move {
                if let TransportEvent::Server(server_event) = event {
                    if let Some(item) = done.process_and_emit(server_event, None).await {
                        let newly_completed = item.status == ItemStatus::Completed;
                        if newly_completed {
                            done.events
                                .dispatch("conversation.item.completed", ClientEvent::ItemCompleted { item: item.clone() });
                        }
                        if newly_completed {
                            if let Some(tool) = item.formatted.tool.clone() {
                                let done = done.clone();
                                tokio::spawn(async move { done.run_tool_call(tool).await });
                            }
                        }
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectConfig;

    fn client() -> Arc<RealtimeClient<DirectConfig>> {
        RealtimeClient::new(DirectConfig::new().with_api_key("test-key"), 24_000)
    }

    #[tokio::test]
    async fn add_tool_rejects_empty_name() {
        let client = client();
        let definition = ToolDefinition::Function {
            name: String::new(),
            description: "does nothing".to_string(),
            parameters: serde_json::json!({}),
        };
        let result = client.add_tool(definition, |_args| async { Ok(serde_json::Value::Null) }).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn add_tool_rejects_duplicates() {
        let client = client();
        let definition = || ToolDefinition::Function {
            name: "get_time".to_string(),
            description: "returns the time".to_string(),
            parameters: serde_json::json!({}),
        };
        client
            .add_tool(definition(), |_args| async { Ok(serde_json::json!("12:00")) })
            .await
            .unwrap();
        let second = client
            .add_tool(definition(), |_args| async { Ok(serde_json::json!("12:00")) })
            .await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn remove_tool_requires_prior_registration() {
        let client = client();
        let result = client.remove_tool("nonexistent").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn create_response_without_connection_fails_not_connected() {
        let client = client();
        let result = client.create_response().await;
        assert!(matches!(result, Err(RealtimeError::NotConnected)));
    }

    #[tokio::test]
    async fn append_input_audio_without_connection_fails() {
        let client = client();
        let result = client.append_input_audio(&[1, 2, 3, 4]).await;
        assert!(matches!(result, Err(RealtimeError::NotConnected)));
    }
}
