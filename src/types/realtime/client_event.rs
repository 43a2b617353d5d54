//! Outbound (client-to-server) wire events. One struct per event carries an
//! optional `event_id` the [`crate::transport::Transport`] stamps in before
//! sending, mirroring `async-openai::types::realtime::client_event`'s
//! per-event structs plus its `RealtimeClientEvent` tagged enum.

use serde::{Deserialize, Serialize};

use crate::types::realtime::{item::ConversationItem, response::ResponseCreateParams, session::SessionConfig};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SessionUpdateEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub session: SessionConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ConversationItemCreateEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_item_id: Option<String>,
    pub item: ConversationItem,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ConversationItemDeleteEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ConversationItemTruncateEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
    pub content_index: u32,
    pub audio_end_ms: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct InputAudioBufferAppendEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub audio: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct InputAudioBufferCommitEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ResponseCreateEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseCreateParams>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ResponseCancelEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

/// The closed set of outbound event types the core emits (`spec.md` §6).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum RealtimeClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate(SessionUpdateEvent),
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate(ConversationItemCreateEvent),
    #[serde(rename = "conversation.item.delete")]
    ConversationItemDelete(ConversationItemDeleteEvent),
    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate(ConversationItemTruncateEvent),
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend(InputAudioBufferAppendEvent),
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit(InputAudioBufferCommitEvent),
    #[serde(rename = "response.create")]
    ResponseCreate(ResponseCreateEvent),
    #[serde(rename = "response.cancel")]
    ResponseCancel(ResponseCancelEvent),
}

impl RealtimeClientEvent {
    /// Stamps `event_id` on the enclosed event if it is not already set,
    /// matching the Transport's `send` contract: "stamps `event_id`".
    pub fn set_event_id(&mut self, event_id: String) {
        macro_rules! set {
            ($e:ident) => {
                if $e.event_id.is_none() {
                    $e.event_id = Some(event_id);
                }
            };
        }
        match self {
            RealtimeClientEvent::SessionUpdate(e) => set!(e),
            RealtimeClientEvent::ConversationItemCreate(e) => set!(e),
            RealtimeClientEvent::ConversationItemDelete(e) => set!(e),
            RealtimeClientEvent::ConversationItemTruncate(e) => set!(e),
            RealtimeClientEvent::InputAudioBufferAppend(e) => set!(e),
            RealtimeClientEvent::InputAudioBufferCommit(e) => set!(e),
            RealtimeClientEvent::ResponseCreate(e) => set!(e),
            RealtimeClientEvent::ResponseCancel(e) => set!(e),
        }
    }
}

macro_rules! impl_event_type {
    ($($ty:ty => $event_type:expr),* $(,)?) => {
        $(
            impl crate::traits::EventType for $ty {
                fn event_type(&self) -> &'static str {
                    $event_type
                }
            }
        )*
    };
}

impl_event_type! {
    SessionUpdateEvent => "session.update",
    ConversationItemCreateEvent => "conversation.item.create",
    ConversationItemDeleteEvent => "conversation.item.delete",
    ConversationItemTruncateEvent => "conversation.item.truncate",
    InputAudioBufferAppendEvent => "input_audio_buffer.append",
    InputAudioBufferCommitEvent => "input_audio_buffer.commit",
    ResponseCreateEvent => "response.create",
    ResponseCancelEvent => "response.cancel",
}

impl crate::traits::EventType for RealtimeClientEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RealtimeClientEvent::SessionUpdate(e) => e.event_type(),
            RealtimeClientEvent::ConversationItemCreate(e) => e.event_type(),
            RealtimeClientEvent::ConversationItemDelete(e) => e.event_type(),
            RealtimeClientEvent::ConversationItemTruncate(e) => e.event_type(),
            RealtimeClientEvent::InputAudioBufferAppend(e) => e.event_type(),
            RealtimeClientEvent::InputAudioBufferCommit(e) => e.event_type(),
            RealtimeClientEvent::ResponseCreate(e) => e.event_type(),
            RealtimeClientEvent::ResponseCancel(e) => e.event_type(),
        }
    }
}

impl From<RealtimeClientEvent> for tokio_tungstenite::tungstenite::Message {
    fn from(value: RealtimeClientEvent) -> Self {
        // The wire set (`spec.md` §6) is a closed, always-serializable enum;
        // a serialization failure here would be a bug in this crate, not
        // caller misuse, so we fall back to an empty object rather than panic.
        let text = serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string());
        tokio_tungstenite::tungstenite::Message::Text(text.into())
    }
}

macro_rules! from_event_variant {
    ($from_ty:ty, $variant:ident) => {
        impl From<$from_ty> for RealtimeClientEvent {
            fn from(value: $from_ty) -> Self {
                RealtimeClientEvent::$variant(value)
            }
        }
    };
}

from_event_variant!(SessionUpdateEvent, SessionUpdate);
from_event_variant!(ConversationItemCreateEvent, ConversationItemCreate);
from_event_variant!(ConversationItemDeleteEvent, ConversationItemDelete);
from_event_variant!(ConversationItemTruncateEvent, ConversationItemTruncate);
from_event_variant!(InputAudioBufferAppendEvent, InputAudioBufferAppend);
from_event_variant!(InputAudioBufferCommitEvent, InputAudioBufferCommit);
from_event_variant!(ResponseCreateEvent, ResponseCreate);
from_event_variant!(ResponseCancelEvent, ResponseCancel);
