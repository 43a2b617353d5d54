//! Inbound (server-to-client) wire events: the closed set the Conversation
//! Store reduces over (`spec.md` §4.2) plus `session.created`/`error`
//! (`spec.md` §6). Structured the same way as
//! `async-openai::types::realtime::server_event`.

use serde::{Deserialize, Serialize};

use crate::{
    error::RealtimeApiError,
    types::realtime::{
        item::{ContentPart, ConversationItem},
        response::ResponseResource,
        session::SessionResource,
    },
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionCreatedEvent {
    pub event_id: String,
    pub session: SessionResource,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorEvent {
    pub event_id: String,
    pub error: RealtimeApiError,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationItemCreatedEvent {
    pub event_id: String,
    pub item: ConversationItem,
    #[serde(default)]
    pub previous_item_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationItemTruncatedEvent {
    pub event_id: String,
    pub item_id: String,
    pub content_index: u32,
    pub audio_end_ms: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationItemDeletedEvent {
    pub event_id: String,
    pub item_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationItemInputAudioTranscriptionCompletedEvent {
    pub event_id: String,
    pub item_id: String,
    pub content_index: u32,
    pub transcript: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InputAudioBufferSpeechStartedEvent {
    pub event_id: String,
    pub item_id: String,
    pub audio_start_ms: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InputAudioBufferSpeechStoppedEvent {
    pub event_id: String,
    pub item_id: String,
    pub audio_end_ms: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseCreatedEvent {
    pub event_id: String,
    pub response: ResponseResource,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseOutputItemAddedEvent {
    pub event_id: String,
    pub response_id: String,
    pub item: ConversationItem,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseOutputItemDoneEvent {
    pub event_id: String,
    pub response_id: String,
    pub item: ConversationItem,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseContentPartAddedEvent {
    pub event_id: String,
    pub item_id: String,
    pub content_index: u32,
    pub part: ContentPart,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseAudioTranscriptDeltaEvent {
    pub event_id: String,
    pub item_id: String,
    pub content_index: u32,
    pub delta: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseAudioDeltaEvent {
    pub event_id: String,
    pub item_id: String,
    pub content_index: u32,
    /// Base64-encoded raw PCM bytes; decoded by the store, never interpreted
    /// as PCM16 samples directly (`spec.md` §4.2 `response.audio.delta`).
    pub delta: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseTextDeltaEvent {
    pub event_id: String,
    pub item_id: String,
    pub content_index: u32,
    pub delta: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseFunctionCallArgumentsDeltaEvent {
    pub event_id: String,
    pub item_id: String,
    pub call_id: String,
    pub delta: String,
}

/// The closed set of inbound event types the Conversation Store and Client
/// react to (`spec.md` §4.2, §6).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum RealtimeServerEvent {
    #[serde(rename = "session.created")]
    SessionCreated(SessionCreatedEvent),
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "conversation.item.created")]
    ConversationItemCreated(ConversationItemCreatedEvent),
    #[serde(rename = "conversation.item.truncated")]
    ConversationItemTruncated(ConversationItemTruncatedEvent),
    #[serde(rename = "conversation.item.deleted")]
    ConversationItemDeleted(ConversationItemDeletedEvent),
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    ConversationItemInputAudioTranscriptionCompleted(
        ConversationItemInputAudioTranscriptionCompletedEvent,
    ),
    #[serde(rename = "input_audio_buffer.speech_started")]
    InputAudioBufferSpeechStarted(InputAudioBufferSpeechStartedEvent),
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    InputAudioBufferSpeechStopped(InputAudioBufferSpeechStoppedEvent),
    #[serde(rename = "response.created")]
    ResponseCreated(ResponseCreatedEvent),
    #[serde(rename = "response.output_item.added")]
    ResponseOutputItemAdded(ResponseOutputItemAddedEvent),
    #[serde(rename = "response.output_item.done")]
    ResponseOutputItemDone(ResponseOutputItemDoneEvent),
    #[serde(rename = "response.content_part.added")]
    ResponseContentPartAdded(ResponseContentPartAddedEvent),
    #[serde(rename = "response.audio_transcript.delta")]
    ResponseAudioTranscriptDelta(ResponseAudioTranscriptDeltaEvent),
    #[serde(rename = "response.audio.delta")]
    ResponseAudioDelta(ResponseAudioDeltaEvent),
    #[serde(rename = "response.text.delta")]
    ResponseTextDelta(ResponseTextDeltaEvent),
    #[serde(rename = "response.function_call_arguments.delta")]
    ResponseFunctionCallArgumentsDelta(ResponseFunctionCallArgumentsDeltaEvent),
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
    SessionCreatedEvent => "session.created",
    ErrorEvent => "error",
    ConversationItemCreatedEvent => "conversation.item.created",
    ConversationItemTruncatedEvent => "conversation.item.truncated",
    ConversationItemDeletedEvent => "conversation.item.deleted",
    ConversationItemInputAudioTranscriptionCompletedEvent => "conversation.item.input_audio_transcription.completed",
    InputAudioBufferSpeechStartedEvent => "input_audio_buffer.speech_started",
    InputAudioBufferSpeechStoppedEvent => "input_audio_buffer.speech_stopped",
    ResponseCreatedEvent => "response.created",
    ResponseOutputItemAddedEvent => "response.output_item.added",
    ResponseOutputItemDoneEvent => "response.output_item.done",
    ResponseContentPartAddedEvent => "response.content_part.added",
    ResponseAudioTranscriptDeltaEvent => "response.audio_transcript.delta",
    ResponseAudioDeltaEvent => "response.audio.delta",
    ResponseTextDeltaEvent => "response.text.delta",
    ResponseFunctionCallArgumentsDeltaEvent => "response.function_call_arguments.delta",
}

impl crate::traits::EventType for RealtimeServerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RealtimeServerEvent::SessionCreated(e) => e.event_type(),
            RealtimeServerEvent::Error(e) => e.event_type(),
            RealtimeServerEvent::ConversationItemCreated(e) => e.event_type(),
            RealtimeServerEvent::ConversationItemTruncated(e) => e.event_type(),
            RealtimeServerEvent::ConversationItemDeleted(e) => e.event_type(),
            RealtimeServerEvent::ConversationItemInputAudioTranscriptionCompleted(e) => {
                e.event_type()
            }
            RealtimeServerEvent::InputAudioBufferSpeechStarted(e) => e.event_type(),
            RealtimeServerEvent::InputAudioBufferSpeechStopped(e) => e.event_type(),
            RealtimeServerEvent::ResponseCreated(e) => e.event_type(),
            RealtimeServerEvent::ResponseOutputItemAdded(e) => e.event_type(),
            RealtimeServerEvent::ResponseOutputItemDone(e) => e.event_type(),
            RealtimeServerEvent::ResponseContentPartAdded(e) => e.event_type(),
            RealtimeServerEvent::ResponseAudioTranscriptDelta(e) => e.event_type(),
            RealtimeServerEvent::ResponseAudioDelta(e) => e.event_type(),
            RealtimeServerEvent::ResponseTextDelta(e) => e.event_type(),
            RealtimeServerEvent::ResponseFunctionCallArgumentsDelta(e) => e.event_type(),
        }
    }
}
