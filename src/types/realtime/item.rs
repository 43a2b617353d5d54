//! Conversation item types: the wire shape exchanged in `conversation.item.*`
//! events, mirroring `async-openai::types::realtime`'s `RealtimeConversationItem`
//! split into one struct per item type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    InProgress,
    Completed,
    Incomplete,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentPartType {
    InputText,
    InputAudio,
    Text,
    Audio,
}

/// One entry of a message item's `content` array. `text`/`transcript` are
/// present only for the content-part kinds that carry them; the store fills
/// `transcript` in place as `response.audio_transcript.delta` /
/// `conversation.item.input_audio_transcription.completed` events arrive.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: Option<ContentPartType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl ContentPart {
    pub fn input_text(text: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentPartType::InputText),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentPartType::Text),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// `audio` is the base64-encoded PCM16 payload, matching
    /// `array_buffer_to_base64` in the original assistant.
    pub fn input_audio(audio_base64: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentPartType::InputAudio),
            audio: Some(audio_base64.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Option<ItemRole>,
    #[serde(default)]
    pub content: Vec<ContentPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct FunctionCallItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub call_id: String,
    #[serde(default)]
    pub arguments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct FunctionCallOutputItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call_id: String,
    pub output: String,
}

/// A single item within a realtime conversation, as exchanged on
/// `conversation.item.create`/`conversation.item.created` and friends.
///
/// This is the wire shape; the store's internal [`crate::conversation::StoreItem`]
/// wraps one of these plus the derived `formatted` projection (`spec.md` §3).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    Message(MessageItem),
    FunctionCall(FunctionCallItem),
    FunctionCallOutput(FunctionCallOutputItem),
}

impl ConversationItem {
    pub fn id(&self) -> Option<&str> {
        match self {
            ConversationItem::Message(m) => m.id.as_deref(),
            ConversationItem::FunctionCall(f) => f.id.as_deref(),
            ConversationItem::FunctionCallOutput(f) => f.id.as_deref(),
        }
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        match self {
            ConversationItem::Message(m) => m.id = Some(id),
            ConversationItem::FunctionCall(f) => f.id = Some(id),
            ConversationItem::FunctionCallOutput(f) => f.id = Some(id),
        }
    }

    pub fn new_user_message(content: Vec<ContentPart>) -> Self {
        ConversationItem::Message(MessageItem {
            id: None,
            role: Some(ItemRole::User),
            content,
            status: None,
        })
    }

    pub fn new_function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        ConversationItem::FunctionCallOutput(FunctionCallOutputItem {
            id: None,
            call_id: call_id.into(),
            output: output.into(),
        })
    }
}

impl crate::traits::EventType for ConversationItem {
    fn event_type(&self) -> &'static str {
        match self {
            ConversationItem::Message(_) => "message",
            ConversationItem::FunctionCall(_) => "function_call",
            ConversationItem::FunctionCallOutput(_) => "function_call_output",
        }
    }
}
