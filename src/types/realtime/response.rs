//! Response resource and `response.create` params, mirroring
//! `async-openai::types::realtime::{RealtimeResponse, RealtimeResponseCreateParams}`
//! trimmed to the fields the Conversation Store and Client depend on.

use serde::{Deserialize, Serialize};

use crate::types::realtime::session::{MaxResponseOutputTokens, ToolChoice, ToolDefinition};

/// A server-initiated generation bundle (`spec.md` §3, "Response"). The
/// store only ever learns `id` and appends to `output`; richer fields
/// (`usage`, `status_details`) are carried opaquely since the store does not
/// interpret them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseResource {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

/// Optional overrides a caller may pass to `response.create`; `None` fields
/// fall back to the current session configuration, matching the original's
/// `create_response()` which sends a bare `{}` unless told otherwise.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseCreateParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_response_output_tokens: Option<MaxResponseOutputTokens>,
}
