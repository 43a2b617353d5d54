use derive_builder::Builder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum AudioFormat {
    #[serde(rename = "pcm16")]
    PCM16,
    #[serde(rename = "g711_ulaw")]
    G711ULAW,
    #[serde(rename = "g711_alaw")]
    G711ALAW,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct AudioTranscription {
    /// The language of the input audio, in ISO-639-1 (e.g. `en`) format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// The model to use for transcription, e.g. `whisper-1`, `gpt-4o-transcribe`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// An optional text to guide the model's style or continue a previous audio segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side voice activity detection which flips on when user speech is detected
    /// and off after a period of silence.
    #[serde(rename = "server_vad")]
    ServerVAD {
        /// Activation threshold for VAD (0.0 to 1.0). Defaults to 0.5.
        threshold: f32,
        /// Amount of audio to include before speech starts, in milliseconds. Defaults to 300.
        prefix_padding_ms: u32,
        /// Duration of silence to detect speech stop, in milliseconds. Defaults to 200.
        silence_duration_ms: u32,

        /// Whether to automatically generate a response when a VAD stop event occurs.
        #[serde(skip_serializing_if = "Option::is_none")]
        create_response: Option<bool>,

        /// Whether to automatically interrupt any ongoing response when a VAD start event occurs.
        #[serde(skip_serializing_if = "Option::is_none")]
        interrupt_response: Option<bool>,
    },

    /// Server-side semantic turn detection which uses a model to determine when the user
    /// has finished speaking.
    #[serde(rename = "semantic_vad")]
    SemanticVAD {
        /// `low`, `medium`, `high`, or `auto` (equivalent to `medium`).
        eagerness: String,

        #[serde(skip_serializing_if = "Option::is_none", default)]
        create_response: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none", default)]
        interrupt_response: Option<bool>,
    },
}

impl Default for TurnDetection {
    fn default() -> Self {
        TurnDetection::ServerVAD {
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 200,
            create_response: None,
            interrupt_response: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum MaxResponseOutputTokens {
    #[serde(rename = "inf")]
    Inf,
    #[serde(untagged)]
    Num(u32),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ToolDefinition {
    #[serde(rename = "function")]
    Function {
        /// The name of the function.
        name: String,
        /// The description of the function, including guidance on when and how to call it.
        description: String,
        /// Parameters of the function in JSON Schema.
        parameters: serde_json::Value,
    },
}

impl ToolDefinition {
    pub fn name(&self) -> &str {
        match self {
            ToolDefinition::Function { name, .. } => name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FunctionType {
    Function,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
    Required,
    #[serde(untagged)]
    Function { r#type: FunctionType, name: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeVoice {
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Sage,
    Shimmer,
    Verse,
    #[serde(untagged)]
    Other(String),
}

/// The mutable session configuration the Client maintains and merges into `session.update`.
///
/// Field defaults mirror the original assistant's `default_session_config`: both modalities,
/// `pcm16` in and out, `whisper-1` input transcription, and server VAD with a short
/// `silence_duration_ms` tuned for responsive turn-taking.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Builder)]
#[builder(name = "SessionConfigArgs")]
#[builder(pattern = "mutable")]
#[builder(setter(into, strip_option), default)]
#[builder(derive(Debug))]
#[builder(build_fn(error = "crate::error::RealtimeError"))]
pub struct SessionConfig {
    /// Which output channels the server may use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    /// The system prompt prepended to model calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// The named voice profile. Cannot be changed after the model has produced audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<RealtimeVoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,

    /// Configuration for input audio transcription. `None` disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<AudioTranscription>,

    /// Configuration for turn detection. `None` disables server-driven turn taking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    /// Tool definitions merged with the Client's tool registry before every `session.update`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_response_output_tokens: Option<MaxResponseOutputTokens>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            instructions: None,
            voice: Some(RealtimeVoice::Shimmer),
            input_audio_format: Some(AudioFormat::PCM16),
            output_audio_format: Some(AudioFormat::PCM16),
            input_audio_transcription: Some(AudioTranscription {
                model: Some("whisper-1".to_string()),
                ..Default::default()
            }),
            turn_detection: Some(TurnDetection::default()),
            tools: Some(Vec::new()),
            tool_choice: Some(ToolChoice::Auto),
            temperature: Some(0.8),
            max_response_output_tokens: Some(MaxResponseOutputTokens::Num(4096)),
        }
    }
}

impl SessionConfig {
    /// A fully sparse config with every field `None`, distinct from
    /// [`Default::default`] (which seeds the original assistant's concrete
    /// defaults). Used as the base for a kwargs-style partial update that
    /// should touch nothing unless explicitly set — e.g. re-sending
    /// `session.update` after a tool registry change with no other option
    /// changes.
    pub fn empty() -> Self {
        Self {
            modalities: None,
            instructions: None,
            voice: None,
            input_audio_format: None,
            output_audio_format: None,
            input_audio_transcription: None,
            turn_detection: None,
            tools: None,
            tool_choice: None,
            temperature: None,
            max_response_output_tokens: None,
        }
    }

    /// Merges `other`'s present fields into `self`, field by field, matching the original's
    /// `session_config.update(kwargs)` semantics (a shallow dict merge).
    pub fn merge(&mut self, other: SessionConfig) {
        macro_rules! merge_field {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field;
                }
            };
        }
        merge_field!(modalities);
        merge_field!(instructions);
        merge_field!(voice);
        merge_field!(input_audio_format);
        merge_field!(output_audio_format);
        merge_field!(input_audio_transcription);
        merge_field!(turn_detection);
        merge_field!(tools);
        merge_field!(tool_choice);
        merge_field!(temperature);
        merge_field!(max_response_output_tokens);
    }

    pub fn turn_detection_type(&self) -> Option<&str> {
        match &self.turn_detection {
            Some(TurnDetection::ServerVAD { .. }) => Some("server_vad"),
            Some(TurnDetection::SemanticVAD { .. }) => Some("semantic_vad"),
            None => None,
        }
    }
}

/// The server's authoritative view of the session, as seen in `session.created`/`session.updated`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SessionResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub config: SessionConfigFlatten,
}

/// Flattened into [`SessionResource`] so server payloads with extra top-level fields
/// (`id`, `model`, `object`) still deserialize against the same field set as
/// [`SessionConfig`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SessionConfigFlatten {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<RealtimeVoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<AudioTranscription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_response_output_tokens: Option<MaxResponseOutputTokens>,
}
