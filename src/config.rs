//! Endpoint configurations: [DirectConfig] for a direct realtime endpoint,
//! [EnterpriseConfig] for an Azure-style deployment-scoped endpoint.

use tokio_tungstenite::tungstenite::http::HeaderMap;
use uuid::Uuid;

/// Default realtime host used by [`DirectConfig`].
pub const DIRECT_API_BASE: &str = "wss://api.openai.com/v1/realtime";

/// [crate::transport::Transport] relies on this to build the connection
/// request for every `connect` call.
pub trait RealtimeConfig: Send + Sync {
    fn headers(&self) -> HeaderMap;
    fn url(&self) -> String;
    fn api_key(&self) -> &str;
}

/// Configuration for a direct realtime endpoint, authenticated with a bearer
/// credential passed as `Authorization: Bearer <key>`.
#[derive(Debug, Clone)]
pub struct DirectConfig {
    api_base: String,
    api_key: String,
    model: String,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            api_base: DIRECT_API_BASE.to_string(),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: "gpt-4o-realtime-preview".to_string(),
        }
    }
}

impl DirectConfig {
    /// Build a [`DirectConfig`] reading the credential from `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Default::default()
    }

    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }
}

impl RealtimeConfig for DirectConfig {
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", self.api_key).parse().unwrap(),
        );
        headers.insert("OpenAI-Beta", "realtime=v1".parse().unwrap());
        headers
    }

    fn url(&self) -> String {
        format!("{}?model={}", self.api_base, self.model)
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Configuration for an enterprise deployment-scoped realtime endpoint,
/// authenticated with an `api-key` header and addressed by deployment name
/// and API version rather than model name.
#[derive(Debug, Clone)]
pub struct EnterpriseConfig {
    api_base: String,
    api_key: String,
    api_version: String,
    deployment_id: String,
}

impl Default for EnterpriseConfig {
    fn default() -> Self {
        Self {
            api_base: Default::default(),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            api_version: "2024-10-01-preview".to_string(),
            deployment_id: Default::default(),
        }
    }
}

impl EnterpriseConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Endpoint base in the form `https://<resource-name>.openai.azure.com`.
    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_api_version<S: Into<String>>(mut self, api_version: S) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_deployment_id<S: Into<String>>(mut self, deployment_id: S) -> Self {
        self.deployment_id = deployment_id.into();
        self
    }
}

impl RealtimeConfig for EnterpriseConfig {
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("api-key", self.api_key.parse().unwrap());
        headers.insert(
            "User-Agent",
            "realtime-conversation-engine".parse().unwrap(),
        );
        headers.insert(
            "x-ms-client-request-id",
            Uuid::new_v4().to_string().parse().unwrap(),
        );
        headers
    }

    fn url(&self) -> String {
        let base = self.api_base.replace("https://", "wss://");
        format!(
            "{}/openai/realtime?api-version={}&deployment={}",
            base, self.api_version, self.deployment_id
        )
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }
}
