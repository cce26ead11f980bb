//! External completion and image services.
//!
//! The pipeline only sees the [`CompletionService`] and [`ImageService`]
//! traits, so tests can swap in the mocks from [`crate::testing`].

use async_trait::async_trait;
use claude::{Claude, Message, Request};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const IMAGE_API_BASE: &str = "https://api.openai.com/v1";
const IMAGE_MODEL: &str = "dall-e-3";

/// Errors from the external services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Completion failed: {0}")]
    Completion(#[from] claude::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Image API error (status {status}): {message}")]
    ImageApi { status: u16, message: String },

    #[error("Image service returned no image")]
    NoImage,

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Who a chat message is from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single role-tagged message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A request for one completion.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Ask for a single JSON object as the reply.
    pub json: bool,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }

    /// Text of the first system message, if any.
    pub fn system(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
    }

    /// Text of the last user message, if any.
    pub fn last_user(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }
}

/// A chat completion backend returning one string per request.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError>;
}

/// [`CompletionService`] backed by the Claude Messages API.
#[derive(Clone)]
pub struct ClaudeCompletion {
    client: Claude,
}

impl ClaudeCompletion {
    pub fn new(client: Claude) -> Self {
        Self { client }
    }

    /// Create from `ANTHROPIC_API_KEY`, honoring an optional model override.
    pub fn from_env(model: Option<&str>) -> Result<Self, ServiceError> {
        let mut client = Claude::from_env()?;
        if let Some(model) = model {
            client = client.with_model(model);
        }
        Ok(Self::new(client))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    fn build_request(request: CompletionRequest) -> Request {
        let mut system = Vec::new();
        let mut messages = Vec::new();
        for message in request.messages {
            match message.role {
                ChatRole::System => system.push(message.content),
                ChatRole::User => messages.push(Message::user(message.content)),
                ChatRole::Assistant => messages.push(Message::assistant(message.content)),
            }
        }

        let mut api_request = Request::new(messages).with_json_output(request.json);
        if !system.is_empty() {
            api_request = api_request.with_system(system.join("\n\n"));
        }
        if let Some(max_tokens) = request.max_tokens {
            api_request = api_request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            api_request = api_request.with_temperature(temperature);
        }
        api_request
    }
}

#[async_trait]
impl CompletionService for ClaudeCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        let response = self.client.complete(Self::build_request(request)).await?;
        Ok(response.text().to_string())
    }
}

/// Shape of a generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    /// 1:1, used for infobox images.
    Square,
    /// 4:3, used for section images.
    Landscape,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "4:3",
        }
    }

    /// Pixel size requested from the image API.
    fn size(self) -> &'static str {
        match self {
            AspectRatio::Square => "1024x1024",
            AspectRatio::Landscape => "1792x1024",
        }
    }
}

/// An image generator returning a displayable URL.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(&self, prompt: &str, aspect: AspectRatio) -> Result<String, ServiceError>;
}

#[derive(Debug, Serialize)]
struct ImageRequestBody<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponseBody {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

/// [`ImageService`] speaking the `/images/generations` HTTP API.
#[derive(Clone)]
pub struct HttpImageService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl HttpImageService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: IMAGE_API_BASE.to_string(),
            model: IMAGE_MODEL.to_string(),
        }
    }

    /// Create from `IMAGE_API_KEY`, `IMAGE_API_BASE` and `IMAGE_MODEL`.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("IMAGE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let mut service = Self::new(api_key);
        if let Ok(base) = std::env::var("IMAGE_API_BASE") {
            service = service.with_base_url(base);
        }
        if let Ok(model) = std::env::var("IMAGE_MODEL") {
            service = service.with_model(model);
        }
        Some(service)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn generate(&self, prompt: &str, aspect: AspectRatio) -> Result<String, ServiceError> {
        let body = ImageRequestBody {
            model: &self.model,
            prompt,
            size: aspect.size(),
            n: 1,
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::ImageApi { status, message });
        }

        let body: ImageResponseBody = response
            .json()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        image_url(body)
    }
}

fn image_url(body: ImageResponseBody) -> Result<String, ServiceError> {
    let datum = body.data.into_iter().next().ok_or(ServiceError::NoImage)?;
    match (datum.url, datum.b64_json) {
        (Some(url), _) => Ok(url),
        (None, Some(b64)) => Ok(format!("data:image/png;base64,{b64}")),
        (None, None) => Err(ServiceError::NoImage),
    }
}

/// Image service used when no image key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledImages;

#[async_trait]
impl ImageService for DisabledImages {
    async fn generate(&self, _prompt: &str, _aspect: AspectRatio) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("image generation is not configured".to_string()))
    }
}
