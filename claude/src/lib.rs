//! Small client for the Anthropic Messages API.
//!
//! Only what article generation needs: one-shot completions, and a JSON
//! mode where the assistant turn is prefilled with `{` so the reply is an
//! object from its first byte.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Prefill used to force the reply to start inside a JSON object.
const JSON_PREFILL: &str = "{";

/// Failures talking to the Messages API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ANTHROPIC_API_KEY is not set")]
    NoApiKey,

    #[error("request failed: {0}")]
    Network(String),

    #[error("Messages API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unreadable response body: {0}")]
    Parse(String),

    #[error("bad client configuration: {0}")]
    Config(String),
}

/// Claude API client.
#[derive(Clone)]
pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Claude {
    /// Client with default timeouts, model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Reads `ANTHROPIC_API_KEY`; a blank key counts as missing.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| Error::NoApiKey)?;
        if api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }
        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different API base (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The model used when a request does not name one.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// One round trip to `/messages`.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        let api_request = self.build_api_request(&request);
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parse_response(api_response, request.json_output))
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("API key is not a valid header: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn build_api_request(&self, request: &Request) -> ApiRequest {
        let mut messages: Vec<ApiMessage> = request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        if request.json_output {
            messages.push(ApiMessage {
                role: Role::Assistant.as_str().to_string(),
                content: JSON_PREFILL.to_string(),
            });
        }

        ApiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            max_tokens: request.max_tokens,
            system: request.system.clone(),
            messages,
            temperature: request.temperature,
        }
    }
}

fn parse_response(api_response: ApiResponse, json_output: bool) -> Response {
    let mut text: String = api_response
        .content
        .into_iter()
        .filter_map(|c| match c {
            ApiContent::Text { text } => Some(text),
            ApiContent::Other => None,
        })
        .collect();

    // The prefill is not echoed back, so re-attach it to get a whole object.
    if json_output && !text.trim_start().starts_with(JSON_PREFILL) {
        text.insert_str(0, JSON_PREFILL);
    }

    let stop_reason = match api_response.stop_reason.as_deref() {
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    };

    Response {
        id: api_response.id,
        model: api_response.model,
        text,
        stop_reason,
        usage: Usage {
            input_tokens: api_response.usage.input_tokens,
            output_tokens: api_response.usage.output_tokens,
        },
    }
}

/// What to ask for. `model` falls back to the client's default.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub max_tokens: usize,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    /// Ask for a reply that is a single JSON object.
    pub json_output: bool,
}

impl Request {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: None,
            max_tokens: 4096,
            system: None,
            messages,
            temperature: None,
            json_output: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }
}

/// One conversation turn.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// The concatenated text blocks of a reply.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub model: String,
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

impl Response {
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

// Wire types

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    model: String,
    content: Vec<ApiContent>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_response(text: &str) -> ApiResponse {
        serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "model": "claude-test",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 20}
        }))
        .unwrap()
    }

    #[test]
    fn test_model_override_and_base_url() {
        let client = Claude::new("k")
            .with_model("claude-haiku")
            .with_base_url("http://localhost:9000/v1/");
        assert_eq!(client.model(), "claude-haiku");
        assert_eq!(client.base_url, "http://localhost:9000/v1");
        assert_eq!(Claude::new("k").model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_system_prompt_and_temperature_serialized() {
        let client = Claude::new("k");
        let request = Request::new(vec![Message::user("Grelmark")])
            .with_system("You are the archivist of Infinipedia.")
            .with_max_tokens(1200)
            .with_temperature(0.9);
        let body = serde_json::to_value(client.build_api_request(&request)).unwrap();

        assert_eq!(body["system"], "You are the archivist of Infinipedia.");
        assert_eq!(body["max_tokens"], 1200);
        assert!(body.get("temperature").is_some());
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_optional_fields_omitted() {
        let client = Claude::new("k");
        let body =
            serde_json::to_value(client.build_api_request(&Request::new(vec![]))).unwrap();
        assert!(body.get("system").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_json_request_ends_with_prefill() {
        let client = Claude::new("test-key");
        let request = Request::new(vec![Message::user("Topic")]).with_json_output(true);
        let api = client.build_api_request(&request);

        let last = api.messages.last().unwrap();
        assert_eq!(last.role, "assistant");
        assert_eq!(last.content, JSON_PREFILL);
        assert_eq!(api.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_plain_request_has_no_prefill() {
        let client = Claude::new("test-key");
        let request = Request::new(vec![Message::user("Topic")]).with_model("other");
        let api = client.build_api_request(&request);

        assert_eq!(api.messages.len(), 1);
        assert_eq!(api.model, "other");
    }

    #[test]
    fn test_prefill_reattached_in_json_mode() {
        let response = parse_response(api_response("\"category\": \"Fictional Nation\"}"), true);
        assert_eq!(response.text(), "{\"category\": \"Fictional Nation\"}");

        let untouched = parse_response(api_response("{\"a\": 1}"), true);
        assert_eq!(untouched.text(), "{\"a\": 1}");
    }

    #[test]
    fn test_unknown_content_blocks_are_skipped() {
        let api: ApiResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_2",
            "model": "claude-test",
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "hello"}
            ],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 1, "output_tokens": 2}
        }))
        .unwrap();

        let response = parse_response(api, false);
        assert_eq!(response.text(), "hello");
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
    }
}
