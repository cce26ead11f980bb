//! The generation pipeline: classify, generate, check cohesion.
//!
//! Every call here talks to the [`CompletionService`] in JSON mode. Only
//! [`Pipeline::generate`] surfaces errors; the other steps recover to
//! defaults and log a warning.

use crate::article::{Article, GenerationContext, GenerationReply};
use crate::config::{EncyclopediaConfig, DEFAULT_CATEGORY, TAXON_CATEGORY};
use crate::prompt::{ArticleRequest, PromptBuilder, Prompts};
use crate::service::{ChatMessage, CompletionRequest, CompletionService, ServiceError};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

const CLASSIFY_MAX_TOKENS: usize = 100;
const COHESION_MAX_TOKENS: usize = 300;
const TOPICS_MAX_TOKENS: usize = 500;

/// Topics shown when the topic request fails.
pub const FALLBACK_TOPICS: [&str; 3] = [
    "Sky-Whale Migration Patterns",
    "The Clockwork City of Aethel",
    "Sentient Moss",
];

/// Where a session is in the generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Classifying,
    Generating,
    CohesionChecking,
    Rendered,
    Error,
}

impl PipelineState {
    /// Whether a new query must be rejected.
    pub fn is_busy(self) -> bool {
        matches!(self, PipelineState::Classifying | PipelineState::Generating)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Idle => "Idle",
            PipelineState::Classifying => "Classifying...",
            PipelineState::Generating => "Generating...",
            PipelineState::CohesionChecking => "Checking links...",
            PipelineState::Rendered => "Ready",
            PipelineState::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Errors a user can see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The model declined the topic and said why.
    #[error("Generation refused: {0}")]
    Refused(String),

    #[error("Generation failed: {0}")]
    Failed(String),

    #[error("A generation is already in progress")]
    Busy,
}

impl PipelineError {
    /// The message shown in place of the article.
    pub fn user_message(&self, query: &str) -> String {
        match self {
            PipelineError::Refused(message) => message.clone(),
            PipelineError::Failed(_) => {
                format!("Failed to generate the article for \"{query}\". Please try again.")
            }
            PipelineError::Busy => {
                "An article is already being generated. Please wait.".to_string()
            }
        }
    }
}

/// Outcome of a cohesion check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohesionResult {
    #[serde(default = "default_relevant")]
    pub is_relevant: bool,
    #[serde(default)]
    pub suggested_topic: Option<String>,
}

fn default_relevant() -> bool {
    true
}

impl Default for CohesionResult {
    fn default() -> Self {
        Self {
            is_relevant: true,
            suggested_topic: None,
        }
    }
}

impl CohesionResult {
    /// The topic to suggest, when the article missed and a suggestion exists.
    pub fn suggestion(&self) -> Option<&str> {
        if self.is_relevant {
            return None;
        }
        self.suggested_topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ClassificationResponse {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    #[serde(default)]
    topics: Vec<String>,
}

/// Recoverable failures inside the pipeline steps.
#[derive(Debug, Error)]
enum StepError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The stateless pipeline steps. Cheap to clone into background tasks.
#[derive(Clone)]
pub struct Pipeline {
    service: Arc<dyn CompletionService>,
    config: Arc<EncyclopediaConfig>,
}

impl Pipeline {
    pub fn new(service: Arc<dyn CompletionService>, config: Arc<EncyclopediaConfig>) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &EncyclopediaConfig {
        &self.config
    }

    /// Pick a category for the query. Never fails.
    pub async fn classify(&self, query: &str, context: Option<&GenerationContext>) -> String {
        if context.is_some_and(GenerationContext::is_taxon_rank) {
            debug!(query, "Taxon rank link, skipping classification");
            return TAXON_CATEGORY.to_string();
        }

        let prompts = PromptBuilder::new(&self.config).classification(query, context);
        let request = request_for(prompts)
            .with_max_tokens(CLASSIFY_MAX_TOKENS)
            .with_temperature(0.0);

        let category = match self.ask::<ClassificationResponse>(request).await {
            Ok(response) => response.category,
            Err(e) => {
                warn!(query, error = %e, "Classification failed, using default category");
                None
            }
        };

        match category.map(|c| c.trim().to_string()) {
            Some(c) if !c.is_empty() => {
                info!(query, category = %c, "Classified topic");
                c
            }
            _ => DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Generate an article.
    pub async fn generate(&self, request: &ArticleRequest<'_>) -> Result<Article, PipelineError> {
        let prompts = PromptBuilder::new(&self.config).article(request);
        debug!(
            query = request.query,
            category = request.category,
            style = %request.style,
            ambox = request.want_ambox,
            chaos = request.want_chaos,
            "Requesting article"
        );

        let mut completion = request_for(prompts).with_max_tokens(self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            completion = completion.with_temperature(temperature);
        }

        let text = self.service.complete(completion).await.map_err(|e| {
            warn!(query = request.query, error = %e, "Article request failed");
            PipelineError::Failed(e.to_string())
        })?;

        match GenerationReply::parse(extract_json(&text)) {
            Ok(GenerationReply::Article(article)) => {
                info!(title = %article.title, sections = article.sections.len(), "Generated article");
                Ok(article)
            }
            Ok(GenerationReply::Refused(message)) => {
                info!(query = request.query, %message, "Model refused topic");
                Err(PipelineError::Refused(message))
            }
            Err(e) => {
                warn!(query = request.query, error = %e, "Article reply did not parse");
                Err(PipelineError::Failed(e.to_string()))
            }
        }
    }

    /// Ask whether `child` fits the article it was linked from. Never fails.
    pub async fn check_cohesion(&self, parent: &GenerationContext, child: &Article) -> CohesionResult {
        let prompts = PromptBuilder::new(&self.config).cohesion(parent, child);
        let request = request_for(prompts)
            .with_max_tokens(COHESION_MAX_TOKENS)
            .with_temperature(0.0);

        match self.ask::<CohesionResult>(request).await {
            Ok(result) => {
                debug!(child = %child.title, relevant = result.is_relevant, "Cohesion checked");
                result
            }
            Err(e) => {
                warn!(child = %child.title, error = %e, "Cohesion check failed, assuming relevant");
                CohesionResult::default()
            }
        }
    }

    /// Ask for `count` topic suggestions.
    pub async fn random_topics(&self, count: usize) -> Result<Vec<String>, PipelineError> {
        let prompts = PromptBuilder::new(&self.config).random_topics(count);
        let request = request_for(prompts).with_max_tokens(TOPICS_MAX_TOKENS);

        let response = self
            .ask::<TopicsResponse>(request)
            .await
            .map_err(|e| PipelineError::Failed(e.to_string()))?;

        let topics: Vec<String> = response
            .topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(count)
            .collect();

        if topics.is_empty() {
            return Err(PipelineError::Failed("no topics returned".to_string()));
        }
        Ok(topics)
    }

    async fn ask<T: for<'de> Deserialize<'de>>(
        &self,
        request: CompletionRequest,
    ) -> Result<T, StepError> {
        let text = self.service.complete(request).await?;
        Ok(serde_json::from_str(extract_json(&text))?)
    }
}

fn request_for(prompts: Prompts) -> CompletionRequest {
    CompletionRequest::new(vec![
        ChatMessage::system(prompts.system),
        ChatMessage::user(prompts.user),
    ])
    .with_json(true)
}

/// Strip a markdown code fence around a JSON reply, if present.
///
/// A reply that already opens with `{` is returned untouched.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with('{') {
        return text;
    }

    let Some(start) = text.find("```") else {
        return text;
    };
    let body = &text[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
