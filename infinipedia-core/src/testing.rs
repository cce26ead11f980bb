//! Testing utilities.
//!
//! - `MockCompletion` returns scripted replies and records every request
//! - `MockImages` returns predictable URLs, optionally failing some prompts
//! - `article_json` builds a well-formed article reply

use crate::service::{
    AspectRatio, CompletionRequest, CompletionService, ImageService, ServiceError,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A completion service that returns scripted replies in order.
///
/// When the script runs out every further call fails.
#[derive(Debug, Default)]
pub struct MockCompletion {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A service whose every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    /// Queue a failed call.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_replies().push_back(Err(message.into()));
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.lock_requests().len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock_requests().clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<CompletionRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        self.lock_requests().push(request);
        match self.lock_replies().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(ServiceError::Unavailable(message)),
            None => Err(ServiceError::Unavailable("no scripted reply".to_string())),
        }
    }
}

/// An image service returning `mock://<n>` URLs.
///
/// Prompts containing any of the configured failure markers fail instead.
#[derive(Debug, Default)]
pub struct MockImages {
    fail_markers: Vec<String>,
    prompts: Mutex<Vec<(String, AspectRatio)>>,
}

impl MockImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every prompt containing `marker`.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    /// Every prompt received with its aspect ratio, in call order.
    pub fn prompts(&self) -> Vec<(String, AspectRatio)> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ImageService for MockImages {
    async fn generate(&self, prompt: &str, aspect: AspectRatio) -> Result<String, ServiceError> {
        let n = {
            let mut prompts = self.prompts.lock().unwrap_or_else(|e| e.into_inner());
            prompts.push((prompt.to_string(), aspect));
            prompts.len()
        };

        if self.fail_markers.iter().any(|m| prompt.contains(m.as_str())) {
            return Err(ServiceError::Unavailable(format!("scripted failure for {prompt}")));
        }
        Ok(format!("mock://{n}"))
    }
}

/// A well-formed article reply with one body section and an infobox image.
pub fn article_json(title: &str) -> String {
    serde_json::json!({
        "title": title,
        "summary": format!("<p>{title} is a subject linked to [[Keon]] and [[Sky-iron]].</p>"),
        "ambox": null,
        "infobox": {
            "title": title,
            "image_prompt": format!("A picture of {title}"),
            "data": { "Region": "[[Keon]]", "Population": 1200 },
            "classification": null
        },
        "sections": [
            { "heading": "History", "content": "Founded near [[Lionstes]] [1].", "image_prompt": null },
            { "heading": "See Also", "content": "<ul><li>[[Keon]]</li></ul>" },
            { "heading": "References", "content": "<ul><li>[1] Arriban, T. (1952).</li></ul>" }
        ],
        "error": null
    })
    .to_string()
}

/// A reply refusing the topic.
pub fn refusal_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// A classification reply.
pub fn category_json(category: &str) -> String {
    serde_json::json!({ "category": category }).to_string()
}
