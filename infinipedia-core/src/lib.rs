//! An infinite fictional encyclopedia.
//!
//! Every search and every internal link produces a freshly generated
//! article. This crate provides:
//! - A classify → generate → cohesion-check pipeline over a pluggable
//!   completion service (Claude by default)
//! - Prompt construction for three writing styles
//! - Browser-style back/forward history
//! - Rendering to a display tree, plain text blocks or HTML
//! - Settings persistence and a line-driven headless browser
//!
//! # Quick Start
//!
//! ```ignore
//! use infinipedia_core::{ClaudeCompletion, Encyclopedia, EncyclopediaConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Arc::new(ClaudeCompletion::from_env(None)?);
//!     let mut session = Encyclopedia::new(service, EncyclopediaConfig::from_env());
//!
//!     let navigation = session.run_to_completion("Sentient Moss", None).await?;
//!     if let Some(page) = navigation.page() {
//!         println!("{}", page.article.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod article;
pub mod builtin;
pub mod config;
pub mod headless;
pub mod history;
pub mod images;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod service;
pub mod session;
pub mod settings;
pub mod testing;

pub use article::{Ambox, AmboxKind, Article, GenerationContext, Infobox, KeyValues, Section, TaxonRank};
pub use config::EncyclopediaConfig;
pub use headless::{HeadlessBrowser, Reply};
pub use history::{History, HistoryState};
pub use images::{ImageState, ImageStates};
pub use pipeline::{CohesionResult, Pipeline, PipelineError, PipelineState};
pub use prompt::{ArticleStyle, CategoryKind, PromptBuilder};
pub use render::{InternalLink, RenderedPage, Renderer};
pub use service::{
    AspectRatio, ClaudeCompletion, CompletionService, DisabledImages, HttpImageService,
    ImageService, ServiceError,
};
pub use session::{CohesionOutcome, CohesionRequest, Encyclopedia, Navigation, Page};
pub use settings::{Settings, SettingsError, SettingsStore};
pub use testing::{MockCompletion, MockImages};
