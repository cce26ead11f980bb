//! An encyclopedia browsing session.
//!
//! `Encyclopedia` owns everything a front end needs between key presses:
//! the pipeline, history, the article on screen, settings and the random
//! source. Cohesion checks are handed back as [`CohesionRequest`]s so the
//! caller can run them off its event loop.

use crate::article::{Article, GenerationContext, TaxonRank};
use crate::builtin::{infinipedia_article, is_builtin_query};
use crate::config::{draw, EncyclopediaConfig};
use crate::history::{History, HistoryState};
use crate::pipeline::{CohesionResult, Pipeline, PipelineError, PipelineState, FALLBACK_TOPICS};
use crate::prompt::{ArticleRequest, ArticleStyle};
use crate::render::{render_error, RenderedPage, Renderer};
use crate::service::CompletionService;
use crate::settings::Settings;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A page ready to show, tagged with the generation it belongs to.
#[derive(Debug, Clone)]
pub struct Page {
    pub article: Arc<Article>,
    pub rendered: RenderedPage,
    /// Increases every time a new page is shown; late background results
    /// carrying an older number are stale.
    pub generation: u64,
}

/// A cohesion check to run after the page is shown.
#[derive(Clone)]
pub struct CohesionRequest {
    pub generation: u64,
    pub parent: GenerationContext,
    pub child: Arc<Article>,
    pipeline: Pipeline,
}

impl CohesionRequest {
    pub async fn run(self) -> CohesionOutcome {
        let result = self.pipeline.check_cohesion(&self.parent, &self.child).await;
        CohesionOutcome {
            generation: self.generation,
            result,
        }
    }
}

impl std::fmt::Debug for CohesionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CohesionRequest")
            .field("generation", &self.generation)
            .field("parent", &self.parent)
            .field("child", &self.child.title)
            .finish()
    }
}

/// Result of a cohesion check for a given page generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohesionOutcome {
    pub generation: u64,
    pub result: CohesionResult,
}

/// What a query or link produced.
#[derive(Debug)]
pub enum Navigation {
    /// Blank query or label; nothing happened.
    Ignored,
    /// The link pointed at the article already on screen.
    SelfLink,
    /// A new page, with a cohesion check to run when the page came from a link.
    Page {
        page: Page,
        cohesion: Option<CohesionRequest>,
    },
}

impl Navigation {
    pub fn page(&self) -> Option<&Page> {
        match self {
            Navigation::Page { page, .. } => Some(page),
            _ => None,
        }
    }
}

/// A browsing session.
pub struct Encyclopedia {
    pipeline: Pipeline,
    renderer: Renderer,
    history: History,
    current: Option<Arc<Article>>,
    settings: Settings,
    rng: StdRng,
    state: PipelineState,
    generation: u64,
}

impl Encyclopedia {
    pub fn new(service: Arc<dyn CompletionService>, config: EncyclopediaConfig) -> Self {
        Self::with_rng(service, config, StdRng::from_entropy())
    }

    /// A session whose random draws are fully determined by `seed`.
    pub fn with_seed(
        service: Arc<dyn CompletionService>,
        config: EncyclopediaConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(service, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(service: Arc<dyn CompletionService>, config: EncyclopediaConfig, rng: StdRng) -> Self {
        let settings = Settings::new(config.default_sections);
        let renderer = Renderer::new(config.red_link_chance);
        Self {
            pipeline: Pipeline::new(service, Arc::new(config)),
            renderer,
            history: History::new(),
            current: None,
            settings,
            rng,
            state: PipelineState::Idle,
            generation: 0,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn config(&self) -> &EncyclopediaConfig {
        self.pipeline.config()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn set_style(&mut self, style: ArticleStyle) {
        self.settings.article_style = style;
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn history_state(&self) -> HistoryState {
        self.history.state()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current(&self) -> Option<&Arc<Article>> {
        self.current.as_ref()
    }

    /// Generation number of the page currently shown.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generate and show an article for `query`.
    pub async fn run(
        &mut self,
        query: &str,
        context: Option<GenerationContext>,
    ) -> Result<Navigation, PipelineError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Navigation::Ignored);
        }
        if self.state.is_busy() {
            warn!(query, "Rejecting query while a generation is running");
            return Err(PipelineError::Busy);
        }

        if is_builtin_query(query) {
            info!("Serving built-in article");
            let page = self.show(Arc::new(infinipedia_article()), true);
            return Ok(Navigation::Page {
                page,
                cohesion: None,
            });
        }

        let style = self.settings.article_style;
        let config = self.pipeline.config().clone();
        let want_ambox = draw(&mut self.rng, config.ambox_chance);
        let want_chaos = style == ArticleStyle::Normal && draw(&mut self.rng, config.chaos_chance);
        debug!(query, want_ambox, want_chaos, %style, "Drew generation flags");

        self.state = PipelineState::Classifying;
        let category = self.pipeline.classify(query, context.as_ref()).await;

        self.state = PipelineState::Generating;
        let request = ArticleRequest {
            query,
            category: &category,
            context: context.as_ref(),
            tone: &config.tone,
            sections: self.settings.number_of_sections,
            want_ambox,
            want_chaos,
            style,
        };

        let article = match self.pipeline.generate(&request).await {
            Ok(article) => Arc::new(article),
            Err(e) => {
                self.state = PipelineState::Error;
                return Err(e);
            }
        };

        let page = self.show(article.clone(), true);
        let cohesion = context
            .filter(GenerationContext::has_parent)
            .map(|parent| CohesionRequest {
                generation: page.generation,
                parent,
                child: article,
                pipeline: self.pipeline.clone(),
            });

        Ok(Navigation::Page { page, cohesion })
    }

    /// [`Self::run`], then await the cohesion check and append its notice.
    pub async fn run_to_completion(
        &mut self,
        query: &str,
        context: Option<GenerationContext>,
    ) -> Result<Navigation, PipelineError> {
        let navigation = self.run(query, context).await?;
        self.complete_cohesion(navigation).await
    }

    async fn complete_cohesion(&mut self, navigation: Navigation) -> Result<Navigation, PipelineError> {
        match navigation {
            Navigation::Page {
                mut page,
                cohesion: Some(request),
            } => {
                self.state = PipelineState::CohesionChecking;
                let outcome = request.run().await;
                self.state = PipelineState::Rendered;
                if let Some(topic) = outcome.result.suggestion() {
                    page.rendered.push_cohesion_notice(topic);
                }
                Ok(Navigation::Page {
                    page,
                    cohesion: None,
                })
            }
            other => Ok(other),
        }
    }

    /// Follow a link shown on the current page.
    pub async fn follow_link(
        &mut self,
        label: &str,
        taxon_rank: Option<TaxonRank>,
    ) -> Result<Navigation, PipelineError> {
        let label = label.trim();
        if label.is_empty() {
            return Ok(Navigation::Ignored);
        }
        if self.current.as_ref().is_some_and(|a| a.is_titled(label)) {
            debug!(label, "Self link");
            return Ok(Navigation::SelfLink);
        }

        let keep_chance = self.pipeline.config().link_cohesion_chance;
        let mut context = match &self.current {
            Some(article) if draw(&mut self.rng, keep_chance) => Some(article.summary_context()),
            Some(_) => {
                info!(label, "Dropping parent context for this link");
                None
            }
            None => None,
        };

        if let Some(rank) = taxon_rank {
            context = Some(match context {
                Some(ctx) => ctx.with_taxon_rank(rank),
                None => GenerationContext::taxon(rank),
            });
        }

        self.run(label, context).await
    }

    /// [`Self::follow_link`], awaiting the cohesion check inline.
    pub async fn follow_link_to_completion(
        &mut self,
        label: &str,
        taxon_rank: Option<TaxonRank>,
    ) -> Result<Navigation, PipelineError> {
        let navigation = self.follow_link(label, taxon_rank).await?;
        self.complete_cohesion(navigation).await
    }

    pub fn back(&mut self) -> Option<Page> {
        let article = self.history.back()?;
        Some(self.show(article, false))
    }

    pub fn forward(&mut self) -> Option<Page> {
        let article = self.history.forward()?;
        Some(self.show(article, false))
    }

    /// Return to the welcome screen, forgetting history.
    pub fn home(&mut self) {
        self.history.clear();
        self.current = None;
        self.state = PipelineState::Idle;
        self.generation += 1;
    }

    /// Re-render the article on screen, e.g. after a settings change.
    pub fn rerender(&mut self) -> Option<Page> {
        let article = self.current.clone()?;
        Some(self.show(article, false))
    }

    /// The page shown for a failed query.
    pub fn error_page(&mut self, error: &PipelineError, query: &str) -> RenderedPage {
        self.generation += 1;
        render_error(&error.user_message(query.trim()))
    }

    /// Topic suggestions for the welcome screen, falling back to a fixed list.
    pub async fn random_topics(&self) -> Vec<String> {
        let count = self.pipeline.config().random_topic_count;
        match self.pipeline.random_topics(count).await {
            Ok(topics) => topics,
            Err(e) => {
                warn!(error = %e, "Topic suggestions failed, using fallback");
                FALLBACK_TOPICS.iter().map(|t| t.to_string()).collect()
            }
        }
    }

    fn show(&mut self, article: Arc<Article>, record: bool) -> Page {
        if record {
            self.history.push(article.clone());
        }
        self.current = Some(article.clone());
        self.state = PipelineState::Rendered;
        self.generation += 1;

        let rendered = self.renderer.render(&article, &mut self.rng);
        Page {
            article,
            rendered,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article_json, category_json, MockCompletion};

    fn session(mock: &Arc<MockCompletion>) -> Encyclopedia {
        Encyclopedia::with_seed(mock.clone(), EncyclopediaConfig::new().deterministic(), 1)
    }

    #[tokio::test]
    async fn test_empty_query_is_ignored() {
        let mock = Arc::new(MockCompletion::failing());
        let mut session = session(&mock);
        assert!(matches!(session.run("   ", None).await, Ok(Navigation::Ignored)));
        assert_eq!(mock.call_count(), 0);
        assert_eq!(session.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_run_pushes_history_and_renders() {
        let mock = Arc::new(MockCompletion::new([category_json("Fictional Location"), article_json("Keon")]));
        let mut session = session(&mock);

        let nav = session.run(" Keon ", None).await.unwrap();
        let page = nav.page().unwrap();
        assert_eq!(page.article.title, "Keon");
        assert_eq!(page.generation, session.generation());
        assert!(matches!(nav, Navigation::Page { cohesion: None, .. }));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.state(), PipelineState::Rendered);
        assert_eq!(mock.requests()[1].last_user().map(|u| u.contains("Topic: \"Keon\"")), Some(true));
    }

    #[tokio::test]
    async fn test_busy_guard() {
        let mock = Arc::new(MockCompletion::failing());
        let mut session = session(&mock);
        session.state = PipelineState::Generating;
        assert_eq!(session.run("Moss", None).await.unwrap_err(), PipelineError::Busy);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_self_link() {
        let mock = Arc::new(MockCompletion::failing());
        let mut session = session(&mock);
        session.run("infinipedia", None).await.unwrap();

        let nav = session.follow_link("  INFINIPEDIA ", None).await.unwrap();
        assert!(matches!(nav, Navigation::SelfLink));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_follow_link_carries_context_and_checks_cohesion() {
        let mock = Arc::new(MockCompletion::new([
            category_json("Fictional Location"),
            article_json("Keon"),
            r#"{"isRelevant": false, "suggestedTopic": "The Noosphere"}"#.to_string(),
        ]));
        let mut session = session(&mock);
        session.run("Infinipedia", None).await.unwrap();

        let nav = session.follow_link_to_completion("Keon", None).await.unwrap();
        let page = nav.page().unwrap();
        assert_eq!(page.rendered.links().last().unwrap().label, "The Noosphere");
        assert!(mock.requests()[1]
            .last_user()
            .unwrap()
            .contains("from the article \"Infinipedia\""));
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_context_dropped_when_keep_chance_zero() {
        let mock = Arc::new(MockCompletion::new([category_json("Food"), article_json("Keon")]));
        let config = EncyclopediaConfig::new()
            .deterministic()
            .with_link_cohesion_chance(0.0);
        let mut session = Encyclopedia::with_seed(mock.clone(), config, 5);
        session.run("Infinipedia", None).await.unwrap();

        let nav = session.follow_link("Keon", None).await.unwrap();
        assert!(matches!(nav, Navigation::Page { cohesion: None, .. }));
        assert!(!mock.requests()[1].last_user().unwrap().contains("CONTEXT"));
    }

    #[tokio::test]
    async fn test_out_of_range_chances_do_not_panic() {
        let mock = Arc::new(MockCompletion::new([
            category_json("Food"),
            article_json("Gloomfruit"),
            category_json("Region"),
            article_json("Keon"),
        ]));
        let mut config = EncyclopediaConfig::new().deterministic();
        config.ambox_chance = 3.0;
        config.chaos_chance = f64::NAN;
        config.link_cohesion_chance = -1.0;
        config.red_link_chance = 7.5;
        let mut session = Encyclopedia::with_seed(mock.clone(), config, 11);

        let nav = session.run("Gloomfruit", None).await.unwrap();
        assert!(nav.page().unwrap().rendered.links().iter().all(|l| l.red));
        assert!(mock.requests()[1]
            .last_user()
            .unwrap()
            .contains("message box (ambox): Yes"));

        let nav = session.follow_link("Keon", None).await.unwrap();
        assert!(matches!(nav, Navigation::Page { cohesion: None, .. }));
    }

    #[tokio::test]
    async fn test_taxon_link_skips_classification() {
        let mock = Arc::new(MockCompletion::new([article_json("Glimmeridae")]));
        let config = EncyclopediaConfig::new()
            .deterministic()
            .with_link_cohesion_chance(0.0);
        let mut session = Encyclopedia::with_seed(mock.clone(), config, 5);

        session
            .follow_link("Glimmeridae", Some(TaxonRank::Family))
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 1);
        assert!(mock.requests()[0]
            .system()
            .unwrap()
            .contains("[\"Kingdom\",\"Phylum\",\"Class\",\"Order\"]"));
    }

    #[tokio::test]
    async fn test_failure_sets_error_state() {
        let mock = Arc::new(MockCompletion::new([category_json("Food")]));
        let mut session = session(&mock);

        let err = session.run("Moss", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Failed(_)));
        assert_eq!(session.state(), PipelineState::Error);
        assert!(session.history().is_empty());

        let page = session.error_page(&err, " Moss ");
        assert!(crate::render::html::to_html(&page, &Default::default())
            .contains("Failed to generate the article for &quot;Moss&quot;. Please try again."));
    }

    #[tokio::test]
    async fn test_back_forward_home() {
        let mock = Arc::new(MockCompletion::new([category_json("Food"), article_json("Keon")]));
        let mut session = session(&mock);
        session.run("Infinipedia", None).await.unwrap();
        session.run("Keon", None).await.unwrap();

        assert_eq!(session.back().unwrap().article.title, "Infinipedia");
        assert!(session.back().is_none());
        assert_eq!(session.forward().unwrap().article.title, "Keon");
        assert_eq!(session.history().len(), 2);

        session.home();
        assert!(session.current().is_none());
        assert!(session.history().is_empty());
        assert_eq!(session.history_state(), HistoryState::default());
    }

    #[tokio::test]
    async fn test_random_topics_fallback() {
        let mock = Arc::new(MockCompletion::failing());
        let topics = session(&mock).random_topics().await;
        assert_eq!(topics, FALLBACK_TOPICS.to_vec());
    }
}
