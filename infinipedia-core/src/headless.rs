//! Headless browsing for scripts, tests and coding agents.
//!
//! [`HeadlessBrowser`] drives an [`Encyclopedia`] from single text lines.
//! Lines starting with `#` are commands; anything else is a search query.
//! Every reply is a list of output lines tagged like `[ARTICLE]`,
//! `[ERROR]` or `[NOTICE]`.

use crate::images::{fill_all, ImageStates};
use crate::pipeline::PipelineError;
use crate::prompt::ArticleStyle;
use crate::render::html::to_document;
use crate::render::text::{to_blocks, BlockKind, TextBlock};
use crate::render::RenderedPage;
use crate::service::ImageService;
use crate::session::{Encyclopedia, Navigation, Page};
use crate::settings::{SettingsStore, MAX_SECTIONS, MIN_SECTIONS};
use std::sync::Arc;
use tracing::warn;

/// Output of one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Lines(Vec<String>),
    Quit,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Reply::Lines(vec![text.into()])
    }
}

pub const HELP: &[&str] = &[
    "[HELP]",
    "  <topic>          - Look up a topic",
    "  #follow <n>      - Follow link number n",
    "  #links           - List the links on the page",
    "  #back            - Previous article",
    "  #forward         - Next article",
    "  #home            - Clear history and return home",
    "  #topics          - Suggest some topics",
    "  #style <s>       - Set style: normal, modern or alien",
    "  #sections <n>    - Set the number of body sections",
    "  #dark            - Toggle dark mode for HTML output",
    "  #html <path>     - Write the current page as HTML",
    "  #status          - Show session status",
    "  #help            - Show this help",
    "  #quit            - Exit",
];

/// A line-driven front end over an [`Encyclopedia`].
pub struct HeadlessBrowser {
    session: Encyclopedia,
    images: Arc<dyn ImageService>,
    store: Option<SettingsStore>,
    page: Option<(RenderedPage, ImageStates)>,
}

impl HeadlessBrowser {
    pub fn new(session: Encyclopedia, images: Arc<dyn ImageService>) -> Self {
        Self {
            session,
            images,
            store: None,
            page: None,
        }
    }

    /// Persist settings changes to `store`.
    pub fn with_settings_store(mut self, store: SettingsStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn session(&self) -> &Encyclopedia {
        &self.session
    }

    /// The page on screen with its image states.
    pub fn page(&self) -> Option<&(RenderedPage, ImageStates)> {
        self.page.as_ref()
    }

    /// Handle one line of input.
    pub async fn execute(&mut self, line: &str) -> Reply {
        let line = line.trim();
        if line.is_empty() {
            return Reply::Lines(Vec::new());
        }

        let Some(command) = line.strip_prefix('#') else {
            let result = self.session.run_to_completion(line, None).await;
            return self.navigated(result, line).await;
        };

        let mut parts = command.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match name.as_str() {
            "quit" | "exit" => Reply::Quit,
            "help" => Reply::Lines(HELP.iter().map(|s| s.to_string()).collect()),
            "follow" => self.follow(arg).await,
            "links" => self.links(),
            "back" => match self.session.back() {
                Some(page) => self.show(page).await,
                None => Reply::line("[ERROR] Nothing to go back to"),
            },
            "forward" => match self.session.forward() {
                Some(page) => self.show(page).await,
                None => Reply::line("[ERROR] Nothing to go forward to"),
            },
            "home" => {
                self.session.home();
                self.page = None;
                Reply::line("[HOME] History cleared")
            }
            "topics" => {
                let mut lines = vec!["[TOPICS]".to_string()];
                lines.extend(self.session.random_topics().await.into_iter().map(|t| format!("  {t}")));
                Reply::Lines(lines)
            }
            "style" => match arg.parse::<ArticleStyle>() {
                Ok(style) => {
                    let settings = self.session.settings().with_style(style);
                    self.update_settings(settings).await;
                    Reply::line(format!("[SETTINGS] Style: {style}"))
                }
                Err(e) => Reply::line(format!("[ERROR] {e}")),
            },
            "sections" => match arg.parse::<u32>() {
                Ok(n) => {
                    let settings = self.session.settings().with_sections(n);
                    self.update_settings(settings).await;
                    Reply::line(format!(
                        "[SETTINGS] Sections: {}",
                        settings.number_of_sections
                    ))
                }
                Err(_) => Reply::line(format!(
                    "[ERROR] Usage: #sections <{MIN_SECTIONS}-{MAX_SECTIONS}>"
                )),
            },
            "dark" => {
                let mut settings = *self.session.settings();
                settings.dark_mode = !settings.dark_mode;
                self.update_settings(settings).await;
                Reply::line(format!("[SETTINGS] Dark mode: {}", settings.dark_mode))
            }
            "html" => self.write_html(arg).await,
            "status" => self.status(),
            _ => Reply::line("[ERROR] Unknown command. Type #help for help."),
        }
    }

    async fn follow(&mut self, arg: &str) -> Reply {
        let Ok(index) = arg.parse::<usize>() else {
            return Reply::line("[ERROR] Usage: #follow <n>");
        };
        let Some(link) = self
            .page
            .as_ref()
            .and_then(|(page, _)| page.links().get(index).map(|l| (*l).clone()))
        else {
            return Reply::line(format!("[ERROR] No link numbered {index}"));
        };
        if link.red {
            return Reply::line(format!("[RED LINK] {} has no article", link.label));
        }

        let result = self
            .session
            .follow_link_to_completion(&link.label, link.taxon_rank)
            .await;
        self.navigated(result, &link.label).await
    }

    async fn navigated(&mut self, result: Result<Navigation, PipelineError>, query: &str) -> Reply {
        match result {
            Ok(Navigation::Page { page, .. }) => self.show(page).await,
            Ok(Navigation::SelfLink) => Reply::line("[SELF LINK] Already on this article"),
            Ok(Navigation::Ignored) => Reply::Lines(Vec::new()),
            Err(e) => {
                let page = self.session.error_page(&e, query);
                let lines = page_lines(&page, &ImageStates::default());
                self.page = Some((page, ImageStates::default()));
                Reply::Lines(lines)
            }
        }
    }

    async fn show(&mut self, page: Page) -> Reply {
        let rendered = page.rendered;
        let states = fill_all(self.images.clone(), &rendered.images).await;
        let mut lines = vec![format!("[ARTICLE] {}", page.article.title)];
        lines.extend(page_lines(&rendered, &states));
        self.page = Some((rendered, states));
        Reply::Lines(lines)
    }

    fn links(&self) -> Reply {
        let Some((page, _)) = &self.page else {
            return Reply::line("[ERROR] No article shown");
        };
        let mut lines = vec!["[LINKS]".to_string()];
        for (i, link) in page.links().iter().enumerate() {
            let red = if link.red { " (red)" } else { "" };
            lines.push(format!("  {i}: {}{red}", link.label));
        }
        Reply::Lines(lines)
    }

    fn status(&self) -> Reply {
        let settings = self.session.settings();
        let history = self.session.history_state();
        Reply::Lines(vec![
            "[STATUS]".to_string(),
            format!("  State: {}", self.session.state()),
            format!(
                "  Article: {}",
                self.session.current().map_or("(none)", |a| a.title.as_str())
            ),
            format!("  History: {} entries", self.session.history().len()),
            format!("  Back: {}, Forward: {}", history.can_go_back, history.can_go_forward),
            format!("  Style: {}", settings.article_style),
            format!("  Sections: {}", settings.number_of_sections),
            format!("  Dark mode: {}", settings.dark_mode),
        ])
    }

    async fn write_html(&self, path: &str) -> Reply {
        if path.is_empty() {
            return Reply::line("[ERROR] Usage: #html <path>");
        }
        let Some((page, states)) = &self.page else {
            return Reply::line("[ERROR] No article shown");
        };
        let html = to_document(page, states, self.session.settings().dark_mode);
        match tokio::fs::write(path, html).await {
            Ok(()) => Reply::line(format!("[SAVED] {path}")),
            Err(e) => Reply::line(format!("[ERROR] Could not write {path}: {e}")),
        }
    }

    async fn update_settings(&mut self, settings: crate::settings::Settings) {
        self.session.set_settings(settings);
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&settings).await {
                warn!(error = %e, path = %store.path().display(), "Failed to save settings");
            }
        }
    }
}

/// Format a page as output lines.
pub fn page_lines(page: &RenderedPage, images: &ImageStates) -> Vec<String> {
    to_blocks(page, images).iter().map(block_line).collect()
}

fn block_line(block: &TextBlock) -> String {
    let text: String = block
        .spans
        .iter()
        .map(|span| match span.link {
            Some(link) if link.red => format!("{}[{}*]", span.text, link.index),
            Some(link) => format!("{}[{}]", span.text, link.index),
            None => span.text.clone(),
        })
        .collect();

    match block.kind {
        BlockKind::Title => format!("= {text} ="),
        BlockKind::Heading => format!("== {text} =="),
        BlockKind::SubHeading => format!("--- {text} ---"),
        BlockKind::Paragraph => text,
        BlockKind::ListItem => format!("  * {text}"),
        BlockKind::Ambox => format!("[AMBOX] {text}"),
        BlockKind::InfoboxRow => format!("  | {text}"),
        BlockKind::Image => format!("  {text}"),
        BlockKind::Error => format!("[ERROR] {text}"),
        BlockKind::Notice => format!("[NOTICE] {text}"),
    }
}
