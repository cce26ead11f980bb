//! Main application state and logic

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use infinipedia_core::images::resolve_slot;
use infinipedia_core::render::html::to_document;
use infinipedia_core::settings::{MAX_SECTIONS, MIN_SECTIONS};
use infinipedia_core::{
    CohesionOutcome, CohesionRequest, Encyclopedia, ImageService, ImageState, ImageStates,
    InternalLink, Navigation, Page, PipelineError, RenderedPage, Settings, SettingsStore,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ui::theme::Theme;
use crate::ui::widgets::article::ArticleViewState;
use crate::ui::Overlay;

const MAX_SEARCH_HISTORY: usize = 100;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Navigation and hotkeys
    #[default]
    Normal,
    /// Typing a search query
    Insert,
    /// Entering a `:` command
    Command,
}

/// Work that awaits the network, run by the event loop between frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Search(String),
    Follow(InternalLink),
    Topics,
    SaveSettings,
    WriteHtml(PathBuf),
}

impl PendingAction {
    /// Status line shown while the action runs, if any.
    pub fn status_text(&self) -> Option<String> {
        match self {
            PendingAction::Search(query) => Some(format!("Generating \"{query}\"...")),
            PendingAction::Follow(link) => Some(format!("Generating \"{}\"...", link.label)),
            PendingAction::Topics => Some("Summoning topics...".to_string()),
            PendingAction::SaveSettings | PendingAction::WriteHtml(_) => None,
        }
    }
}

/// Results reported by spawned tasks.
#[derive(Debug)]
pub enum BackgroundEvent {
    Image {
        generation: u64,
        id: usize,
        state: ImageState,
    },
    Cohesion(CohesionOutcome),
}

/// The page on screen with its image states.
#[derive(Debug)]
pub struct ShownPage {
    /// `None` for error pages.
    pub title: Option<String>,
    pub rendered: RenderedPage,
    pub images: ImageStates,
    pub generation: u64,
}

/// Main application state
pub struct App {
    pub session: Encyclopedia,
    images: Arc<dyn ImageService>,
    store: SettingsStore,
    background_tx: mpsc::UnboundedSender<BackgroundEvent>,
    background_rx: mpsc::UnboundedReceiver<BackgroundEvent>,

    // UI state
    pub theme: Theme,
    overlay: Option<Overlay>,
    pub page: Option<ShownPage>,
    pub topics: Vec<String>,
    /// Selected link on a page, or selected topic on the welcome screen.
    pub selected: Option<usize>,
    pub view: ArticleViewState,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    search_history: VecDeque<String>,
    history_index: Option<usize>,
    saved_input: Option<String>,

    status_message: Option<String>,
    pending: Option<PendingAction>,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: Encyclopedia, images: Arc<dyn ImageService>, store: SettingsStore) -> Self {
        let (background_tx, background_rx) = mpsc::unbounded_channel();
        let theme = Theme::for_mode(session.settings().dark_mode);

        Self {
            session,
            images,
            store,
            background_tx,
            background_rx,
            theme,
            overlay: None,
            page: None,
            topics: Vec::new(),
            selected: None,
            view: ArticleViewState::default(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            search_history: VecDeque::with_capacity(MAX_SEARCH_HISTORY),
            history_index: None,
            saved_input: None,
            status_message: None,
            pending: Some(PendingAction::Topics),
            should_quit: false,
        }
    }

    // =========================================================================
    // Pending work
    // =========================================================================

    fn queue(&mut self, action: PendingAction) {
        if let Some(replaced) = self.pending.replace(action) {
            debug!(?replaced, "Replacing queued action");
        }
    }

    pub fn take_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    /// Run a queued action to completion.
    pub async fn perform(&mut self, action: PendingAction) {
        match action {
            PendingAction::Search(query) => {
                let result = self.session.run(&query, None).await;
                self.navigated(result, &query);
            }
            PendingAction::Follow(link) => {
                let result = self.session.follow_link(&link.label, link.taxon_rank).await;
                self.navigated(result, &link.label);
            }
            PendingAction::Topics => {
                self.topics = self.session.random_topics().await;
                if self.page.is_none() {
                    self.selected = None;
                }
                self.clear_status();
            }
            PendingAction::SaveSettings => {
                if let Err(e) = self.store.save(self.session.settings()).await {
                    warn!(error = %e, path = %self.store.path().display(), "Failed to save settings");
                    self.set_status(format!("Could not save settings: {e}"));
                }
            }
            PendingAction::WriteHtml(path) => {
                let Some(page) = &self.page else {
                    self.set_status("No article to save");
                    return;
                };
                let html = to_document(&page.rendered, &page.images, self.session.settings().dark_mode);
                match tokio::fs::write(&path, html).await {
                    Ok(()) => self.set_status(format!("Saved {}", path.display())),
                    Err(e) => self.set_status(format!("Could not write {}: {e}", path.display())),
                }
            }
        }
    }

    fn navigated(&mut self, result: Result<Navigation, PipelineError>, query: &str) {
        match result {
            Ok(Navigation::Page { page, cohesion }) => {
                self.show(page);
                if let Some(request) = cohesion {
                    self.spawn_cohesion(request);
                }
                self.clear_status();
            }
            Ok(Navigation::SelfLink) => {
                self.scroll_to_top();
                self.set_status("Already reading this article");
            }
            Ok(Navigation::Ignored) => self.clear_status(),
            Err(PipelineError::Busy) => self.set_status("Still generating the previous article"),
            Err(e) => {
                let rendered = self.session.error_page(&e, query);
                self.page = Some(ShownPage {
                    title: None,
                    rendered,
                    images: ImageStates::default(),
                    generation: self.session.generation(),
                });
                self.reset_view();
                self.set_status(e.to_string());
            }
        }
    }

    fn show(&mut self, page: Page) {
        let generation = page.generation;
        for slot in &page.rendered.images {
            let service = self.images.clone();
            let tx = self.background_tx.clone();
            let slot = slot.clone();
            tokio::spawn(async move {
                let state = resolve_slot(service.as_ref(), &slot).await;
                let _ = tx.send(BackgroundEvent::Image {
                    generation,
                    id: slot.id,
                    state,
                });
            });
        }

        self.page = Some(ShownPage {
            title: Some(page.article.title.clone()),
            images: ImageStates::pending(page.rendered.images.len()),
            rendered: page.rendered,
            generation,
        });
        self.reset_view();
    }

    fn spawn_cohesion(&self, request: CohesionRequest) {
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(BackgroundEvent::Cohesion(request.run().await));
        });
    }

    /// Apply every background result that has arrived.
    pub fn drain_background(&mut self) {
        while let Ok(event) = self.background_rx.try_recv() {
            self.apply_background(event);
        }
    }

    pub fn apply_background(&mut self, event: BackgroundEvent) {
        match event {
            BackgroundEvent::Image {
                generation,
                id,
                state,
            } => match self.page.as_mut().filter(|p| p.generation == generation) {
                Some(page) => page.images.set(id, state),
                None => debug!(generation, id, "Dropping stale image"),
            },
            BackgroundEvent::Cohesion(outcome) => {
                let Some(page) = self.page.as_mut().filter(|p| p.generation == outcome.generation)
                else {
                    debug!(generation = outcome.generation, "Dropping stale cohesion result");
                    return;
                };
                if let Some(topic) = outcome.result.suggestion() {
                    page.rendered.push_cohesion_notice(topic);
                }
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.queue(PendingAction::Search(query.to_string()));
    }

    /// Number of selectable items on screen.
    pub fn selectable_count(&self) -> usize {
        match &self.page {
            Some(page) => page.rendered.links().len(),
            None => self.topics.len(),
        }
    }

    pub fn select_next(&mut self) {
        let count = self.selectable_count();
        if count == 0 {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| (i + 1) % count));
        self.view.follow_selection = true;
    }

    pub fn select_prev(&mut self) {
        let count = self.selectable_count();
        if count == 0 {
            return;
        }
        self.selected = Some(self.selected.map_or(count - 1, |i| (i + count - 1) % count));
        self.view.follow_selection = true;
    }

    /// Follow the selected link or search the selected topic.
    pub fn activate_selection(&mut self) {
        let Some(index) = self.selected else {
            self.set_status("Select a link with Tab first");
            return;
        };
        match &self.page {
            Some(_) => self.follow(index),
            None => {
                if let Some(topic) = self.topics.get(index).cloned() {
                    self.search(&topic);
                }
            }
        }
    }

    /// Follow link number `index` on the current page.
    pub fn follow(&mut self, index: usize) {
        let Some(link) = self
            .page
            .as_ref()
            .and_then(|p| p.rendered.links().get(index).map(|l| (*l).clone()))
        else {
            self.set_status(format!("No link numbered {index}"));
            return;
        };
        if link.red {
            self.set_status(format!("\"{}\" has no article yet", link.label));
            return;
        }
        self.queue(PendingAction::Follow(link));
    }

    pub fn back(&mut self) {
        match self.session.back() {
            Some(page) => self.show(page),
            None => self.set_status("Nothing to go back to"),
        }
    }

    pub fn forward(&mut self) {
        match self.session.forward() {
            Some(page) => self.show(page),
            None => self.set_status("Nothing to go forward to"),
        }
    }

    /// Clear history and return to the welcome screen.
    pub fn home(&mut self) {
        self.session.home();
        self.page = None;
        self.reset_view();
        self.set_status("History cleared");
    }

    pub fn refresh_topics(&mut self) {
        self.queue(PendingAction::Topics);
    }

    fn reset_view(&mut self) {
        self.selected = None;
        self.view = ArticleViewState::default();
    }

    // =========================================================================
    // Settings
    // =========================================================================

    fn update_settings(&mut self, settings: Settings) {
        self.session.set_settings(settings);
        self.theme = Theme::for_mode(settings.dark_mode);
        self.queue(PendingAction::SaveSettings);
    }

    pub fn cycle_style(&mut self) {
        let current = *self.session.settings();
        let settings = current.with_style(current.article_style.next());
        self.update_settings(settings);
        self.set_status(format!("Article style: {}", settings.article_style));
    }

    pub fn adjust_sections(&mut self, delta: i32) {
        let current = *self.session.settings();
        let sections = current.number_of_sections.saturating_add_signed(delta);
        self.set_sections(sections);
    }

    pub fn set_sections(&mut self, sections: u32) {
        let settings = self.session.settings().with_sections(sections);
        self.update_settings(settings);
        self.set_status(format!(
            "Sections per article: {} ({MIN_SECTIONS}-{MAX_SECTIONS})",
            settings.number_of_sections
        ));
    }

    pub fn toggle_dark_mode(&mut self) {
        let mut settings = *self.session.settings();
        settings.dark_mode = !settings.dark_mode;
        self.update_settings(settings);
        self.set_status(if settings.dark_mode {
            "Dark mode on"
        } else {
            "Dark mode off"
        });
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Run a `:` command. Returns true when the app should quit.
    pub fn process_command(&mut self, command: &str) -> bool {
        let command = command.trim_start_matches(':').trim();
        let mut parts = command.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match name {
            "" => {}
            "q" | "quit" => return true,
            "help" | "h" => self.toggle_help(),
            "home" => self.home(),
            "back" => self.back(),
            "forward" => self.forward(),
            "topics" => self.refresh_topics(),
            "dark" => self.toggle_dark_mode(),
            "follow" | "f" => match arg.parse::<usize>() {
                Ok(index) => self.follow(index),
                Err(_) => self.set_status("Usage: :follow <n>"),
            },
            "style" if arg.is_empty() => self.cycle_style(),
            "style" => match arg.parse() {
                Ok(style) => {
                    let settings = self.session.settings().with_style(style);
                    self.update_settings(settings);
                    self.set_status(format!("Article style: {style}"));
                }
                Err(e) => self.set_status(e),
            },
            "sections" => match arg.parse::<u32>() {
                Ok(n) => self.set_sections(n),
                Err(_) => self.set_status(format!("Usage: :sections <{MIN_SECTIONS}-{MAX_SECTIONS}>")),
            },
            "w" | "html" => {
                if arg.is_empty() {
                    self.set_status("Usage: :w <path>");
                } else if self.page.is_none() {
                    self.set_status("No article to save");
                } else {
                    self.queue(PendingAction::WriteHtml(PathBuf::from(arg)));
                }
            }
            other => self.set_status(format!("Unknown command: {other}")),
        }
        false
    }

    // =========================================================================
    // Input editing
    // =========================================================================

    pub fn enter_insert_mode(&mut self) {
        self.input_mode = InputMode::Insert;
        self.input_buffer.clear();
        self.cursor_position = 0;
    }

    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.input_buffer.clear();
        self.input_buffer.push(':');
        self.cursor_position = 1;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.cursor_position = 0;
        self.history_index = None;
        self.saved_input = None;
    }

    /// Take the input line, recording searches for history browsing.
    pub fn submit_input(&mut self) -> Option<String> {
        if self.input_buffer.trim().is_empty() {
            return None;
        }

        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;

        if !input.starts_with(':') {
            self.search_history.retain(|q| q != &input);
            self.search_history.push_front(input.clone());
            self.search_history.truncate(MAX_SEARCH_HISTORY);
        }
        self.history_index = None;
        self.saved_input = None;

        Some(input)
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input_buffer
            .char_indices()
            .nth(char_index)
            .map_or(self.input_buffer.len(), |(i, _)| i)
    }

    pub fn type_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor_position);
        self.input_buffer.insert(at, c);
        self.cursor_position += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let at = self.byte_index(self.cursor_position);
        if at < self.input_buffer.len() {
            self.input_buffer.remove(at);
        }
    }

    pub fn delete(&mut self) {
        let at = self.byte_index(self.cursor_position);
        if at < self.input_buffer.len() {
            self.input_buffer.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let len = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(len);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Step back through earlier searches.
    pub fn history_prev(&mut self) {
        let next = match self.history_index {
            None if self.search_history.is_empty() => return,
            None => {
                self.saved_input = Some(self.input_buffer.clone());
                0
            }
            Some(i) => (i + 1).min(self.search_history.len() - 1),
        };
        self.load_history(next);
    }

    /// Step forward again, ending at the line being typed.
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.input_buffer = self.saved_input.take().unwrap_or_default();
                self.history_index = None;
                self.cursor_end();
            }
            Some(i) => self.load_history(i - 1),
        }
    }

    fn load_history(&mut self, index: usize) {
        if let Some(entry) = self.search_history.get(index) {
            self.input_buffer = entry.clone();
            self.history_index = Some(index);
            self.cursor_end();
        }
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    pub fn scroll_up(&mut self, lines: usize) {
        self.view.scroll = self.view.scroll.saturating_sub(lines);
        self.view.follow_selection = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.view.scroll = self.view.scroll.saturating_add(lines);
        self.view.follow_selection = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.view.scroll = 0;
        self.view.follow_selection = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        // The widget clamps this to the real maximum.
        self.view.scroll = usize::MAX / 2;
        self.view.follow_selection = false;
    }

    // =========================================================================
    // Status and overlays
    // =========================================================================

    /// Show what a pending action is about to do, keeping the current
    /// message for actions that run silently.
    pub fn announce(&mut self, action: &PendingAction) {
        if let Some(text) = action.status_text() {
            self.set_status(text);
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn toggle_help(&mut self) {
        self.overlay = match self.overlay {
            Some(Overlay::Help) => None,
            None => Some(Overlay::Help),
        };
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinipedia_core::testing::{article_json, category_json};
    use infinipedia_core::{CohesionResult, EncyclopediaConfig, MockCompletion, MockImages};

    fn app_with(replies: Vec<String>) -> (App, tempfile::TempDir) {
        let mock = Arc::new(MockCompletion::new(replies));
        let session = Encyclopedia::with_seed(mock, EncyclopediaConfig::new().deterministic(), 1);
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        (App::new(session, Arc::new(MockImages::new()), store), dir)
    }

    #[tokio::test]
    async fn test_starts_by_fetching_topics() {
        let (mut app, _dir) = app_with(vec![r#"{"topics": ["Keon", "Poris"]}"#.to_string()]);
        let action = app.take_pending().unwrap();
        assert_eq!(action, PendingAction::Topics);

        app.perform(action).await;
        assert_eq!(app.topics, vec!["Keon", "Poris"]);
        assert_eq!(app.selectable_count(), 2);
    }

    #[tokio::test]
    async fn test_search_shows_page() {
        let (mut app, _dir) = app_with(vec![category_json("Food"), article_json("Gloomfruit")]);
        app.take_pending();

        app.search("  Gloomfruit ");
        let action = app.take_pending().unwrap();
        assert_eq!(action, PendingAction::Search("Gloomfruit".to_string()));
        app.perform(action).await;

        let page = app.page.as_ref().unwrap();
        assert_eq!(page.title.as_deref(), Some("Gloomfruit"));
        assert_eq!(page.generation, app.session.generation());
    }

    #[test]
    fn test_announce_pending_action() {
        let (mut app, _dir) = app_with(Vec::new());
        app.announce(&PendingAction::Search("Keon".to_string()));
        assert_eq!(app.status_message(), Some("Generating \"Keon\"..."));

        app.announce(&PendingAction::SaveSettings);
        assert_eq!(app.status_message(), Some("Generating \"Keon\"..."));
    }

    #[tokio::test]
    async fn test_self_link_scrolls_to_top() {
        let (mut app, _dir) = app_with(vec![category_json("Region"), article_json("Keon")]);
        app.take_pending();
        app.perform(PendingAction::Search("Keon".to_string())).await;
        app.scroll_down(12);

        let index = app
            .page
            .as_ref()
            .unwrap()
            .rendered
            .links()
            .iter()
            .position(|l| l.label == "Keon")
            .unwrap();
        app.follow(index);
        let action = app.take_pending().unwrap();
        app.perform(action).await;

        assert_eq!(app.view.scroll, 0);
        assert_eq!(app.status_message(), Some("Already reading this article"));
        assert_eq!(app.session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_search_shows_error_page() {
        let (mut app, _dir) = app_with(vec![category_json("Food"), "not json".to_string()]);
        app.take_pending();

        app.search("Gloomfruit");
        let action = app.take_pending().unwrap();
        app.perform(action).await;

        let page = app.page.as_ref().unwrap();
        assert!(page.title.is_none());
        assert!(app.session.history().is_empty());
        assert!(app.status_message().is_some());
    }

    #[tokio::test]
    async fn test_stale_background_results_are_dropped() {
        let (mut app, _dir) = app_with(Vec::new());
        app.take_pending();
        app.perform(PendingAction::Search("Infinipedia".to_string())).await;
        let generation = app.page.as_ref().unwrap().generation;

        app.apply_background(BackgroundEvent::Image {
            generation: generation + 1,
            id: 0,
            state: ImageState::Ready("late".to_string()),
        });
        assert_eq!(app.page.as_ref().unwrap().images.get(0), &ImageState::Pending);

        app.apply_background(BackgroundEvent::Image {
            generation,
            id: 0,
            state: ImageState::Ready("mock://0".to_string()),
        });
        assert_eq!(
            app.page.as_ref().unwrap().images.get(0),
            &ImageState::Ready("mock://0".to_string())
        );

        app.apply_background(BackgroundEvent::Cohesion(CohesionOutcome {
            generation,
            result: CohesionResult {
                is_relevant: false,
                suggested_topic: Some("The Librarians".to_string()),
            },
        }));
        let nodes = app.page.as_ref().unwrap().rendered.nodes.len();
        app.apply_background(BackgroundEvent::Cohesion(CohesionOutcome {
            generation: generation + 5,
            result: CohesionResult {
                is_relevant: false,
                suggested_topic: Some("Ignored".to_string()),
            },
        }));
        assert_eq!(app.page.as_ref().unwrap().rendered.nodes.len(), nodes);
    }

    #[tokio::test]
    async fn test_link_selection_wraps() {
        let (mut app, _dir) = app_with(Vec::new());
        app.take_pending();
        app.perform(PendingAction::Search("Infinipedia".to_string())).await;

        let count = app.selectable_count();
        assert!(count > 1);
        app.select_prev();
        assert_eq!(app.selected, Some(count - 1));
        app.select_next();
        assert_eq!(app.selected, Some(0));
        assert!(app.view.follow_selection);
    }

    #[test]
    fn test_commands() {
        let (mut app, _dir) = app_with(Vec::new());
        app.take_pending();

        assert!(app.process_command(":q"));
        assert!(!app.process_command(":sections 99"));
        assert_eq!(app.session.settings().number_of_sections, MAX_SECTIONS);
        assert_eq!(app.take_pending(), Some(PendingAction::SaveSettings));

        assert!(!app.process_command(":style martian"));
        assert_eq!(app.status_message(), Some("unknown article style: martian"));

        assert!(!app.process_command(":w out.html"));
        assert_eq!(app.status_message(), Some("No article to save"));
    }

    #[test]
    fn test_unicode_editing() {
        let (mut app, _dir) = app_with(Vec::new());
        app.enter_insert_mode();
        for c in "Ærø".chars() {
            app.type_char(c);
        }
        app.cursor_left();
        app.backspace();
        assert_eq!(app.input_buffer(), "Æø");
        app.cursor_home();
        app.delete();
        assert_eq!(app.input_buffer(), "ø");
    }

    #[test]
    fn test_search_history() {
        let (mut app, _dir) = app_with(Vec::new());
        for query in ["Keon", "Poris"] {
            app.enter_insert_mode();
            for c in query.chars() {
                app.type_char(c);
            }
            app.submit_input();
        }

        app.type_char('x');
        app.history_prev();
        assert_eq!(app.input_buffer(), "Poris");
        app.history_prev();
        assert_eq!(app.input_buffer(), "Keon");
        app.history_prev();
        assert_eq!(app.input_buffer(), "Keon");
        app.history_next();
        app.history_next();
        assert_eq!(app.input_buffer(), "x");
    }
}
