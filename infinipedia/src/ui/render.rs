//! Render orchestration for the encyclopedia TUI

use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use infinipedia_core::render::text::to_blocks;

use crate::app::{App, InputMode};
use crate::ui::layout::{centered_rect_fixed, AppLayout};
use crate::ui::widgets::{
    ArticleWidget, HotkeyBarWidget, InputWidget, StatusBarWidget, WelcomeWidget,
};

/// Overlay types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
}

/// Main render function
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    frame.render_widget(Block::default().style(app.theme.base_style()), area);

    render_title_bar(frame, app, layout.title_area);
    render_page(frame, app, layout.page_area);
    render_status_bar(frame, app, layout.status_bar);
    frame.render_widget(
        HotkeyBarWidget::new(app.input_mode, app.page.is_some(), &app.theme),
        layout.hotkey_bar,
    );
    render_input(frame, app, layout.input_area);

    if let Some(Overlay::Help) = app.overlay() {
        render_help_overlay(frame, app, area);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let base = app.theme.base_style();
    let mut spans = vec![Span::styled(" Infinipedia ", base.add_modifier(Modifier::BOLD))];

    if let Some(title) = app.page.as_ref().and_then(|p| p.title.as_deref()) {
        spans.push(Span::styled("| ", app.theme.dim_style()));
        spans.push(Span::styled(title, base));
    }

    let history = app.session.history();
    if let Some(cursor) = history.cursor() {
        spans.push(Span::styled(
            format!("  [{}/{}]", cursor + 1, history.len()),
            app.theme.dim_style(),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base), area);
}

fn render_page(frame: &mut Frame, app: &mut App, area: Rect) {
    match &app.page {
        Some(page) => {
            let blocks = to_blocks(&page.rendered, &page.images);
            let widget = ArticleWidget::new(&blocks, &app.theme)
                .selected(app.selected)
                .title(page.title.as_deref().unwrap_or("Error"));
            frame.render_stateful_widget(widget, area, &mut app.view);
        }
        None => {
            let widget = WelcomeWidget::new(&app.topics, &app.theme)
                .selected(app.selected)
                .loading(app.topics.is_empty());
            frame.render_widget(widget, area);
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let widget = StatusBarWidget::new(
        app.input_mode,
        app.session.state(),
        app.session.settings(),
        app.session.history_state(),
        &app.theme,
    )
    .message(app.status_message());

    frame.render_widget(widget, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = matches!(app.input_mode, InputMode::Insert | InputMode::Command);
    let is_command = matches!(app.input_mode, InputMode::Command);

    let widget = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .active(is_active)
        .command_mode(is_command);

    frame.render_widget(widget, area);
}

fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(56, 30, area);
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            app.theme.base_style().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            " Infinipedia - Help ",
            app.theme.base_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Modes:"),
        Line::from("  / or i     Search for a topic"),
        Line::from("  :          Enter COMMAND mode"),
        Line::from("  Esc        Return to NORMAL mode"),
        Line::from(""),
        heading("Reading:"),
        Line::from("  j/k ↑/↓    Scroll"),
        Line::from("  PgUp/PgDn  Scroll by page"),
        Line::from("  g/G        Top/bottom"),
        Line::from("  Tab/S-Tab  Select next/previous link"),
        Line::from("  Enter      Follow the selected link"),
        Line::from("  h/l        Back/forward"),
        Line::from("  H          Clear history and go home"),
        Line::from(""),
        heading("Settings:"),
        Line::from("  s          Cycle article style"),
        Line::from("  +/-        More/fewer sections"),
        Line::from("  D          Toggle dark mode"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  :q                Quit"),
        Line::from("  :follow <n>       Follow link number n"),
        Line::from("  :style <s>        normal, modern or alien"),
        Line::from("  :sections <n>     Body sections per article"),
        Line::from("  :w <path>         Save the page as HTML"),
        Line::from(""),
        Line::from(Span::styled("Press Esc or q to close", app.theme.dim_style())),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true))
        .style(app.theme.base_style());

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
