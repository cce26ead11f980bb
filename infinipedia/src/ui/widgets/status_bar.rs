//! Status bar and hotkey hints

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use infinipedia_core::{ArticleStyle, HistoryState, PipelineState, Settings};

use crate::app::InputMode;
use crate::ui::theme::Theme;

/// Human label for an article style
pub fn style_label(style: ArticleStyle) -> &'static str {
    match style {
        ArticleStyle::Normal => "Normal",
        ArticleStyle::Modern => "Modern Age",
        ArticleStyle::Alien => "Alien",
    }
}

/// Mode, pipeline state, settings and the latest message
pub struct StatusBarWidget<'a> {
    input_mode: InputMode,
    state: PipelineState,
    settings: &'a Settings,
    history: HistoryState,
    theme: &'a Theme,
    message: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(
        input_mode: InputMode,
        state: PipelineState,
        settings: &'a Settings,
        history: HistoryState,
        theme: &'a Theme,
    ) -> Self {
        Self {
            input_mode,
            state,
            settings,
            history,
            theme,
            message: None,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    fn mode_span(&self) -> Span<'static> {
        let (label, color) = match self.input_mode {
            InputMode::Normal => (" NORMAL ", Color::Blue),
            InputMode::Insert => (" SEARCH ", Color::Green),
            InputMode::Command => (" COMMAND ", Color::Magenta),
        };
        Span::styled(
            label,
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )
    }

    fn line(&self) -> Line<'a> {
        let base = self.theme.base_style();
        let dim = self.theme.dim_style();
        let arrow = |enabled: bool, symbol: &'static str| {
            Span::styled(symbol, if enabled { base } else { dim })
        };

        let mut spans = vec![
            self.mode_span(),
            Span::raw(" "),
            arrow(self.history.can_go_back, "◀"),
            arrow(self.history.can_go_forward, "▶"),
            Span::styled(" | ", dim),
            Span::styled(format!("{}", self.state), base),
            Span::styled(" | ", dim),
            Span::styled(style_label(self.settings.article_style), base),
            Span::styled(" | ", dim),
            Span::styled(format!("{} sections", self.settings.number_of_sections), base),
        ];
        if self.settings.dark_mode {
            spans.push(Span::styled(" | ", dim));
            spans.push(Span::styled("dark", base));
        }
        if let Some(message) = self.message {
            spans.push(Span::styled(" | ", dim));
            spans.push(Span::styled(
                message,
                base.fg(self.theme.notice).add_modifier(Modifier::BOLD),
            ));
        }
        Line::from(spans)
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line())
            .style(self.theme.base_style())
            .render(area, buf);
    }
}

/// Key hints for the current mode
pub struct HotkeyBarWidget<'a> {
    input_mode: InputMode,
    on_page: bool,
    theme: &'a Theme,
}

impl<'a> HotkeyBarWidget<'a> {
    pub fn new(input_mode: InputMode, on_page: bool, theme: &'a Theme) -> Self {
        Self {
            input_mode,
            on_page,
            theme,
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        match (self.input_mode, self.on_page) {
            (InputMode::Insert, _) => &[("Enter", "search"), ("↑↓", "history"), ("Esc", "cancel")],
            (InputMode::Command, _) => &[("Enter", "run"), ("Esc", "cancel")],
            (InputMode::Normal, true) => &[
                ("/", "search"),
                ("Tab", "link"),
                ("Enter", "follow"),
                ("h/l", "back/fwd"),
                ("H", "home"),
                ("s", "style"),
                ("+/-", "sections"),
                ("D", "dark"),
                ("?", "help"),
                ("q", "quit"),
            ],
            (InputMode::Normal, false) => &[
                ("/", "search"),
                ("Tab", "topic"),
                ("Enter", "open"),
                ("r", "new topics"),
                ("s", "style"),
                ("?", "help"),
                ("q", "quit"),
            ],
        }
    }
}

impl Widget for HotkeyBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key_style = self.theme.base_style().add_modifier(Modifier::BOLD);
        let spans: Vec<Span> = self
            .hints()
            .iter()
            .flat_map(|(key, action)| {
                [
                    Span::styled(*key, key_style),
                    Span::styled(format!(" {action}  "), self.theme.dim_style()),
                ]
            })
            .collect();

        Paragraph::new(Line::from(spans))
            .style(self.theme.base_style())
            .render(area, buf);
    }
}
