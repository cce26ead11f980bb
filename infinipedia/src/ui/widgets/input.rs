//! Search and command input widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::Theme;

/// Input field widget
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a Theme,
    placeholder: &'a str,
    is_active: bool,
    is_command_mode: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a Theme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            placeholder: "Search Infinipedia...",
            is_active: false,
            is_command_mode: false,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn command_mode(mut self, is_command: bool) -> Self {
        self.is_command_mode = is_command;
        self
    }

    fn line(&self) -> Line<'a> {
        let prompt_style = self.theme.base_style().fg(self.theme.link);

        if self.content.is_empty() && !self.is_active {
            return Line::from(vec![
                Span::styled("🔍 ", prompt_style),
                Span::styled(self.placeholder, self.theme.dim_style()),
            ]);
        }

        // The ':' lives in the buffer; draw it as the prompt instead.
        let (prefix, text, cursor) = match self.content.strip_prefix(':') {
            Some(rest) if self.is_command_mode => {
                (":", rest, self.cursor_position.saturating_sub(1))
            }
            _ => ("🔍 ", self.content, self.cursor_position),
        };

        let mut spans = vec![Span::styled(prefix, prompt_style)];
        let before: String = text.chars().take(cursor).collect();
        let at: String = text.chars().nth(cursor).map_or_else(|| " ".to_string(), String::from);
        let after: String = text.chars().skip(cursor + 1).collect();

        spans.push(Span::styled(before, self.theme.base_style()));
        if self.is_active {
            spans.push(Span::styled(
                at,
                self.theme
                    .base_style()
                    .add_modifier(Modifier::UNDERLINED | Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(at, self.theme.base_style()));
        }
        spans.push(Span::styled(after, self.theme.base_style()));
        Line::from(spans)
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.is_active))
            .style(self.theme.base_style());

        let inner = block.inner(area);
        block.render(area, buf);
        Paragraph::new(self.line()).render(inner, buf);
    }
}
