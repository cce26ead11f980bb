//! Welcome screen with suggested topics

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::ui::theme::Theme;

pub struct WelcomeWidget<'a> {
    topics: &'a [String],
    selected: Option<usize>,
    theme: &'a Theme,
    loading: bool,
}

impl<'a> WelcomeWidget<'a> {
    pub fn new(topics: &'a [String], theme: &'a Theme) -> Self {
        Self {
            topics,
            selected: None,
            theme,
            loading: false,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let base = self.theme.base_style();
        let mut lines = vec![
            Line::default(),
            Line::from(Span::styled(
                "Infinipedia",
                base.fg(self.theme.title).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "The Infinite Encyclopedia",
                base.add_modifier(Modifier::ITALIC),
            )),
            Line::default(),
            Line::from(Span::styled(
                "Every article is written the moment you ask for it.",
                self.theme.dim_style(),
            )),
            Line::from(Span::styled(
                "Press / to search, or pick a topic below.",
                self.theme.dim_style(),
            )),
            Line::default(),
        ];

        if self.loading && self.topics.is_empty() {
            lines.push(Line::from(Span::styled("Summoning topics...", self.theme.dim_style())));
            return lines;
        }

        for (i, topic) in self.topics.iter().enumerate() {
            let selected = self.selected == Some(i);
            lines.push(Line::from(Span::styled(
                topic.as_str(),
                self.theme.link_style(base, false, selected),
            )));
        }
        lines
    }
}

impl Widget for WelcomeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false))
            .style(self.theme.base_style());

        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.lines())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_topics_after_loading() {
        let theme = Theme::light();
        let topics = vec!["Keon".to_string(), "Poris".to_string()];
        let lines = WelcomeWidget::new(&topics, &theme).selected(Some(1)).lines();
        let last = lines.last().unwrap();
        assert_eq!(last.spans[0].content, "Poris");
        assert_eq!(last.spans[0].style.bg, Some(theme.selection));
    }

    #[test]
    fn test_loading_message() {
        let theme = Theme::light();
        let lines = WelcomeWidget::new(&[], &theme).loading(true).lines();
        assert_eq!(lines.last().unwrap().spans[0].content, "Summoning topics...");
    }
}
