//! Article display widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget,
        Widget, Wrap,
    },
};

use infinipedia_core::render::text::{BlockKind, TextBlock};

use crate::ui::theme::Theme;

/// Scroll position of the article view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleViewState {
    pub scroll: usize,
    /// Scroll the selected link into view on the next draw.
    pub follow_selection: bool,
}

/// Widget for a rendered page
pub struct ArticleWidget<'a> {
    blocks: &'a [TextBlock],
    theme: &'a Theme,
    selected: Option<usize>,
    title: &'a str,
}

impl<'a> ArticleWidget<'a> {
    pub fn new(blocks: &'a [TextBlock], theme: &'a Theme) -> Self {
        Self {
            blocks,
            theme,
            selected: None,
            title: "",
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    /// Lines to draw, and the index of the line holding the selected link.
    fn lines(&self) -> (Vec<Line<'a>>, Option<usize>) {
        let mut lines: Vec<Line<'a>> = Vec::new();
        let mut selected_line = None;

        for (i, block) in self.blocks.iter().enumerate() {
            if matches!(block.kind, BlockKind::Heading)
                && lines.last().is_some_and(|l| l.width() > 0)
            {
                lines.push(Line::default());
            }

            let style = self.theme.block_style(block.kind);
            let mut spans: Vec<Span<'a>> = Vec::new();
            if let Some((marker, marker_style)) = self.theme.block_marker(block.kind) {
                spans.push(Span::styled(marker, marker_style));
            }
            for span in &block.spans {
                let mut span_style = if span.bold {
                    style.add_modifier(Modifier::BOLD)
                } else {
                    style
                };
                if let Some(link) = span.link {
                    let is_selected = self.selected == Some(link.index);
                    if is_selected {
                        selected_line = Some(lines.len());
                    }
                    span_style = self.theme.link_style(span_style, link.red, is_selected);
                }
                spans.push(Span::styled(span.text.as_str(), span_style));
            }
            lines.push(Line::from(spans));

            let next = self.blocks.get(i + 1).map(|b| b.kind);
            let grouped = matches!(block.kind, BlockKind::ListItem | BlockKind::InfoboxRow)
                && next == Some(block.kind);
            if !grouped && !matches!(block.kind, BlockKind::Heading | BlockKind::SubHeading) {
                lines.push(Line::default());
            }
        }

        (lines, selected_line)
    }
}

/// Rows a line takes once wrapped to `width` columns.
fn wrapped_rows(line: &Line, width: u16) -> usize {
    if width == 0 {
        return 1;
    }
    line.width().div_ceil(width as usize).max(1)
}

impl StatefulWidget for ArticleWidget<'_> {
    type State = ArticleViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let title = if self.title.is_empty() {
            String::new()
        } else {
            format!(" {} ", self.title)
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false))
            .style(self.theme.base_style());

        let inner = block.inner(area);
        block.render(area, buf);

        // Leave the last column for the scrollbar
        let text_area = Rect {
            width: inner.width.saturating_sub(1),
            ..inner
        };

        let (lines, selected_line) = self.lines();
        let rows: Vec<usize> = lines.iter().map(|l| wrapped_rows(l, text_area.width)).collect();
        let total: usize = rows.iter().sum();
        let visible = text_area.height as usize;
        let max_scroll = total.saturating_sub(visible);

        if state.follow_selection {
            if let Some(line) = selected_line {
                let top: usize = rows[..line].iter().sum();
                if top < state.scroll || top >= state.scroll + visible {
                    state.scroll = top.saturating_sub(visible / 3);
                }
            }
        }
        state.scroll = state.scroll.min(max_scroll);

        Paragraph::new(lines)
            .style(self.theme.base_style())
            .wrap(Wrap { trim: false })
            .scroll((state.scroll.min(u16::MAX as usize) as u16, 0))
            .render(text_area, buf);

        if total > visible {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };
            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(state.scroll);
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(self.theme.border_style(true))
                .track_style(self.theme.dim_style())
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinipedia_core::render::text::{LinkSpan, TextSpan};

    fn paragraph(text: &str) -> TextBlock {
        TextBlock {
            kind: BlockKind::Paragraph,
            spans: vec![TextSpan {
                text: text.to_string(),
                bold: false,
                link: None,
            }],
        }
    }

    fn link_paragraph(label: &str, index: usize) -> TextBlock {
        TextBlock {
            kind: BlockKind::Paragraph,
            spans: vec![TextSpan {
                text: label.to_string(),
                bold: false,
                link: Some(LinkSpan { index, red: false }),
            }],
        }
    }

    fn draw(blocks: &[TextBlock], selected: Option<usize>, state: &mut ArticleViewState) -> Buffer {
        let theme = Theme::light();
        let area = Rect::new(0, 0, 30, 8);
        let mut buf = Buffer::empty(area);
        ArticleWidget::new(blocks, &theme)
            .selected(selected)
            .title("Keon")
            .render(area, &mut buf, state);
        buf
    }

    #[test]
    fn test_list_items_are_grouped() {
        let theme = Theme::light();
        let item = |text: &str| TextBlock {
            kind: BlockKind::ListItem,
            spans: vec![TextSpan {
                text: text.to_string(),
                bold: false,
                link: None,
            }],
        };
        let blocks = [item("a"), item("b"), paragraph("after")];
        let (lines, _) = ArticleWidget::new(&blocks, &theme).lines();
        // a, b, blank, after, blank
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2].width(), 0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let blocks = [paragraph("short")];
        let mut state = ArticleViewState {
            scroll: 500,
            follow_selection: false,
        };
        draw(&blocks, None, &mut state);
        assert_eq!(state.scroll, 0);
    }

    #[test]
    fn test_selected_link_scrolls_into_view() {
        let mut blocks: Vec<TextBlock> = (0..20).map(|i| paragraph(&format!("line {i}"))).collect();
        blocks.push(link_paragraph("Poris", 0));

        let mut state = ArticleViewState {
            scroll: 0,
            follow_selection: true,
        };
        draw(&blocks, Some(0), &mut state);
        assert!(state.scroll > 0);

        let mut unfollowed = ArticleViewState::default();
        draw(&blocks, Some(0), &mut unfollowed);
        assert_eq!(unfollowed.scroll, 0);
    }

    #[test]
    fn test_title_in_border() {
        let buf = draw(&[paragraph("text")], None, &mut ArticleViewState::default());
        let top: String = (0..30u16).map(|x| buf[(x, 0u16)].symbol().to_string()).collect();
        assert!(top.contains("Keon"));
    }
}
