//! Color themes for the encyclopedia TUI

use ratatui::style::{Color, Modifier, Style};

use infinipedia_core::render::text::BlockKind;

/// Page colors, light or dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub dark: bool,

    // Base colors
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub dim: Color,

    // Article colors
    pub title: Color,
    pub heading: Color,
    pub link: Color,
    pub red_link: Color,
    pub selection: Color,
    pub ambox: Color,
    pub infobox: Color,
    pub notice: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            dark: false,
            background: Color::Reset,
            foreground: Color::Reset,
            border: Color::Gray,
            border_focused: Color::Blue,
            dim: Color::DarkGray,
            title: Color::Black,
            heading: Color::Black,
            link: Color::Blue,
            red_link: Color::Red,
            selection: Color::LightYellow,
            ambox: Color::Rgb(0xf2, 0x85, 0x00),
            infobox: Color::DarkGray,
            notice: Color::Rgb(0x36, 0x66, 0xcc),
            error: Color::Red,
        }
    }

    pub fn dark() -> Self {
        Self {
            dark: true,
            background: Color::Rgb(0x20, 0x21, 0x22),
            foreground: Color::Rgb(0xea, 0xec, 0xf0),
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            dim: Color::Gray,
            title: Color::White,
            heading: Color::White,
            link: Color::Rgb(0x88, 0xa3, 0xe8),
            red_link: Color::Rgb(0xff, 0x6b, 0x6b),
            selection: Color::Rgb(0x44, 0x47, 0x5a),
            ambox: Color::Rgb(0xfc, 0x3f, 0x1d),
            infobox: Color::Gray,
            notice: Color::Rgb(0x88, 0xa3, 0xe8),
            error: Color::Rgb(0xff, 0x6b, 0x6b),
        }
    }

    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Base style for the whole screen
    pub fn base_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim).add_modifier(Modifier::DIM)
    }

    /// Style for text in a block of `kind`
    pub fn block_style(&self, kind: BlockKind) -> Style {
        let base = self.base_style();
        match kind {
            BlockKind::Title => base
                .fg(self.title)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            BlockKind::Heading => base.fg(self.heading).add_modifier(Modifier::BOLD),
            BlockKind::SubHeading => base.fg(self.heading).add_modifier(Modifier::BOLD),
            BlockKind::Paragraph | BlockKind::ListItem => base,
            BlockKind::Ambox => base.add_modifier(Modifier::ITALIC),
            BlockKind::InfoboxRow => base.fg(self.infobox),
            BlockKind::Image => self.dim_style().add_modifier(Modifier::ITALIC),
            BlockKind::Error => base.fg(self.error).add_modifier(Modifier::BOLD),
            BlockKind::Notice => base.fg(self.notice).add_modifier(Modifier::ITALIC),
        }
    }

    /// Style for a link, layered over its block style
    pub fn link_style(&self, base: Style, red: bool, selected: bool) -> Style {
        let style = base
            .fg(if red { self.red_link } else { self.link })
            .add_modifier(Modifier::UNDERLINED);
        if selected {
            style.bg(self.selection).add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    /// Marker drawn in the left margin of a block, with its style
    pub fn block_marker(&self, kind: BlockKind) -> Option<(&'static str, Style)> {
        match kind {
            BlockKind::Ambox => Some(("▌ ", Style::default().fg(self.ambox))),
            BlockKind::InfoboxRow => Some(("│ ", Style::default().fg(self.border))),
            BlockKind::ListItem => Some(("  • ", self.base_style())),
            BlockKind::Notice => Some(("ℹ ", Style::default().fg(self.notice))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_mode() {
        assert!(Theme::for_mode(true).dark);
        assert_eq!(Theme::for_mode(false), Theme::light());
    }

    #[test]
    fn test_red_links_use_red() {
        let theme = Theme::light();
        let style = theme.link_style(Style::default(), true, false);
        assert_eq!(style.fg, Some(theme.red_link));
        assert!(style.bg.is_none());

        let selected = theme.link_style(Style::default(), false, true);
        assert_eq!(selected.fg, Some(theme.link));
        assert_eq!(selected.bg, Some(theme.selection));
    }
}
