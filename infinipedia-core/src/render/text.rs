//! Plain-text projection of a rendered page for terminal front ends.
//!
//! The page becomes a list of [`TextBlock`]s made of styled spans. Links
//! are numbered in document order, so `LinkSpan::index` is also the index
//! into [`RenderedPage::links`].

use super::{Element, Node, RenderedPage};
use crate::images::{ImageState, ImageStates};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([a-zA-Z0-9]+)[^>]*>").expect("tag pattern is valid"));

/// Visual role of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Title,
    Heading,
    SubHeading,
    Paragraph,
    ListItem,
    Ambox,
    InfoboxRow,
    Image,
    Error,
    Notice,
}

/// A link inside a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpan {
    pub index: usize,
    pub red: bool,
}

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub bold: bool,
    pub link: Option<LinkSpan>,
}

impl TextSpan {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub spans: Vec<TextSpan>,
}

impl TextBlock {
    /// The block's text without styling.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }
}

/// Flatten `page` into text blocks.
pub fn to_blocks(page: &RenderedPage, images: &ImageStates) -> Vec<TextBlock> {
    let mut flattener = Flattener {
        images,
        blocks: Vec::new(),
        links: 0,
        bold: false,
    };
    for node in &page.nodes {
        flattener.node(node, BlockKind::Paragraph);
    }

    flattener
        .blocks
        .into_iter()
        .filter_map(tidy)
        .collect()
}

struct Flattener<'a> {
    images: &'a ImageStates,
    blocks: Vec<TextBlock>,
    links: usize,
    bold: bool,
}

impl Flattener<'_> {
    fn open(&mut self, kind: BlockKind) {
        match self.blocks.last_mut() {
            Some(last) if last.is_blank() => last.kind = kind,
            _ => self.blocks.push(TextBlock {
                kind,
                spans: Vec::new(),
            }),
        }
    }

    fn push(&mut self, span: TextSpan) {
        if self.blocks.is_empty() {
            self.open(BlockKind::Paragraph);
        }
        if let Some(block) = self.blocks.last_mut() {
            block.spans.push(span);
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push(TextSpan {
            text: decode_entities(text),
            bold: self.bold,
            link: None,
        });
    }

    fn node(&mut self, node: &Node, kind: BlockKind) {
        match node {
            Node::Element(element) => self.element(element, kind),
            Node::Text(text) => {
                if !text.is_empty() {
                    self.push(TextSpan {
                        text: text.clone(),
                        bold: self.bold,
                        link: None,
                    });
                }
            }
            Node::Markup(markup) => self.markup(markup, kind),
            Node::Link(link) => {
                let index = self.links;
                self.links += 1;
                self.push(TextSpan {
                    text: link.label.clone(),
                    bold: self.bold,
                    link: Some(LinkSpan {
                        index,
                        red: link.red,
                    }),
                });
            }
            Node::Image(id) => {
                self.open(BlockKind::Image);
                let text = match self.images.get(*id) {
                    ImageState::Ready(url) => format!("[image: {url}]"),
                    state => format!("[{}]", state.placeholder().unwrap_or_default()),
                };
                self.push(TextSpan::plain(text));
                self.open(kind);
            }
        }
    }

    fn element(&mut self, element: &Element, parent: BlockKind) {
        let block = match element.tag {
            "h1" => Some(BlockKind::Title),
            "h2" => Some(BlockKind::Heading),
            "h3" | "h4" => Some(BlockKind::SubHeading),
            "tr" => Some(BlockKind::InfoboxRow),
            "p" | "div" | "figure" | "table" => Some(if element.has_class("ambox") {
                BlockKind::Ambox
            } else if element.has_class("error-message") {
                BlockKind::Error
            } else if element.has_class("cohesion-check") {
                BlockKind::Notice
            } else if matches!(parent, BlockKind::Ambox | BlockKind::Error | BlockKind::Notice) {
                parent
            } else {
                BlockKind::Paragraph
            }),
            _ => None,
        };

        let kind = block.unwrap_or(parent);
        if block.is_some() {
            self.open(kind);
        }

        let was_bold = self.bold;
        if matches!(element.tag, "strong" | "b" | "th") {
            self.bold = true;
        }
        for child in &element.children {
            self.node(child, kind);
        }
        self.bold = was_bold;

        if element.tag == "th" {
            self.push(TextSpan::plain(": "));
        }
        if block.is_some() {
            self.open(parent);
        }
    }

    fn markup(&mut self, markup: &str, kind: BlockKind) {
        let mut last = 0;
        for caps in TAG_RE.captures_iter(markup) {
            let Some(whole) = caps.get(0) else { continue };
            self.text(&markup[last..whole.start()]);
            last = whole.end();

            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let tag = caps
                .get(2)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            match (closing, tag.as_str()) {
                (false, "li") => self.open(BlockKind::ListItem),
                (true, "ul" | "ol") | (_, "p") => self.open(kind),
                (false, "br") => self.open(kind),
                (_, "strong" | "b") => self.bold = !closing,
                _ => {}
            }
        }
        self.text(&markup[last..]);
    }
}

/// Collapse whitespace and drop empty spans; `None` for blank blocks.
fn tidy(mut block: TextBlock) -> Option<TextBlock> {
    for span in &mut block.spans {
        let collapsed = span.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let lead = span.text.starts_with(char::is_whitespace) && !collapsed.is_empty();
        let trail = span.text.ends_with(char::is_whitespace) && !collapsed.is_empty();
        span.text = match (lead, trail, collapsed.is_empty()) {
            (_, _, true) if !span.text.is_empty() => " ".to_string(),
            (true, true, _) => format!(" {collapsed} "),
            (true, false, _) => format!(" {collapsed}"),
            (false, true, _) => format!("{collapsed} "),
            _ => collapsed,
        };
    }
    if let Some(first) = block.spans.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = block.spans.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    block.spans.retain(|s| !s.text.is_empty());

    if block.is_blank() {
        None
    } else {
        Some(block)
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
