//! Projection of an [`Article`] into a display tree.
//!
//! The tree mirrors the encyclopedia page layout: title, ambox, infobox,
//! summary and sections. Front ends either walk the [`Node`]s directly
//! (the terminal UI) or serialize them with [`html::to_document`].

pub mod html;
pub mod links;
pub mod text;

use crate::article::{Article, KeyValues, TaxonRank};
use crate::service::AspectRatio;
use rand::Rng;

/// A link to another (possibly not yet generated) article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalLink {
    pub label: String,
    /// Red links are shown but do nothing when followed.
    pub red: bool,
    /// Set for links inside a classification row.
    pub taxon_rank: Option<TaxonRank>,
}

/// Where an image slot sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePlacement {
    Infobox,
    Left,
    Right,
}

impl ImagePlacement {
    fn class(self) -> &'static str {
        match self {
            ImagePlacement::Infobox => "infobox-image-container",
            ImagePlacement::Left => "section-image section-image-left",
            ImagePlacement::Right => "section-image section-image-right",
        }
    }
}

/// An image waiting to be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    pub id: usize,
    pub prompt: String,
    pub aspect: AspectRatio,
    pub placement: ImagePlacement,
}

/// An element with a tag, optional class, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub class: Option<String>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            class: None,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class
            .as_deref()
            .is_some_and(|c| c.split_whitespace().any(|part| part == class))
    }

    /// Value of an attribute, if set.
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A node of the display tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Plain text, escaped on output.
    Text(String),
    /// Trusted markup from the article body, emitted as-is.
    Markup(String),
    Link(InternalLink),
    /// Reference into [`RenderedPage::images`].
    Image(usize),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    fn visit_links<'a>(&'a self, out: &mut Vec<&'a InternalLink>) {
        match self {
            Node::Link(link) => out.push(link),
            Node::Element(element) => {
                for child in &element.children {
                    child.visit_links(out);
                }
            }
            Node::Text(_) | Node::Markup(_) | Node::Image(_) => {}
        }
    }
}

/// A rendered page: the display tree plus the images it references.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedPage {
    pub title: String,
    pub nodes: Vec<Node>,
    pub images: Vec<ImageSlot>,
}

impl RenderedPage {
    /// Every link on the page in document order.
    pub fn links(&self) -> Vec<&InternalLink> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.visit_links(&mut out);
        }
        out
    }

    /// Append the "did you mean" notice after the article.
    pub fn push_cohesion_notice(&mut self, topic: &str) {
        self.nodes.push(render_cohesion_notice(topic));
    }
}

/// Renders articles with a fixed red-link probability.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    red_link_chance: f64,
}

impl Renderer {
    pub fn new(red_link_chance: f64) -> Self {
        Self {
            red_link_chance: red_link_chance.clamp(0.0, 1.0),
        }
    }

    /// Build the display tree for `article`.
    pub fn render<R: Rng + ?Sized>(&self, article: &Article, rng: &mut R) -> RenderedPage {
        let mut page = PageBuilder {
            renderer: *self,
            rng,
            images: Vec::new(),
        };

        let mut nodes: Vec<Node> = vec![Element::new("h1").child(Node::text(&article.title)).into()];

        if let Some(ambox) = &article.ambox {
            nodes.push(
                Element::new("div")
                    .class(format!("ambox ambox-{}", ambox.kind().as_str()))
                    .children(page.links(&ambox.message, None))
                    .into(),
            );
        }

        if let Some(infobox) = &article.infobox {
            let mut element = Element::new("div").class("infobox").child(
                Element::new("h3").child(Node::text(
                    infobox.title.as_deref().unwrap_or(&article.title),
                )),
            );

            if let Some(prompt) = non_empty(infobox.image_prompt.as_deref()) {
                let id = page.image(prompt, AspectRatio::Square, ImagePlacement::Infobox);
                element = element.child(
                    Element::new("div")
                        .class(ImagePlacement::Infobox.class())
                        .child(Node::Image(id)),
                );
            }

            if let Some(classification) = &infobox.classification {
                element = element.child(page.classification(classification));
            }

            let mut table = Element::new("table");
            for (key, value) in infobox.data.iter() {
                table = table.child(
                    Element::new("tr")
                        .child(Element::new("th").child(Node::text(key)))
                        .child(Element::new("td").children(page.links(value, None))),
                );
            }
            nodes.push(element.child(table).into());
        }

        let summary = article.summary.replace("<p>", "").replace("</p>", "");
        nodes.push(
            Element::new("p")
                .class("summary")
                .child(Element::new("strong").child(Node::text(&article.title)))
                .child(Node::text(" "))
                .children(page.links(&summary, None))
                .into(),
        );

        for (index, section) in article.sections.iter().enumerate() {
            let mut element = Element::new("div")
                .class("article-section")
                .child(Element::new("h2").child(Node::text(&section.heading)));

            if let Some(prompt) = non_empty(section.image_prompt.as_deref()) {
                let placement = if index % 2 == 0 {
                    ImagePlacement::Left
                } else {
                    ImagePlacement::Right
                };
                let id = page.image(prompt, AspectRatio::Landscape, placement);
                element = element.child(
                    Element::new("figure")
                        .class(placement.class())
                        .child(Node::Image(id)),
                );
            }

            element = element.child(
                Element::new("div")
                    .class("section-content")
                    .children(page.links(&section.content, None)),
            );
            nodes.push(element.into());
        }

        RenderedPage {
            title: article.title.clone(),
            nodes,
            images: page.images,
        }
    }
}

struct PageBuilder<'r, R: Rng + ?Sized> {
    renderer: Renderer,
    rng: &'r mut R,
    images: Vec<ImageSlot>,
}

impl<R: Rng + ?Sized> PageBuilder<'_, R> {
    fn links(&mut self, text: &str, taxon_rank: Option<TaxonRank>) -> Vec<Node> {
        links::resolve(text, taxon_rank, self.renderer.red_link_chance, &mut *self.rng)
    }

    fn image(&mut self, prompt: &str, aspect: AspectRatio, placement: ImagePlacement) -> usize {
        let id = self.images.len();
        self.images.push(ImageSlot {
            id,
            prompt: prompt.to_string(),
            aspect,
            placement,
        });
        id
    }

    /// Known ranks in canonical order, then unknown keys in source order.
    fn classification(&mut self, classification: &KeyValues) -> Element {
        let mut rows: Vec<(Option<TaxonRank>, &str, &str)> = classification
            .iter()
            .map(|(key, value)| (key.parse::<TaxonRank>().ok(), key, value))
            .collect();
        rows.sort_by_key(|(rank, _, _)| rank.map_or(TaxonRank::ALL.len(), TaxonRank::index));

        let mut table = Element::new("table");
        for (rank, key, value) in rows {
            table = table.child(
                Element::new("tr")
                    .attr("data-taxon-rank", key)
                    .child(Element::new("th").child(Node::text(key)))
                    .child(Element::new("td").children(self.links(value, rank))),
            );
        }

        Element::new("div")
            .class("classification-box")
            .child(Element::new("h4").child(Node::text("Scientific classification")))
            .child(table)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A page holding only an error message.
pub fn render_error(message: &str) -> RenderedPage {
    RenderedPage {
        title: String::new(),
        nodes: vec![Element::new("div")
            .class("error-message")
            .child(Node::text(message))
            .into()],
        images: Vec::new(),
    }
}

/// The "did you mean" notice shown after an off-topic article.
pub fn render_cohesion_notice(topic: &str) -> Node {
    Element::new("div")
        .class("cohesion-check")
        .child(
            Element::new("p")
                .child(Node::text(
                    "Oops! This article might not be what you were looking for. Did you mean: ",
                ))
                .child(Node::Link(InternalLink {
                    label: topic.to_string(),
                    red: false,
                    taxon_rank: None,
                }))
                .child(Node::text("?")),
        )
        .into()
}
