//! HTML serialization of rendered pages.

use super::{Element, InternalLink, Node, RenderedPage};
use crate::images::{ImageState, ImageStates};
use std::fmt::Write;

const STYLESHEET: &str = include_str!("style.css");

/// Escape text for use in element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize the page body with the given image states.
pub fn to_html(page: &RenderedPage, images: &ImageStates) -> String {
    let mut out = String::new();
    for node in &page.nodes {
        write_node(&mut out, node, images);
    }
    out
}

/// A standalone HTML document for the page.
pub fn to_document(page: &RenderedPage, images: &ImageStates, dark_mode: bool) -> String {
    let title = if page.title.is_empty() {
        "Infinipedia".to_string()
    } else {
        format!("{} - Infinipedia", escape(&page.title))
    };
    let body_class = if dark_mode { " class=\"dark-mode\"" } else { "" };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{STYLESHEET}</style>\n</head>\n<body{body_class}>\n<main class=\"article-container\">\n{}\n</main>\n</body>\n</html>\n",
        to_html(page, images)
    )
}

fn write_node(out: &mut String, node: &Node, images: &ImageStates) {
    match node {
        Node::Element(element) => write_element(out, element, images),
        Node::Text(text) => out.push_str(&escape(text)),
        Node::Markup(markup) => out.push_str(markup),
        Node::Link(link) => write_link(out, link),
        Node::Image(id) => match images.get(*id) {
            ImageState::Ready(url) => {
                let _ = write!(
                    out,
                    "<img src=\"{}\" style=\"width:100%;height:auto\">",
                    escape(url)
                );
            }
            state => {
                let _ = write!(out, "<p>{}</p>", state.placeholder().unwrap_or_default());
            }
        },
    }
}

fn write_element(out: &mut String, element: &Element, images: &ImageStates) {
    out.push('<');
    out.push_str(element.tag);
    if let Some(class) = &element.class {
        let _ = write!(out, " class=\"{}\"", escape(class));
    }
    for (key, value) in &element.attrs {
        let _ = write!(out, " {}=\"{}\"", key, escape(value));
    }
    out.push('>');
    for child in &element.children {
        write_node(out, child, images);
    }
    let _ = write!(out, "</{}>", element.tag);
}

fn write_link(out: &mut String, link: &InternalLink) {
    let label = escape(&link.label);
    if link.red {
        let _ = write!(
            out,
            "<a href=\"#\" class=\"internal-link red-link\" data-non-functional=\"true\">{label}</a>"
        );
    } else {
        let _ = write!(
            out,
            "<a href=\"#\" class=\"internal-link\" data-topic=\"{label}\">{label}</a>"
        );
    }
}
