//! Internal link resolution.
//!
//! Text fields carry links either as `[[label]]` or, in hand-written
//! content, as `<a ... class='internal-link'>label</a>`. Both become
//! [`Node::Link`]; everything between them stays trusted markup.

use super::{InternalLink, Node};
use crate::article::TaxonRank;
use crate::config::draw;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[\[(.*?)\]\]|<a\s[^>]*class=['"]internal-link['"][^>]*>(.*?)</a>"#)
        .expect("link pattern is valid")
});

/// Split `text` into markup and link nodes.
///
/// Each link occurrence independently becomes a red link with
/// probability `red_chance`.
pub fn resolve<R: Rng + ?Sized>(
    text: &str,
    taxon_rank: Option<TaxonRank>,
    red_chance: f64,
    rng: &mut R,
) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut last = 0;

    for caps in LINK_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let label = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();

        if whole.start() > last {
            nodes.push(Node::Markup(text[last..whole.start()].to_string()));
        }
        nodes.push(Node::Link(InternalLink {
            label: label.to_string(),
            red: draw(rng, red_chance),
            taxon_rank,
        }));
        last = whole.end();
    }

    if last < text.len() {
        nodes.push(Node::Markup(text[last..].to_string()));
    }
    nodes
}

/// Labels of every `[[...]]` and internal anchor in `text`, in order.
pub fn labels(text: &str) -> Vec<String> {
    LINK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn link(node: &Node) -> &InternalLink {
        match node {
            Node::Link(link) => link,
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_bracket_links() {
        let mut rng = StdRng::seed_from_u64(1);
        let nodes = resolve("The [[Gorak people]] mine [[Sky-iron]].", None, 0.0, &mut rng);

        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[0], Node::Markup("The ".to_string()));
        assert_eq!(link(&nodes[1]).label, "Gorak people");
        assert!(!link(&nodes[1]).red);
        assert_eq!(link(&nodes[3]).label, "Sky-iron");
        assert_eq!(nodes[4], Node::Markup(".".to_string()));
    }

    #[test]
    fn test_resolve_anchor_links() {
        let mut rng = StdRng::seed_from_u64(1);
        let nodes = resolve(
            "<ul><li><a href='#' class='internal-link'>Chaos</a></li></ul>",
            None,
            0.0,
            &mut rng,
        );
        assert_eq!(nodes.len(), 3);
        assert_eq!(link(&nodes[1]).label, "Chaos");
    }

    #[test]
    fn test_red_link_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let all_red = resolve("[[a]] [[b]] [[c]]", None, 1.0, &mut rng);
        assert!(all_red
            .iter()
            .filter_map(|n| match n {
                Node::Link(l) => Some(l.red),
                _ => None,
            })
            .all(|red| red));

        let none_red = resolve("[[a]] [[b]] [[c]]", None, 0.0, &mut rng);
        assert!(none_red.iter().all(|n| !matches!(n, Node::Link(l) if l.red)));
    }

    #[test]
    fn test_taxon_rank_carried() {
        let mut rng = StdRng::seed_from_u64(1);
        let nodes = resolve("[[Glimmeridae]]", Some(TaxonRank::Family), 0.0, &mut rng);
        assert_eq!(link(&nodes[0]).taxon_rank, Some(TaxonRank::Family));
    }

    #[test]
    fn test_text_without_links() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            resolve("plain", None, 1.0, &mut rng),
            vec![Node::Markup("plain".to_string())]
        );
        assert!(resolve("", None, 1.0, &mut rng).is_empty());
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            labels("[[A]] and <a href='#' class=\"internal-link\">B</a> then [[C]]"),
            vec!["A", "B", "C"]
        );
    }
}
