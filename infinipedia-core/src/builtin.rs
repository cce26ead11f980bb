//! The self-describing article served for the query "Infinipedia".

use crate::article::{Ambox, Article, Infobox, KeyValues, Section};

/// Whether a query should be answered with [`infinipedia_article`].
pub fn is_builtin_query(query: &str) -> bool {
    query.trim().eq_ignore_ascii_case("infinipedia")
}

/// The fixed article record. Built without any service call.
pub fn infinipedia_article() -> Article {
    let data: KeyValues = [
        ("Type", "Para-universal digital encyclopedia"),
        ("Founded", "Simultaneously yesterday and in the next aeon"),
        ("Founder(s)", "[[The Architect]]"),
        ("Access Medium", "Any sufficiently advanced search bar"),
        ("Official Stance on Reality", "[[Advisory]]"),
    ]
    .into_iter()
    .collect();

    Article {
        title: "Infinipedia".to_string(),
        summary: "is a digital, para-universal encyclopedia that contains entries on subjects, events, and concepts that may or may not exist in consensus reality. It is thought to be a product of the [[noosphere]], a collective consciousness repository, and is maintained by enigmatic entities known as [[The Librarians]]. Its primary directive is to achieve total documentation, resulting in articles on topics ranging from the plausible, like [[Sky-Whale Migration Patterns]], to the patently absurd, such as [[The Great Syrup Flood of 1919]].".to_string(),
        ambox: Some(Ambox {
            kind: Some("style".to_string()),
            message: "This article is self-referential. Reading it may cause minor existential confusion or an overwhelming desire to check if you, yourself, have an entry.".to_string(),
        }),
        infobox: Some(Infobox {
            title: Some("Infinipedia".to_string()),
            image_prompt: Some("A massive, intricate library that stretches into infinity. Books are floating, opening and closing on their own, with glowing text spilling out into the air. The architecture is a mix of classical and impossible geometry. In the center, a glowing globe-puzzle logo hovers.".to_string()),
            data,
            classification: None,
        }),
        sections: vec![
            Section::new(
                "Origin",
                "The exact origin of Infinipedia is a subject of intense debate among its few sentient users. One theory posits that it spontaneously emerged from the [[noosphere]] when the conceptual weight of unrecorded ideas reached a critical threshold [1]. Another, more esoteric theory suggests it was meticulously crafted by a being known only as [[The Architect]], who sought to create a perfect record of all possibilities [2]. The truth, like many of Infinipedia's subjects, remains tantalizingly out of reach.",
            ),
            Section::new(
                "See Also",
                "<ul><li><a href='#' class='internal-link'>The Noosphere</a></li><li><a href='#' class='internal-link'>The Librarians</a></li><li><a href='#' class='internal-link'>Internal Consistency</a></li><li><a href='#' class='internal-link'>Chaos</a></li></ul>",
            ),
            Section::new(
                "References",
                "<ul><li>[1] Baudrillard, J. (2042). *Simulacra and Simulation in the Post-Reality Age*. Miskatonic University Press.</li><li>[2] Borges, J. L. (1941). *The Library of Babel*. Editorial Sur.</li></ul>",
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_query_matching() {
        assert!(is_builtin_query("Infinipedia"));
        assert!(is_builtin_query("  INFINIPEDIA \n"));
        assert!(!is_builtin_query("Infinipedia 2"));
        assert!(!is_builtin_query(""));
    }

    #[test]
    fn test_builtin_article_shape() {
        let article = infinipedia_article();
        assert_eq!(article.title, "Infinipedia");
        assert!(article.has_closing_sections());
        let infobox = article.infobox.as_ref().unwrap();
        assert_eq!(infobox.data.len(), 5);
        assert_eq!(infobox.data.get("Founder(s)"), Some("[[The Architect]]"));
        assert!(infobox.classification.is_none());
    }
}
