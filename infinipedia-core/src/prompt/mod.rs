//! Prompt construction for classification, article generation, cohesion
//! checks and topic suggestions.
//!
//! Article system prompts are assembled from fixed slots chosen by
//! [`ArticleStyle`] and [`CategoryKind`]:
//!
//! ```text
//! preamble(style) + rules(style) + naming(style) + category(kind, style) + schema(style)
//! ```
//!
//! The schema slot is always last and always ends with [`JSON_ONLY_INSTRUCTION`].

use crate::article::{Article, GenerationContext, TaxonRank};
use crate::config::{EncyclopediaConfig, NATION_CATEGORY, TAXON_CATEGORY};
use std::fmt;
use std::str::FromStr;

/// Final line of every article system prompt.
pub const JSON_ONLY_INSTRUCTION: &str =
    "Respond with exactly one JSON object matching the schema above and nothing else.";

/// Substrings that mark a category as a creature/animal category.
const CREATURE_MARKERS: [&str; 5] = ["creature", "animal", "species", "fauna", "beast"];

/// Writing style selected in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleStyle {
    #[default]
    Normal,
    Modern,
    Alien,
}

impl ArticleStyle {
    pub const ALL: [ArticleStyle; 3] = [ArticleStyle::Normal, ArticleStyle::Modern, ArticleStyle::Alien];

    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStyle::Normal => "normal",
            ArticleStyle::Modern => "modern",
            ArticleStyle::Alien => "alien",
        }
    }

    /// The next style, wrapping around.
    pub fn next(self) -> Self {
        match self {
            ArticleStyle::Normal => ArticleStyle::Modern,
            ArticleStyle::Modern => ArticleStyle::Alien,
            ArticleStyle::Alien => ArticleStyle::Normal,
        }
    }

    /// Modern style forbids fictional scientific classifications.
    fn allows_classification(self) -> bool {
        !matches!(self, ArticleStyle::Modern)
    }
}

impl fmt::Display for ArticleStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(ArticleStyle::Normal),
            "modern" => Ok(ArticleStyle::Modern),
            "alien" => Ok(ArticleStyle::Alien),
            other => Err(format!("unknown article style: {other}")),
        }
    }
}

/// Structural requirements chosen by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Default,
    Nation,
    Creature,
    /// A taxonomic rank article; carries the rank when the link came from a
    /// classification row.
    TaxonRank(Option<TaxonRank>),
}

impl CategoryKind {
    /// Map a free-form category onto its structural variant.
    pub fn from_category(category: &str, context: Option<&GenerationContext>) -> Self {
        let normalized = category.trim().to_lowercase();

        if normalized == TAXON_CATEGORY.to_lowercase() {
            return CategoryKind::TaxonRank(context.and_then(|c| c.taxon_rank));
        }
        if normalized == NATION_CATEGORY.to_lowercase() {
            return CategoryKind::Nation;
        }
        if CREATURE_MARKERS.iter().any(|m| normalized.contains(m)) {
            return CategoryKind::Creature;
        }
        CategoryKind::Default
    }
}

/// Everything that shapes one article prompt.
#[derive(Debug, Clone)]
pub struct ArticleRequest<'a> {
    pub query: &'a str,
    pub category: &'a str,
    pub context: Option<&'a GenerationContext>,
    pub tone: &'a str,
    pub sections: u32,
    pub want_ambox: bool,
    pub want_chaos: bool,
    pub style: ArticleStyle,
}

/// A system/user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

/// Builds prompts from the encyclopedia configuration.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder<'a> {
    config: &'a EncyclopediaConfig,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(config: &'a EncyclopediaConfig) -> Self {
        Self { config }
    }

    /// Build the system and user prompts for an article.
    pub fn article(&self, request: &ArticleRequest<'_>) -> Prompts {
        let kind = CategoryKind::from_category(request.category, request.context);
        let style = request.style;

        let mut system = String::new();
        match style {
            ArticleStyle::Modern => {
                system.push_str(include_str!("templates/modern_rules.txt").trim_end());
            }
            ArticleStyle::Normal | ArticleStyle::Alien => {
                let (preamble, genre) = if style == ArticleStyle::Alien {
                    (
                        include_str!("templates/preamble_alien.txt"),
                        include_str!("templates/genre_alien.txt"),
                    )
                } else {
                    (
                        include_str!("templates/preamble_normal.txt"),
                        include_str!("templates/genre_normal.txt"),
                    )
                };
                for slot in [
                    preamble,
                    genre,
                    include_str!("templates/links.txt"),
                    include_str!("templates/ambox.txt"),
                    include_str!("templates/closing_sections.txt"),
                    include_str!("templates/naming_conventions.txt"),
                ] {
                    if !system.is_empty() {
                        system.push_str("\n\n");
                    }
                    system.push_str(slot.trim_end());
                }
            }
        }

        system.push_str("\n\n");
        system.push_str(&self.category_block(kind, style));

        system.push_str("\n\n");
        system.push_str(&self.schema(style));

        Prompts {
            system,
            user: self.article_user_prompt(request),
        }
    }

    fn category_block(&self, kind: CategoryKind, style: ArticleStyle) -> String {
        let mut block = String::from("CATEGORY REQUIREMENTS:\n");

        match kind {
            CategoryKind::Nation => {
                block.push_str(&format!(
                    "- The category is '{NATION_CATEGORY}'.\n  - The `infobox.data` object MUST include the following keys: {}.\n  - The `sections` array MUST include sections with these exact headings: {}. You can add other relevant sections as well.\n  - For sections like 'List of Leaders' or 'Major Conflicts', you can use markdown lists.\n",
                    json_list(self.config.nation_infobox_keys.iter().map(String::as_str)),
                    json_list(self.config.nation_section_headings.iter().map(String::as_str)),
                ));
            }
            CategoryKind::Creature if style.allows_classification() => {
                block.push_str("- The category is a creature/animal.\n  - The `infobox.classification` field MUST be filled out with a fictional scientific classification (Kingdom through Species). It must not be null.\n");
            }
            CategoryKind::TaxonRank(rank) if style.allows_classification() => {
                block.push_str(&format!(
                    "- The category is '{TAXON_CATEGORY}'.\n  - The topic you are writing about is a taxonomic rank (like a Family or Order).\n  - The `infobox.classification` field MUST be filled out. "
                ));
                match rank {
                    Some(rank) => block.push_str(&format!(
                        "The topic is the rank '{rank}'. The classification box should ONLY include these ranks: {}.\n",
                        json_list(rank.ranks_above().iter().map(|r| r.name())),
                    )),
                    None => block.push_str("It should ONLY include ranks *above* the rank being defined. For example, if writing about a Family, only include Kingdom, Phylum, Class, and Order.\n"),
                }
            }
            _ => {}
        }

        if !matches!(kind, CategoryKind::Creature | CategoryKind::TaxonRank(_))
            || !style.allows_classification()
        {
            block.push_str("- The `infobox.classification` field must be null.\n");
        }

        block.push_str("- Be creative with the `infobox.data` object. Invent at least 4-6 detailed and interesting key-value pairs that flesh out the topic beyond the minimum requirements. For a creature, this could be 'Diet', 'Habitat', 'Average Lifespan'. For a location, 'Climate', 'Population', 'Key Landmarks'.\n---");
        block
    }

    fn schema(&self, style: ArticleStyle) -> String {
        let max_images = self.config.max_section_images;
        let (summary, ambox, image, data, classification, content) = match style {
            ArticleStyle::Modern => (
                "string (a one-paragraph summary of the topic)",
                "{ \"type\": \"string (e.g., 'dispute', 'quality')\", \"message\": \"string (A serious, wiki-style maintenance message.)\" } | null",
                "string (a detailed Dall-E prompt for a realistic, encyclopedic image)",
                "string (key-value pairs of plausible data)",
                "null".to_string(),
                "string",
            ),
            ArticleStyle::Normal | ArticleStyle::Alien => (
                "string (a one-paragraph summary of the topic, with internal links like [[concept]])",
                "{ \"type\": \"string (can be 'style', 'dispute', 'quality', or 'content')\", \"message\": \"string (A quirky, wiki-style maintenance message.)\" } | null",
                "string (a detailed Dall-E prompt for an encyclopedic image for this topic, e.g., a flag for a nation, a portrait for a creature)",
                "string (key-value pairs of fictional data for the infobox, with internal links like [[concept]])",
                format!(
                    "{{ {} }} | null",
                    TaxonRank::ALL
                        .iter()
                        .map(|r| format!("\"{r}\": \"string\""))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                "string (detailed content for this section, with internal links like [[concept]]. Can include markdown, but use HTML for lists using <ul> and <li>.)",
            ),
        };

        format!(
            r#"Use this exact schema:
{{
  "title": "string (the official title for the article)",
  "summary": "{summary}",
  "ambox": {ambox},
  "infobox": {{
    "title": "string (same as the main title)",
    "image_prompt": "{image}",
    "data": {{ "[key: string]": "{data}" }},
    "classification": {classification}
  }},
  "sections": [ {{ "heading": "string", "content": "{content}", "image_prompt": "string | null (A Dall-E prompt for an image for this section. Use for up to {max_images} sections where an image is most illustrative. Otherwise, null.)" }} ],
  "error": "string | null (Use this ONLY if you cannot generate the article based on the constraints, e.g. a fictional topic in Modern Age mode)"
}}

{JSON_ONLY_INSTRUCTION}"#
        )
    }

    fn article_user_prompt(&self, request: &ArticleRequest<'_>) -> String {
        let mut user = format!(
            "Please write an article based on the following details.\n- Topic: \"{}\"\n- Category: \"{}\"\n- Style: \"{}\"\n- Tone: \"{}\"\n- Link Density: \"{}\"\n- Number of body sections to create: {}",
            request.query,
            request.category,
            request.style,
            request.tone,
            self.config.link_density,
            request.sections,
        );

        if request.want_chaos {
            user.push('\n');
            user.push_str(include_str!("templates/chaos.txt").trim_end());
        }

        if request.want_ambox {
            user.push_str(&format!(
                "\n- Add an article message box (ambox): Yes. There is a {}% chance this was requested, and it was. Please add one.",
                (self.config.ambox_chance * 100.0).round()
            ));
        }

        if let Some(ctx) = request.context.filter(|c| c.has_parent()) {
            user.push_str(&format!(
                "\n- CONTEXT: This topic comes from the article \"{}\". The summary of that article is: \"{}\". Ensure the new article is consistent with this context.",
                ctx.title.as_deref().unwrap_or_default(),
                ctx.summary.as_deref().unwrap_or_default(),
            ));
        }

        user
    }

    /// Prompts asking for a single category for the query.
    pub fn classification(&self, query: &str, context: Option<&GenerationContext>) -> Prompts {
        let mut system = include_str!("templates/classify.txt").trim_end().to_string();
        if let Some(title) = context.and_then(|c| c.title.as_deref()) {
            system.push_str(&format!(
                "\n\nCONTEXT: The topic \"{query}\" is from an article about \"{title}\". Use this to inform the categorization."
            ));
        }
        Prompts {
            system,
            user: query.to_string(),
        }
    }

    /// Prompts asking whether `child` is relevant to the article it was linked from.
    pub fn cohesion(&self, parent: &GenerationContext, child: &Article) -> Prompts {
        Prompts {
            system: include_str!("templates/cohesion.txt").trim_end().to_string(),
            user: format!(
                "Parent Article Title: \"{}\"\nParent Article Summary: \"{}\"\n---\nChild Article Title: \"{}\"\nChild Article Summary: \"{}\"",
                parent.title.as_deref().unwrap_or_default(),
                parent.summary.as_deref().unwrap_or_default(),
                child.title,
                child.summary,
            ),
        }
    }

    /// Prompts asking for `count` topic suggestions.
    pub fn random_topics(&self, count: usize) -> Prompts {
        Prompts {
            system: format!(
                "You are an idea generator for a fictional encyclopedia. Generate a list of {count} interesting, absurd, or cool-sounding fictional concepts, creatures, places, or events. Respond with a single JSON object with one key, \"topics\", which is an array of strings. Example: {{\"topics\": [\"Floating Coral Reefs\", \"The Silent Librarian's War\", \"Sentient Origami\"]}}"
            ),
            user: format!("Generate {count} topics."),
        }
    }
}

/// Render names as a JSON array literal, e.g. `["Kingdom","Phylum"]`.
fn json_list<'s>(items: impl Iterator<Item = &'s str>) -> String {
    let items: Vec<&str> = items.collect();
    serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string())
}
