//! Product constants and tunables for article generation.

use crate::article::TaxonRank;
use rand::Rng;

/// Category returned when classification fails or comes back empty.
pub const DEFAULT_CATEGORY: &str = "General Topic";

/// Category forced for links clicked inside a classification table.
pub const TAXON_CATEGORY: &str = "Fictional Taxon";

/// Category that triggers the fixed nation infobox keys and headings.
pub const NATION_CATEGORY: &str = "Fictional Nation";

/// Configuration for the encyclopedia session.
#[derive(Debug, Clone)]
pub struct EncyclopediaConfig {
    /// Model override for the completion service.
    pub model: Option<String>,

    /// Maximum tokens for article generation.
    pub max_tokens: usize,

    /// Temperature for article generation.
    pub temperature: Option<f32>,

    /// Tone requested in every user prompt.
    pub tone: String,

    /// Link density hint passed to the model.
    pub link_density: String,

    /// Maximum number of sections that may carry an image prompt.
    pub max_section_images: usize,

    /// Body sections requested when the settings store has no value.
    pub default_sections: u32,

    /// Number of topics shown on the welcome screen.
    pub random_topic_count: usize,

    /// Chance that an article is asked to carry an ambox.
    pub ambox_chance: f64,

    /// Chance that a default-style article is generated in chaos mode.
    pub chaos_chance: f64,

    /// Chance that a followed link keeps its parent article as context.
    pub link_cohesion_chance: f64,

    /// Chance that any single rendered link is a red link.
    pub red_link_chance: f64,

    /// Infobox keys every nation article must carry.
    pub nation_infobox_keys: Vec<String>,

    /// Section headings every nation article must carry.
    pub nation_section_headings: Vec<String>,
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 8192,
            temperature: Some(0.9),
            tone: "Encyclopedic, neutral and authoritative, like a well-maintained wiki".to_string(),
            link_density: "High".to_string(),
            max_section_images: 2,
            default_sections: 4,
            random_topic_count: 6,
            ambox_chance: 0.25,
            chaos_chance: 0.05,
            link_cohesion_chance: 0.9,
            red_link_chance: 0.1,
            nation_infobox_keys: [
                "Capital",
                "Largest city",
                "Official languages",
                "Government",
                "Head of state",
                "Population",
                "Currency",
                "Founded",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            nation_section_headings: [
                "History",
                "Geography",
                "Politics",
                "Economy",
                "Culture",
                "List of Leaders",
                "Major Conflicts",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl EncyclopediaConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `INFINIPEDIA_MODEL` from the environment, if set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("INFINIPEDIA_MODEL") {
            if !model.trim().is_empty() {
                config.model = Some(model);
            }
        }
        config
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the tone requested from the model.
    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    /// Set the ambox probability.
    pub fn with_ambox_chance(mut self, chance: f64) -> Self {
        self.ambox_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the chaos-mode probability.
    pub fn with_chaos_chance(mut self, chance: f64) -> Self {
        self.chaos_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the probability that a followed link keeps its parent context.
    pub fn with_link_cohesion_chance(mut self, chance: f64) -> Self {
        self.link_cohesion_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the red-link probability.
    pub fn with_red_link_chance(mut self, chance: f64) -> Self {
        self.red_link_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Turn off every random draw (no ambox, no chaos, contexts kept, no red links).
    pub fn deterministic(self) -> Self {
        self.with_ambox_chance(0.0)
            .with_chaos_chance(0.0)
            .with_link_cohesion_chance(1.0)
            .with_red_link_chance(0.0)
    }

    /// The fixed taxonomic rank ordering.
    pub fn taxon_ranks(&self) -> &'static [TaxonRank] {
        &TaxonRank::ALL
    }
}

/// One Bernoulli draw. Out-of-range chances are clamped; NaN never hits.
pub(crate) fn draw<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    if chance.is_nan() {
        return false;
    }
    rng.gen_bool(chance.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_draw_tolerates_bad_chances() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(draw(&mut rng, 4.0));
        assert!(!draw(&mut rng, -2.0));
        assert!(!draw(&mut rng, f64::NAN));
    }

    #[test]
    fn test_default_probabilities_in_range() {
        let config = EncyclopediaConfig::default();
        for chance in [
            config.ambox_chance,
            config.chaos_chance,
            config.link_cohesion_chance,
            config.red_link_chance,
        ] {
            assert!((0.0..=1.0).contains(&chance));
        }
    }

    #[test]
    fn test_builder_clamps() {
        let config = EncyclopediaConfig::new()
            .with_ambox_chance(3.0)
            .with_red_link_chance(-1.0)
            .with_model("claude-test");

        assert_eq!(config.ambox_chance, 1.0);
        assert_eq!(config.red_link_chance, 0.0);
        assert_eq!(config.model.as_deref(), Some("claude-test"));
    }

    #[test]
    fn test_deterministic() {
        let config = EncyclopediaConfig::new().deterministic();
        assert_eq!(config.ambox_chance, 0.0);
        assert_eq!(config.chaos_chance, 0.0);
        assert_eq!(config.link_cohesion_chance, 1.0);
        assert_eq!(config.red_link_chance, 0.0);
    }
}
