//! Article data model.
//!
//! Articles arrive from the completion service as JSON and are validated
//! into these types. Once built they are never mutated; history and the
//! renderer share them behind `Arc`.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Heading of the closing list of related links.
pub const SEE_ALSO: &str = "See Also";

/// Heading of the closing list of invented citations.
pub const REFERENCES: &str = "References";

/// A generated encyclopedia article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub ambox: Option<Ambox>,
    #[serde(default)]
    pub infobox: Option<Infobox>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Article {
    /// Move "See Also" and "References" to the end, in that order,
    /// appending empty lists for whichever is missing.
    pub fn with_closing_sections(mut self) -> Self {
        let see_also = take_section(&mut self.sections, SEE_ALSO)
            .unwrap_or_else(|| Section::new(SEE_ALSO, "<ul></ul>"));
        let references = take_section(&mut self.sections, REFERENCES)
            .unwrap_or_else(|| Section::new(REFERENCES, "<ul></ul>"));
        self.sections.push(see_also);
        self.sections.push(references);
        self
    }

    /// Whether the last two sections are "See Also" then "References".
    pub fn has_closing_sections(&self) -> bool {
        let n = self.sections.len();
        n >= 2
            && self.sections[n - 2].is_heading(SEE_ALSO)
            && self.sections[n - 1].is_heading(REFERENCES)
    }

    /// Title and summary, as carried into a child generation.
    pub fn summary_context(&self) -> GenerationContext {
        GenerationContext::from_parent(&self.title, &self.summary)
    }

    /// Case-insensitive, trimmed comparison against the title.
    pub fn is_titled(&self, label: &str) -> bool {
        self.title.trim().to_lowercase() == label.trim().to_lowercase()
    }
}

fn take_section(sections: &mut Vec<Section>, heading: &str) -> Option<Section> {
    let idx = sections.iter().rposition(|s| s.is_heading(heading))?;
    Some(sections.remove(idx))
}

/// A maintenance notice banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ambox {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub message: String,
}

impl Ambox {
    /// The display class for this notice; unknown types fall back to `Style`.
    pub fn kind(&self) -> AmboxKind {
        self.kind
            .as_deref()
            .and_then(|k| k.parse().ok())
            .unwrap_or_default()
    }
}

/// Recognised ambox styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmboxKind {
    #[default]
    Style,
    Dispute,
    Quality,
    Content,
}

impl AmboxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AmboxKind::Style => "style",
            AmboxKind::Dispute => "dispute",
            AmboxKind::Quality => "quality",
            AmboxKind::Content => "content",
        }
    }
}

impl FromStr for AmboxKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "style" => Ok(AmboxKind::Style),
            "dispute" => Ok(AmboxKind::Dispute),
            "quality" => Ok(AmboxKind::Quality),
            "content" => Ok(AmboxKind::Content),
            _ => Err(()),
        }
    }
}

/// The structured side panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infobox {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(default)]
    pub data: KeyValues,
    #[serde(default)]
    pub classification: Option<KeyValues>,
}

/// An article body section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_prompt: Option<String>,
}

impl Section {
    pub fn new(heading: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            content: content.into(),
            image_prompt: None,
        }
    }

    fn is_heading(&self, heading: &str) -> bool {
        self.heading.trim().eq_ignore_ascii_case(heading)
    }
}

/// Ordered string key/value pairs.
///
/// Deserializes from a JSON object, keeping key order. Numbers and booleans
/// are stringified and `null` values dropped.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct KeyValues(Vec<(String, String)>);

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for KeyValues {
    fn from(map: Map<String, Value>) -> Self {
        let pairs = map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::Null => None,
                Value::String(s) => Some((k, s)),
                other => Some((k, other.to_string())),
            })
            .collect();
        Self(pairs)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut kv = KeyValues::new();
        for (k, v) in iter {
            kv.insert(k, v);
        }
        kv
    }
}

impl Serialize for KeyValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// One level of the fixed biological classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaxonRank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl TaxonRank {
    /// Ranks from most to least general.
    pub const ALL: [TaxonRank; 7] = [
        TaxonRank::Kingdom,
        TaxonRank::Phylum,
        TaxonRank::Class,
        TaxonRank::Order,
        TaxonRank::Family,
        TaxonRank::Genus,
        TaxonRank::Species,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaxonRank::Kingdom => "Kingdom",
            TaxonRank::Phylum => "Phylum",
            TaxonRank::Class => "Class",
            TaxonRank::Order => "Order",
            TaxonRank::Family => "Family",
            TaxonRank::Genus => "Genus",
            TaxonRank::Species => "Species",
        }
    }

    /// Position in [`TaxonRank::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Ranks strictly more general than this one.
    pub fn ranks_above(self) -> &'static [TaxonRank] {
        &Self::ALL[..self.index()]
    }
}

impl fmt::Display for TaxonRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaxonRank {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Parent-article information carried into a generation triggered by a link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationContext {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub taxon_rank: Option<TaxonRank>,
}

impl GenerationContext {
    pub fn from_parent(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            summary: Some(summary.into()),
            taxon_rank: None,
        }
    }

    /// A context that carries only a taxon rank.
    pub fn taxon(rank: TaxonRank) -> Self {
        Self {
            taxon_rank: Some(rank),
            ..Default::default()
        }
    }

    pub fn with_taxon_rank(mut self, rank: TaxonRank) -> Self {
        self.taxon_rank = Some(rank);
        self
    }

    pub fn is_taxon_rank(&self) -> bool {
        self.taxon_rank.is_some()
    }

    /// Whether this context identifies a parent article.
    pub fn has_parent(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// A reply to an article request: either an article or an explicit refusal.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationReply {
    Article(Article),
    Refused(String),
}

impl GenerationReply {
    /// Parse the model's JSON reply. A non-null `error` wins over any
    /// article fields that may also be present.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;

        if let Some(error) = value.get("error") {
            match error {
                Value::Null => {}
                Value::String(message) => return Ok(GenerationReply::Refused(message.clone())),
                other => return Ok(GenerationReply::Refused(other.to_string())),
            }
        }

        let article: Article = serde_json::from_value(value)?;
        Ok(GenerationReply::Article(article.with_closing_sections()))
    }
}
