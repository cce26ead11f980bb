//! User settings persisted as a flat JSON object of strings.

use crate::prompt::ArticleStyle;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::warn;

/// Settings file used when neither a flag nor `INFINIPEDIA_SETTINGS` names one.
pub const DEFAULT_SETTINGS_FILE: &str = "infinipedia-settings.json";

/// Bounds for the requested number of body sections.
pub const MIN_SECTIONS: u32 = 1;
pub const MAX_SECTIONS: u32 = 10;

const DARK_MODE: &str = "darkMode";
const ARTICLE_STYLE: &str = "articleStyle";
const NUMBER_OF_SECTIONS: &str = "numberOfSections";

/// Errors from the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings file is not a JSON object")]
    InvalidFormat,
}

/// User preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub dark_mode: bool,
    pub article_style: ArticleStyle,
    pub number_of_sections: u32,
}

impl Settings {
    pub fn new(default_sections: u32) -> Self {
        Self {
            dark_mode: false,
            article_style: ArticleStyle::Normal,
            number_of_sections: default_sections.clamp(MIN_SECTIONS, MAX_SECTIONS),
        }
    }

    pub fn with_sections(mut self, sections: u32) -> Self {
        self.number_of_sections = sections.clamp(MIN_SECTIONS, MAX_SECTIONS);
        self
    }

    pub fn with_style(mut self, style: ArticleStyle) -> Self {
        self.article_style = style;
        self
    }

    /// Apply stored values over `self`, skipping ones that do not parse.
    fn merge(mut self, map: &Map<String, Value>) -> Self {
        if let Some(value) = string_value(map, DARK_MODE) {
            match value.parse::<bool>() {
                Ok(dark) => self.dark_mode = dark,
                Err(_) => warn!(key = DARK_MODE, value, "Ignoring invalid setting"),
            }
        }
        if let Some(value) = string_value(map, ARTICLE_STYLE) {
            match value.parse::<ArticleStyle>() {
                Ok(style) => self.article_style = style,
                Err(_) => warn!(key = ARTICLE_STYLE, value, "Ignoring invalid setting"),
            }
        }
        if let Some(value) = string_value(map, NUMBER_OF_SECTIONS) {
            match value.trim().parse::<u32>() {
                Ok(n) => self = self.with_sections(n),
                Err(_) => warn!(key = NUMBER_OF_SECTIONS, value, "Ignoring invalid setting"),
            }
        }
        self
    }

    fn to_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(DARK_MODE.to_string(), Value::String(self.dark_mode.to_string()));
        map.insert(
            ARTICLE_STYLE.to_string(),
            Value::String(self.article_style.as_str().to_string()),
        );
        map.insert(
            NUMBER_OF_SECTIONS.to_string(),
            Value::String(self.number_of_sections.to_string()),
        );
        map
    }
}

fn string_value<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Reads and writes [`Settings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `INFINIPEDIA_SETTINGS` if set, otherwise the default file name.
    pub fn from_env() -> Self {
        let path = std::env::var("INFINIPEDIA_SETTINGS")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings over `defaults`. A missing file yields `defaults`.
    pub async fn load(&self, defaults: Settings) -> Result<Settings, SettingsError> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(defaults),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&json)? {
            Value::Object(map) => Ok(defaults.merge(&map)),
            _ => Err(SettingsError::InvalidFormat),
        }
    }

    /// Write settings, keeping any unrelated keys already in the file.
    pub async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut map = match fs::read_to_string(&self.path).await {
            Ok(json) => match serde_json::from_str::<Value>(&json) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            Err(_) => Map::new(),
        };
        map.extend(settings.to_map());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("none.json"));
        let settings = store.load(Settings::new(4)).await.unwrap();
        assert_eq!(settings, Settings::new(4));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested/settings.json"));
        let settings = Settings {
            dark_mode: true,
            article_style: ArticleStyle::Alien,
            number_of_sections: 7,
        };

        store.save(&settings).await.unwrap();
        assert_eq!(store.load(Settings::new(4)).await.unwrap(), settings);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"darkMode\": \"true\""));
        assert!(raw.contains("\"articleStyle\": \"alien\""));
        assert!(raw.contains("\"numberOfSections\": \"7\""));
    }

    #[tokio::test]
    async fn test_invalid_values_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"darkMode": "maybe", "articleStyle": "modern", "numberOfSections": "99", "other": "x"}"#,
        )
        .unwrap();

        let store = SettingsStore::new(&path);
        let settings = store.load(Settings::new(4)).await.unwrap();
        assert!(!settings.dark_mode);
        assert_eq!(settings.article_style, ArticleStyle::Modern);
        assert_eq!(settings.number_of_sections, MAX_SECTIONS);

        store.save(&settings).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"other\": \"x\""));
    }

    #[tokio::test]
    async fn test_non_object_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let result = SettingsStore::new(&path).load(Settings::new(4)).await;
        assert!(matches!(result, Err(SettingsError::InvalidFormat)));
    }
}
