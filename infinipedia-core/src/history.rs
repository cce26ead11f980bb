//! Linear back/forward history of generated articles.

use crate::article::Article;
use std::sync::Arc;

/// Whether the back and forward controls should be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryState {
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Browser-style history: a list of articles and a single cursor.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<Arc<Article>>,
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything after the cursor, append, and move to the new entry.
    pub fn push(&mut self, article: Arc<Article>) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(article);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back one entry, if there is one.
    pub fn back(&mut self) -> Option<Arc<Article>> {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                self.entries.get(c - 1).cloned()
            }
            _ => None,
        }
    }

    /// Step forward one entry, if there is one.
    pub fn forward(&mut self) -> Option<Arc<Article>> {
        match self.cursor {
            Some(c) if c + 1 < self.entries.len() => {
                self.cursor = Some(c + 1);
                self.entries.get(c + 1).cloned()
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn state(&self) -> HistoryState {
        match self.cursor {
            Some(c) => HistoryState {
                can_go_back: c > 0,
                can_go_forward: c + 1 < self.entries.len(),
            },
            None => HistoryState::default(),
        }
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&Arc<Article>> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Cursor position, `None` when empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn article(title: &str) -> Arc<Article> {
        Arc::new(Article {
            title: title.to_string(),
            summary: String::new(),
            ambox: None,
            infobox: None,
            sections: Vec::new(),
        })
    }

    fn title(entry: Option<Arc<Article>>) -> Option<String> {
        entry.map(|a| a.title.clone())
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new();
        assert_eq!(history.state(), HistoryState::default());
        assert!(history.back().is_none());
        assert!(history.forward().is_none());
        assert!(history.current().is_none());
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn test_back_and_forward() {
        let mut history = History::new();
        history.push(article("A"));
        history.push(article("B"));
        history.push(article("C"));

        assert!(history.state().can_go_back);
        assert!(!history.state().can_go_forward);

        assert_eq!(title(history.back()), Some("B".to_string()));
        assert_eq!(title(history.back()), Some("A".to_string()));
        assert!(history.back().is_none());
        assert_eq!(history.cursor(), Some(0));
        assert!(!history.state().can_go_back);
        assert!(history.state().can_go_forward);

        assert_eq!(title(history.forward()), Some("B".to_string()));
        assert_eq!(title(history.forward()), Some("C".to_string()));
        assert!(history.forward().is_none());
    }

    #[test]
    fn test_push_after_back_truncates_forward_entries() {
        let mut history = History::new();
        history.push(article("A"));
        history.push(article("B"));
        history.push(article("C"));
        history.back();
        history.back();

        history.push(article("D"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.current().unwrap().title, "D");
        assert!(!history.state().can_go_forward);
        assert_eq!(title(history.back()), Some("A".to_string()));
        assert_eq!(title(history.forward()), Some("D".to_string()));
        assert!(history.forward().is_none());
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.push(article("A"));
        history.push(article("B"));
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.state(), HistoryState::default());

        history.push(article("C"));
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn test_state_matches_cursor_under_random_operations() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut history = History::new();

        for step in 0..500 {
            match rng.gen_range(0..4) {
                0 | 1 => history.push(article(&format!("{step}"))),
                2 => {
                    history.back();
                }
                _ => {
                    history.forward();
                }
            }

            let state = history.state();
            match history.cursor() {
                Some(c) => {
                    assert_eq!(state.can_go_back, c > 0);
                    assert_eq!(state.can_go_forward, c < history.len() - 1);
                }
                None => assert_eq!(state, HistoryState::default()),
            }
        }
    }
}
