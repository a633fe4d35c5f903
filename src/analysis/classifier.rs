use std::sync::LazyLock;

use crate::analysis::strip_markup;
use crate::config::Lexicon;
use crate::domain::Category;

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(Classifier::default);

/// Classify with the built-in lexicon. Total and deterministic.
pub fn classify(text: &str) -> Category {
    DEFAULT_CLASSIFIER.classify(text)
}

/// First-match-wins keyword classifier.
///
/// Keywords are lowercased once at construction; input is stripped of markup and
/// lowercased per call, so matching is case-insensitive substring search.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<(Category, Vec<String>)>,
    heartbeat_marker: String,
}

impl Classifier {
    pub fn new(lexicon: &Lexicon) -> Self {
        let rules = lexicon
            .rules
            .iter()
            .map(|rule| {
                let words = rule
                    .keywords
                    .iter()
                    .filter(|k| !k.is_empty())
                    .map(|k| k.to_lowercase())
                    .collect();
                (rule.category, words)
            })
            .collect();

        Self {
            rules,
            heartbeat_marker: lexicon.heartbeat_marker.to_lowercase(),
        }
    }

    pub fn classify(&self, text: &str) -> Category {
        self.classify_stripped(&strip_markup(text))
    }

    /// Same as [`Classifier::classify`] for text that is already markup-free.
    pub fn classify_stripped(&self, stripped: &str) -> Category {
        let haystack = stripped.to_lowercase();
        self.rules
            .iter()
            .find(|(_, words)| words.iter().any(|w| haystack.contains(w.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }

    /// True when markup-free text is (or contains) the "no anomaly" marker.
    pub fn is_heartbeat(&self, stripped: &str) -> bool {
        !self.heartbeat_marker.is_empty()
            && stripped.to_lowercase().contains(self.heartbeat_marker.as_str())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&Lexicon::default())
    }
}
