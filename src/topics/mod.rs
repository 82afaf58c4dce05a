//! Keyword-based topic tagging
//!
//! The vocabulary is an immutable table loaded from configuration and passed
//! explicitly to the tagger; there is no ambient global state. Matching is
//! deterministic and idempotent: re-tagging an unchanged record always
//! yields the identical label set.

use crate::config::TopicEntry;

/// Assigns topic labels by case-insensitive keyword matching
#[derive(Debug, Clone)]
pub struct TopicTagger {
    /// (label, lowercased keywords), in vocabulary order
    vocabulary: Vec<(String, Vec<String>)>,
}

impl TopicTagger {
    /// Builds a tagger from config vocabulary entries
    pub fn new(entries: &[TopicEntry]) -> Self {
        let vocabulary = entries
            .iter()
            .map(|entry| {
                let keywords = entry
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (entry.name.clone(), keywords)
            })
            .collect();

        Self { vocabulary }
    }

    /// Tags one record by its title and optional abstract
    ///
    /// A topic matches when any of its keywords occurs as a substring of the
    /// lowercased title or abstract. Labels come back in vocabulary order,
    /// each at most once.
    pub fn tag(&self, title: &str, abstract_text: Option<&str>) -> Vec<String> {
        let mut haystack = title.to_lowercase();
        if let Some(text) = abstract_text {
            haystack.push(' ');
            haystack.push_str(&text.to_lowercase());
        }

        self.vocabulary
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Number of topics in the vocabulary
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Whether the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }
}
