//! Offline spell checking against a word list.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use camino::Utf8Path;
use regex::Regex;

use crate::diagnostic::RawSpan;
use crate::error::{ConfigError, ConfigResult, ServiceResult};
use crate::services::{Misspelling, SpellChecker, SpellingReport};

/// Alphabetic words only; digits and apostrophes split words.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]+\b").expect("valid regex"));

/// Largest edit distance at which a known word is offered as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// A [`SpellChecker`] backed by an in-memory set of known words.
///
/// Lookups are case-insensitive. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct WordListSpeller {
    index: Arc<WordIndex>,
}

/// Known words, plus the same words bucketed by character count so a
/// suggestion only scores words whose length is within reach.
#[derive(Debug)]
struct WordIndex {
    words: HashSet<String>,
    by_len: BTreeMap<usize, Vec<String>>,
}

impl WordIndex {
    fn new(words: HashSet<String>) -> Self {
        let mut by_len: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for word in &words {
            by_len
                .entry(word.chars().count())
                .or_default()
                .push(word.clone());
        }
        Self { words, by_len }
    }

    /// Words whose length differs from `len` by at most `max_distance`.
    fn near_length(&self, len: usize, max_distance: usize) -> impl Iterator<Item = &String> {
        self.by_len
            .range(len.saturating_sub(max_distance)..=len + max_distance)
            .flat_map(|(_, words)| words)
    }
}

impl WordListSpeller {
    /// Build from an iterator of known words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            index: Arc::new(WordIndex::new(words)),
        }
    }

    /// Load a newline-separated word list. Lines starting with `#` are
    /// comments.
    pub fn from_file(path: &Utf8Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::WordList {
            path: path.to_path_buf(),
            source,
        })?;
        let speller = Self::from_words(
            content
                .lines()
                .filter(|line| !line.trim_start().starts_with('#')),
        );
        tracing::debug!(%path, words = speller.len(), "loaded word list");
        Ok(speller)
    }

    /// Number of known words.
    pub fn len(&self) -> usize {
        self.index.words.len()
    }

    /// Whether the word list is empty.
    pub fn is_empty(&self) -> bool {
        self.index.words.is_empty()
    }

    /// Whether `word` is known, ignoring case.
    pub fn knows(&self, word: &str) -> bool {
        self.index.words.contains(&word.to_lowercase())
    }

    /// Check `text` synchronously.
    pub fn check_text(&self, text: &str) -> SpellingReport {
        let misspelled_words: Vec<Misspelling> = WORD
            .find_iter(text)
            .filter(|m| !self.knows(m.as_str()))
            .map(|m| {
                let word = m.as_str().to_lowercase();
                Misspelling {
                    suggestion: self.suggest(&word),
                    word,
                    span: RawSpan {
                        start: m.start(),
                        end: m.end(),
                        text: Some(m.as_str().to_string()),
                    },
                }
            })
            .collect();

        let distinct = misspelled_words
            .iter()
            .map(|m| m.word.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        SpellingReport {
            misspelled_words,
            count: Some(distinct),
        }
    }

    /// Closest known word within [`MAX_SUGGESTION_DISTANCE`], alphabetical on
    /// ties. Falls back to `word` itself.
    ///
    /// Edit distance is at least the difference in length, so only the
    /// length buckets within that distance are scored.
    fn suggest(&self, word: &str) -> String {
        self.index
            .near_length(word.chars().count(), MAX_SUGGESTION_DISTANCE)
            .map(|known| (strsim::levenshtein(word, known), known))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min()
            .map_or_else(|| word.to_string(), |(_, known)| known.clone())
    }
}

#[async_trait]
impl SpellChecker for WordListSpeller {
    fn name(&self) -> &str {
        "wordlist"
    }

    async fn check(&self, text: &str) -> ServiceResult<SpellingReport> {
        Ok(self.check_text(text))
    }
}
