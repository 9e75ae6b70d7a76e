//! Interfaces to the external collaborators an evaluation depends on.
//!
//! Three services feed the pipeline, each independent of the others:
//!
//! - a [`LinguisticAnalyzer`] reporting grammar and mechanics diagnostics,
//! - a [`SpellChecker`] reporting misspelled words,
//! - a [`TextCorrector`] returning a corrected version of the text.
//!
//! HTTP adapters live in [`http`] and [`chat`]; offline implementations are
//! [`HeuristicAnalyzer`](crate::mechanics::HeuristicAnalyzer) and
//! [`WordListSpeller`](crate::spelling::WordListSpeller).

pub mod chat;
pub mod http;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::ServicesConfig;
use crate::diagnostic::{Category, Diagnostic, RawDiagnostic, RawSpan, SPELLING_KIND};
use crate::error::{ConfigResult, ServiceResult};
use crate::mechanics::HeuristicAnalyzer;
use crate::spelling::WordListSpeller;

pub use chat::ChatCorrector;
pub use http::{HttpAnalyzer, HttpSpellChecker};

/// Output of a linguistic analysis call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LinguisticReport {
    /// Grammar diagnostics, in detector order.
    pub grammar: Vec<RawDiagnostic>,
    /// Mechanics diagnostics: located records and bare labels.
    pub mechanics: Vec<RawDiagnostic>,
}

/// One misspelled word occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Misspelling {
    /// The word, lowercased.
    pub word: String,
    /// Best replacement candidate.
    #[serde(default)]
    pub suggestion: String,
    /// Where the occurrence sits in the text.
    pub span: RawSpan,
}

impl Misspelling {
    /// Convert into a spelling diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::located(
            Category::Spelling,
            SPELLING_KIND,
            self.span.to_span(),
            format!("Possible misspelling: '{}'", self.word),
            self.suggestion.clone(),
        )
    }
}

/// Output of a spelling call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SpellingReport {
    /// Every misspelled occurrence, in text order.
    pub misspelled_words: Vec<Misspelling>,
    /// Number of distinct misspelled words, when the service reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl SpellingReport {
    /// Distinct misspelled words: the reported count if present, otherwise
    /// the number of distinct lowercased words.
    pub fn distinct_count(&self) -> usize {
        self.count.unwrap_or_else(|| {
            self.misspelled_words
                .iter()
                .map(|m| m.word.to_lowercase())
                .collect::<BTreeSet<_>>()
                .len()
        })
    }
}

/// Produces grammar and mechanics diagnostics for a text.
#[async_trait]
pub trait LinguisticAnalyzer: Send + Sync {
    /// Short name used in logs and notes.
    fn name(&self) -> &str;

    /// Analyze `text`.
    async fn analyze(&self, text: &str) -> ServiceResult<LinguisticReport>;
}

/// Reports misspelled words in a text.
#[async_trait]
pub trait SpellChecker: Send + Sync {
    /// Short name used in logs and notes.
    fn name(&self) -> &str;

    /// Check `text`.
    async fn check(&self, text: &str) -> ServiceResult<SpellingReport>;
}

/// Produces a corrected version of a text.
#[async_trait]
pub trait TextCorrector: Send + Sync {
    /// Short name used in logs and notes.
    fn name(&self) -> &str;

    /// Correct `text`. Blank input is returned unchanged.
    async fn correct(&self, text: &str) -> ServiceResult<String>;
}

/// The set of collaborators an evaluator calls. `None` disables a source.
#[derive(Clone, Default)]
pub struct Services {
    /// Grammar and mechanics source.
    pub analyzer: Option<Arc<dyn LinguisticAnalyzer>>,
    /// Spelling source.
    pub speller: Option<Arc<dyn SpellChecker>>,
    /// Correction source.
    pub corrector: Option<Arc<dyn TextCorrector>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("analyzer", &self.analyzer.as_ref().map(|s| s.name()))
            .field("speller", &self.speller.as_ref().map(|s| s.name()))
            .field("corrector", &self.corrector.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl Services {
    /// Build services from configuration.
    ///
    /// The analyzer falls back to [`HeuristicAnalyzer`]; the spell checker to
    /// a [`WordListSpeller`] when a word list is configured. Correction is
    /// only enabled when configured.
    pub fn from_config(config: &ServicesConfig) -> ConfigResult<Self> {
        let client = reqwest::Client::new();

        let analyzer: Arc<dyn LinguisticAnalyzer> = match config.analyzer_url {
            Some(ref url) => Arc::new(HttpAnalyzer::new(client.clone(), url)),
            None => Arc::new(HeuristicAnalyzer),
        };

        let speller: Option<Arc<dyn SpellChecker>> =
            match (&config.spelling_url, &config.word_list) {
                (Some(url), _) => Some(Arc::new(HttpSpellChecker::new(client.clone(), url))),
                (None, Some(path)) => Some(Arc::new(WordListSpeller::from_file(path)?)),
                (None, None) => None,
            };

        let corrector: Option<Arc<dyn TextCorrector>> = config
            .correction
            .as_ref()
            .map(|c| Arc::new(ChatCorrector::from_config(client, c)) as Arc<dyn TextCorrector>);

        let services = Self {
            analyzer: Some(analyzer),
            speller,
            corrector,
        };
        tracing::debug!(?services, "services configured");
        Ok(services)
    }

    /// Replace the analyzer.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn LinguisticAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Replace the spell checker.
    #[must_use]
    pub fn with_speller(mut self, speller: Arc<dyn SpellChecker>) -> Self {
        self.speller = Some(speller);
        self
    }

    /// Replace the corrector.
    #[must_use]
    pub fn with_corrector(mut self, corrector: Arc<dyn TextCorrector>) -> Self {
        self.corrector = Some(corrector);
        self
    }
}
