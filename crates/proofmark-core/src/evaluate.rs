//! The evaluation pipeline.
//!
//! [`Evaluator::evaluate`] fans out to the three services concurrently, each
//! call bounded by the same timeout, then joins their output:
//!
//! ```text
//! text ─┬─ analyzer ──┐
//!       ├─ speller ───┼─ aggregate ─┬─ reconcile ─> reconciled view
//!       └─ corrector ─┘ (align,     └─ score ─────> score
//!                        promote)
//! ```
//!
//! A service that is not configured, fails, or times out contributes
//! nothing and leaves a [`SourceNote`] on the result. Only oversized input
//! fails the evaluation as a whole.

use std::future::Future;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::align::{AlignmentOp, edits};
use crate::config::{Config, DEFAULT_MAX_INPUT_BYTES, DEFAULT_TIMEOUT_SECS};
use crate::diagnostic::{Category, Diagnostic};
use crate::error::{ConfigResult, EvalError, EvalResult, ServiceResult};
use crate::registry::{ResolutionPolicy, SpanRegistry};
use crate::score::{ErrorCounts, Score, score};
use crate::services::{LinguisticReport, Services, SpellingReport};

/// Which source a [`SourceNote`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteSource {
    /// The linguistic analysis service.
    Analyzer,
    /// The spelling service.
    Spelling,
    /// The text-correction service.
    Correction,
}

impl NoteSource {
    /// Returns the source as a snake_case string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Analyzer => "analyzer",
            Self::Spelling => "spelling",
            Self::Correction => "correction",
        }
    }
}

/// What went wrong with a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    /// No service is configured for this source.
    Disabled,
    /// The call failed.
    Unavailable,
    /// The call did not finish within the timeout.
    TimedOut,
    /// A diagnostic from this source carried a span outside the text. The
    /// diagnostic is counted but left out of the reconciled view.
    MalformedSpan,
}

impl NoteStatus {
    /// Returns the status as a snake_case string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Unavailable => "unavailable",
            Self::TimedOut => "timed_out",
            Self::MalformedSpan => "malformed_span",
        }
    }
}

/// A non-fatal problem encountered during an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceNote {
    /// Source the note is about.
    pub source: NoteSource,
    /// What happened.
    pub status: NoteStatus,
    /// Human-readable detail.
    pub message: String,
}

impl SourceNote {
    fn new(source: NoteSource, status: NoteStatus, message: impl Into<String>) -> Self {
        Self {
            source,
            status,
            message: message.into(),
        }
    }
}

/// Everything one evaluation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationResult {
    /// The evaluated text, trimmed. All spans index into this.
    pub original: String,
    /// The corrected text, if the correction service answered.
    pub corrected: Option<String>,
    /// Non-equal alignment ops between `original` and `corrected`.
    pub alignment_ops: Vec<AlignmentOp>,
    /// Alignment ops worth showing as suggestions: not punctuation-only and
    /// not touching any grammar, mechanics, or spelling span.
    pub suggestions: Vec<AlignmentOp>,
    /// Grammar diagnostics.
    pub grammar_diagnostics: Vec<Diagnostic>,
    /// Mechanics diagnostics, promoted punctuation edits included.
    pub mechanics_diagnostics: Vec<Diagnostic>,
    /// Spelling diagnostics, one per misspelled occurrence.
    pub spelling_diagnostics: Vec<Diagnostic>,
    /// Distinct misspelled words.
    pub spelling_count: usize,
    /// Non-overlapping view over every located diagnostic.
    pub reconciled_diagnostics: Vec<Diagnostic>,
    /// Score derived from the category counts.
    pub score: Score,
    /// Degraded or misbehaving sources.
    pub notes: Vec<SourceNote>,
}

impl EvaluationResult {
    /// Result for text with nothing to report.
    fn clean(original: String) -> Self {
        Self {
            corrected: Some(original.clone()),
            original,
            alignment_ops: Vec::new(),
            suggestions: Vec::new(),
            grammar_diagnostics: Vec::new(),
            mechanics_diagnostics: Vec::new(),
            spelling_diagnostics: Vec::new(),
            spelling_count: 0,
            reconciled_diagnostics: Vec::new(),
            score: Score::PERFECT,
            notes: Vec::new(),
        }
    }

    /// The counts the score was computed from.
    pub fn counts(&self) -> ErrorCounts {
        ErrorCounts {
            grammar: self.grammar_diagnostics.len(),
            mechanics: self
                .mechanics_diagnostics
                .iter()
                .filter(|d| d.span.is_some())
                .count(),
            spelling: self.spelling_count,
        }
    }

    /// Whether both sub-scores reach `min_score`.
    pub fn passes(&self, min_score: u8) -> bool {
        self.score.min_sub_score() >= min_score
    }
}

/// Runs evaluations against a fixed set of services.
///
/// Holds no per-request state, so one evaluator can serve concurrent
/// evaluations.
#[derive(Debug, Clone)]
pub struct Evaluator {
    services: Services,
    timeout: Duration,
    input_limit: Option<usize>,
    registry: SpanRegistry,
}

impl Evaluator {
    /// Create an evaluator with default timeout, input limit, and policy.
    pub fn new(services: Services) -> Self {
        Self {
            services,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            input_limit: Some(DEFAULT_MAX_INPUT_BYTES),
            registry: SpanRegistry::default(),
        }
    }

    /// Create an evaluator with services and limits taken from `config`.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        Ok(Self::new(Services::from_config(&config.services)?)
            .with_timeout(config.timeout())
            .with_input_limit(config.input_limit())
            .with_policy(config.resolution))
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the input size limit in bytes. `None` disables the check.
    #[must_use]
    pub const fn with_input_limit(mut self, limit: Option<usize>) -> Self {
        self.input_limit = limit;
        self
    }

    /// Set the reconciliation policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.registry = SpanRegistry::new(policy);
        self
    }

    /// The services in use.
    pub const fn services(&self) -> &Services {
        &self.services
    }

    /// Evaluate `text`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InputTooLarge`] if `text` exceeds the input
    /// limit. Service failures never produce an error.
    #[tracing::instrument(skip_all, fields(text_len = text.len()))]
    pub async fn evaluate(&self, text: &str) -> EvalResult<EvaluationResult> {
        if let Some(limit) = self.input_limit
            && text.len() > limit
        {
            return Err(EvalError::InputTooLarge {
                size: text.len(),
                limit,
            });
        }

        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("empty input, skipping services");
            return Ok(EvaluationResult::clean(String::new()));
        }

        let (linguistic, spelling, corrected) = tokio::join!(
            self.analyze(text),
            self.check_spelling(text),
            self.correct(text),
        );

        let mut notes = Vec::new();
        let linguistic = linguistic.unwrap_or_else(|note| {
            notes.push(note);
            LinguisticReport::default()
        });
        let spelling = spelling.unwrap_or_else(|note| {
            notes.push(note);
            SpellingReport::default()
        });
        let corrected = match corrected {
            Ok(corrected) => Some(corrected),
            Err(note) => {
                notes.push(note);
                None
            }
        };

        let result = self.assemble(text, &linguistic, &spelling, corrected, notes);
        tracing::info!(
            grammar = result.score.grammar,
            spelling = result.score.spelling,
            band = result.score.band,
            notes = result.notes.len(),
            "evaluation complete"
        );
        Ok(result)
    }

    async fn analyze(&self, text: &str) -> Result<LinguisticReport, SourceNote> {
        let Some(analyzer) = &self.services.analyzer else {
            return Err(disabled(NoteSource::Analyzer));
        };
        bounded(NoteSource::Analyzer, self.timeout, analyzer.analyze(text)).await
    }

    async fn check_spelling(&self, text: &str) -> Result<SpellingReport, SourceNote> {
        let Some(speller) = &self.services.speller else {
            return Err(disabled(NoteSource::Spelling));
        };
        bounded(NoteSource::Spelling, self.timeout, speller.check(text)).await
    }

    async fn correct(&self, text: &str) -> Result<String, SourceNote> {
        let Some(corrector) = &self.services.corrector else {
            return Err(disabled(NoteSource::Correction));
        };
        bounded(NoteSource::Correction, self.timeout, corrector.correct(text)).await
    }

    /// Join step: everything after the service calls is pure.
    fn assemble(
        &self,
        text: &str,
        linguistic: &LinguisticReport,
        spelling: &SpellingReport,
        corrected: Option<String>,
        mut notes: Vec<SourceNote>,
    ) -> EvaluationResult {
        let alignment_ops = corrected
            .as_deref()
            .map(|corrected| edits(text, corrected))
            .unwrap_or_default();

        let agg = aggregate(text, linguistic, spelling, &alignment_ops);

        for diag in agg.authoritative().filter(|d| d.has_malformed_span(text)) {
            let source = match diag.category {
                Category::Spelling => NoteSource::Spelling,
                _ => NoteSource::Analyzer,
            };
            let span = diag.span.map(|s| s.to_string()).unwrap_or_default();
            tracing::warn!(kind = %diag.kind, %span, "diagnostic span outside text");
            notes.push(SourceNote::new(
                source,
                NoteStatus::MalformedSpan,
                format!("{} span {span} is outside the text", diag.kind),
            ));
        }

        let reconciled_diagnostics = self.registry.reconcile(text, agg.all().cloned());
        let score = score(ErrorCounts {
            grammar: agg.grammar.len(),
            mechanics: agg.located_mechanics(),
            spelling: agg.spelling_count,
        });

        EvaluationResult {
            original: text.to_string(),
            corrected,
            alignment_ops,
            suggestions: agg.suggestions,
            grammar_diagnostics: agg.grammar,
            mechanics_diagnostics: agg.mechanics,
            spelling_diagnostics: agg.spelling,
            spelling_count: agg.spelling_count,
            reconciled_diagnostics,
            score,
            notes,
        }
    }
}

fn disabled(source: NoteSource) -> SourceNote {
    tracing::debug!(source = source.as_str(), "source disabled");
    SourceNote::new(
        source,
        NoteStatus::Disabled,
        format!("no {} service configured", source.as_str()),
    )
}

/// Await `call` for at most `timeout`, turning failure into a note.
async fn bounded<T, F>(source: NoteSource, timeout: Duration, call: F) -> Result<T, SourceNote>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            tracing::warn!(source = source.as_str(), error = %err, "service call failed");
            Err(SourceNote::new(
                source,
                NoteStatus::Unavailable,
                err.to_string(),
            ))
        }
        Err(_) => {
            tracing::warn!(
                source = source.as_str(),
                timeout_ms = timeout.as_millis(),
                "service call timed out"
            );
            Err(SourceNote::new(
                source,
                NoteStatus::TimedOut,
                format!("no response within {}ms", timeout.as_millis()),
            ))
        }
    }
}
