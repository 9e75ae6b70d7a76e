//! The common diagnostic shape and normalization of detector output.
//!
//! Detectors disagree on what they send back: the linguistic service mixes
//! located records with bare string labels, the spell checker reports words,
//! and the aligner reports edits. Everything is normalized into
//! [`Diagnostic`] before reconciliation.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::align::{AlignmentOp, EditKind};
use crate::span::Span;

/// Kind assigned to misspelled-word diagnostics.
pub const SPELLING_KIND: &str = "spelling";

/// Kind assigned to assistive edits taken from the corrected text.
pub const SUGGESTED_EDIT_KIND: &str = "suggested_edit";

/// Priority tier used when diagnostics compete for the same text.
///
/// Ordered lowest to highest, so `Authority::Grammar > Authority::Spelling`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
    /// Edits derived from the corrected text.
    Assistive,
    /// The spell checker.
    Spelling,
    /// Rule-based grammar and mechanics detectors.
    Grammar,
}

/// Which list a diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Sentence-level grammar (subjects, verbs, tense, run-ons).
    Grammar,
    /// Capitalization, commas, spacing, punctuation.
    Mechanics,
    /// Misspelled words.
    Spelling,
    /// Suggested edits from the corrected text.
    Assistive,
}

impl Category {
    /// The authority tier diagnostics in this category carry.
    pub const fn authority(self) -> Authority {
        match self {
            Self::Grammar | Self::Mechanics => Authority::Grammar,
            Self::Spelling => Authority::Spelling,
            Self::Assistive => Authority::Assistive,
        }
    }

    /// Returns the category as a lowercase string slice.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grammar => "grammar",
            Self::Mechanics => "mechanics",
            Self::Spelling => "spelling",
            Self::Assistive => "assistive",
        }
    }
}

/// A single reported issue.
///
/// `span` is `None` for label-only diagnostics that a detector could not
/// localize. Those are kept and counted, but never take part in span
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    /// Machine-readable kind, e.g. `missing_subject` or `unnecessary_comma`.
    pub kind: String,
    /// Location in the original text, if known.
    pub span: Option<Span>,
    /// Human-readable description.
    pub message: String,
    /// Suggested fix. Empty when the detector offered none.
    pub suggestion: String,
    /// Source list of the diagnostic.
    pub category: Category,
    /// Priority tier, derived from `category`.
    pub authority: Authority,
}

impl Diagnostic {
    /// Create a located diagnostic.
    pub fn located(
        category: Category,
        kind: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            span: Some(span),
            message: message.into(),
            suggestion: suggestion.into(),
            category,
            authority: category.authority(),
        }
    }

    /// Create a label-only diagnostic with a message derived from the label.
    pub fn label(category: Category, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            message: humanize(&kind),
            kind,
            span: None,
            suggestion: String::new(),
            category,
            authority: category.authority(),
        }
    }

    /// The span, if present and valid for `text`.
    pub fn valid_span(&self, text: &str) -> Option<Span> {
        self.span.filter(|span| span.is_valid_for(text))
    }

    /// Whether the diagnostic carries a span that is not valid for `text`.
    pub fn has_malformed_span(&self, text: &str) -> bool {
        self.span.is_some_and(|span| !span.is_valid_for(text))
    }

    /// Build the assistive diagnostic for an alignment edit.
    ///
    /// Returns `None` for `Equal` ops.
    pub fn from_edit(op: &AlignmentOp) -> Option<Self> {
        let message = match op.kind {
            EditKind::Equal => return None,
            EditKind::Replace => format!(
                "Consider replacing '{}' with '{}'",
                op.original_text, op.corrected_text
            ),
            EditKind::Insert => format!("Consider adding '{}'", op.corrected_text),
            EditKind::Delete => format!("Consider removing '{}'", op.original_text),
        };
        Some(Self::located(
            Category::Assistive,
            SUGGESTED_EDIT_KIND,
            op.original_span,
            message,
            op.corrected_text.clone(),
        ))
    }
}

/// Span as reported on the wire. `text` is informational only.
///
/// Offsets that do not fit in `usize`, negative ones included, decode as
/// `usize::MAX`. The resulting span lies past the end of any text, so the
/// diagnostic is kept and flagged as malformed instead of failing the whole
/// report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RawSpan {
    /// Start offset.
    #[serde(deserialize_with = "lenient_offset")]
    #[schemars(with = "i64")]
    pub start: usize,
    /// End offset.
    #[serde(deserialize_with = "lenient_offset")]
    #[schemars(with = "i64")]
    pub end: usize,
    /// The text the detector believes the span covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RawSpan {
    /// The span these offsets describe.
    pub const fn to_span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

fn lenient_offset<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let offset = i64::deserialize(deserializer)?;
    Ok(usize::try_from(offset).unwrap_or(usize::MAX))
}

/// A located diagnostic record as sent by a detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RawRecord {
    /// Diagnostic kind.
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    /// Location, if the detector could localize the issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<RawSpan>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Suggested fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A diagnostic as sent by the linguistic analysis service: either a full
/// record or a bare label such as `"capitalization"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawDiagnostic {
    /// Label-only legacy form.
    Label(String),
    /// Structured form.
    Record(RawRecord),
}

impl RawDiagnostic {
    /// Convert into the common shape under `category`.
    ///
    /// Spans are carried over as-is; validation against the text happens at
    /// reconciliation time.
    pub fn normalize(&self, category: Category) -> Diagnostic {
        match self {
            Self::Label(label) => Diagnostic::label(category, label.clone()),
            Self::Record(record) => Diagnostic {
                kind: record.kind.clone(),
                span: record.span.as_ref().map(RawSpan::to_span),
                message: record
                    .message
                    .clone()
                    .unwrap_or_else(|| humanize(&record.kind)),
                suggestion: record.suggestion.clone().unwrap_or_default(),
                category,
                authority: category.authority(),
            },
        }
    }
}

/// Normalize a batch of raw diagnostics, preserving order.
pub fn normalize_all(raw: &[RawDiagnostic], category: Category) -> Vec<Diagnostic> {
    raw.iter().map(|d| d.normalize(category)).collect()
}

/// `"missing_comma_after_intro"` -> `"Missing comma after intro"`.
fn humanize(kind: &str) -> String {
    let spaced = kind.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_order() {
        assert!(Authority::Grammar > Authority::Spelling);
        assert!(Authority::Spelling > Authority::Assistive);
        assert_eq!(Category::Mechanics.authority(), Authority::Grammar);
    }

    #[test]
    fn raw_diagnostics_accept_labels_and_records() {
        let json = r#"[
            "capitalization",
            {"type": "unnecessary_comma", "span": {"start": 10, "end": 11, "text": ","},
             "message": "Unnecessary comma between subject and verb",
             "suggestion": "Remove this comma"},
            {"kind": "run_on_sentence"}
        ]"#;
        let raw: Vec<RawDiagnostic> = serde_json::from_str(json).unwrap();
        let diags = normalize_all(&raw, Category::Mechanics);

        assert_eq!(diags[0].kind, "capitalization");
        assert_eq!(diags[0].span, None);
        assert_eq!(diags[0].message, "Capitalization");

        assert_eq!(diags[1].span, Some(Span::new(10, 11)));
        assert_eq!(diags[1].suggestion, "Remove this comma");
        assert_eq!(diags[1].authority, Authority::Grammar);

        assert_eq!(diags[2].kind, "run_on_sentence");
        assert_eq!(diags[2].message, "Run on sentence");
        assert!(diags[2].suggestion.is_empty());
    }

    #[test]
    fn malformed_span_is_detected_not_dropped() {
        let raw = RawDiagnostic::Record(RawRecord {
            kind: "missing_verb".to_string(),
            span: Some(RawSpan {
                start: 8,
                end: 3,
                text: None,
            }),
            message: None,
            suggestion: None,
        });
        let diag = raw.normalize(Category::Grammar);
        assert!(diag.has_malformed_span("some text here"));
        assert_eq!(diag.valid_span("some text here"), None);
    }

    #[test]
    fn negative_offsets_decode_as_malformed_spans() {
        let json = r#"[
            {"type": "subject_verb_agreement", "span": {"start": 0, "end": 5}},
            {"type": "tense", "span": {"start": -1, "end": 3}},
            {"type": "missing_verb", "span": {"start": 2, "end": -7}}
        ]"#;
        let raw: Vec<RawDiagnostic> = serde_json::from_str(json).unwrap();
        let diags = normalize_all(&raw, Category::Grammar);
        let text = "He go home.";

        assert_eq!(diags.len(), 3);
        assert_eq!(diags[0].valid_span(text), Some(Span::new(0, 5)));
        assert_eq!(diags[1].kind, "tense");
        assert!(diags[1].has_malformed_span(text));
        assert!(diags[2].has_malformed_span(text));
    }

    #[test]
    fn edits_become_assistive_diagnostics() {
        let op = AlignmentOp {
            kind: EditKind::Replace,
            original_text: "go".to_string(),
            corrected_text: "went".to_string(),
            original_span: Span::new(4, 6),
        };
        let diag = Diagnostic::from_edit(&op).unwrap();
        assert_eq!(diag.kind, SUGGESTED_EDIT_KIND);
        assert_eq!(diag.authority, Authority::Assistive);
        assert_eq!(diag.message, "Consider replacing 'go' with 'went'");
        assert_eq!(diag.suggestion, "went");

        let equal = AlignmentOp {
            kind: EditKind::Equal,
            ..op
        };
        assert!(Diagnostic::from_edit(&equal).is_none());
    }
}
