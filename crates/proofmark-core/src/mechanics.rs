//! Built-in pattern-based grammar and mechanics checks.
//!
//! Used in place of a remote linguistic analysis service. Without a parser
//! it only catches what surface patterns can: pronoun/verb disagreement,
//! double negatives, comma spacing, and a handful of whole-text mechanics
//! labels (capitalization, whitespace, punctuation spacing, terminal
//! punctuation).

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::diagnostic::{RawDiagnostic, RawRecord, RawSpan};
use crate::error::ServiceResult;
use crate::services::{LinguisticAnalyzer, LinguisticReport};

/// Pronoun/verb disagreement patterns and their messages.
static SUBJECT_VERB_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\b(he|she|it)\s+(are|were|have|do|go)\b").expect("valid regex"),
            "Singular subject with plural verb",
        ),
        (
            Regex::new(r"(?i)\b(they|we|you)\s+(is|was|has|does|goes)\b").expect("valid regex"),
            "Plural subject with singular verb",
        ),
    ]
});

/// Double negative pattern.
static DOUBLE_NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(don't|doesn't|didn't|won't|can't|couldn't|shouldn't|wouldn't)\s+\w+\s+(no|nothing|nobody|never|nowhere|neither)\b",
    )
    .expect("valid regex")
});

/// Whitespace directly before a comma.
static SPACE_BEFORE_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s,").expect("valid regex"));

/// Two or more consecutive non-newline whitespace characters.
static EXTRA_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]{2,}").expect("valid regex"));

/// Whitespace before a punctuation mark.
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[,.!?;:]").expect("valid regex"));

/// Punctuation mark directly followed by a letter.
static PUNCT_BEFORE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,.!?;:][A-Za-z]").expect("valid regex"));

/// Offline [`LinguisticAnalyzer`] running [`check_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

#[async_trait]
impl LinguisticAnalyzer for HeuristicAnalyzer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn analyze(&self, text: &str) -> ServiceResult<LinguisticReport> {
        Ok(check_text(text))
    }
}

/// Run every pattern check over `text`.
#[tracing::instrument(skip_all, fields(text_len = text.len()))]
pub fn check_text(text: &str) -> LinguisticReport {
    if text.trim().is_empty() {
        return LinguisticReport::default();
    }

    let mut grammar = Vec::new();
    for (pattern, message) in SUBJECT_VERB_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            grammar.push(record(
                text,
                "subject_verb_agreement",
                m.start(),
                m.end(),
                message,
                "Make the verb agree with its subject",
            ));
        }
    }
    for m in DOUBLE_NEGATIVE.find_iter(text) {
        grammar.push(record(
            text,
            "double_negative",
            m.start(),
            m.end(),
            "Double negative",
            "Keep only one negative",
        ));
    }
    grammar.sort_by_key(record_start);

    let mut mechanics = comma_spacing(text);
    mechanics.extend(
        whole_text_labels(text)
            .into_iter()
            .map(|label| RawDiagnostic::Label(label.to_string())),
    );

    tracing::debug!(
        grammar = grammar.len(),
        mechanics = mechanics.len(),
        "heuristic checks complete"
    );
    LinguisticReport { grammar, mechanics }
}

/// Space-before-comma and missing-space-after-comma records.
fn comma_spacing(text: &str) -> Vec<RawDiagnostic> {
    let mut found = Vec::new();

    for m in SPACE_BEFORE_COMMA.find_iter(text) {
        found.push(record(
            text,
            "space_before_comma",
            m.start(),
            m.end(),
            "Space before comma",
            "Remove space before comma",
        ));
    }

    for (idx, _) in text.match_indices(',') {
        let Some(next) = text[idx + 1..].chars().next() else {
            continue;
        };
        if next != ' ' && next != '\n' {
            found.push(record(
                text,
                "missing_space_after_comma",
                idx,
                idx + 1 + next.len_utf8(),
                "Missing space after comma",
                "Add space after comma",
            ));
        }
    }

    found.sort_by_key(record_start);
    found
}

/// Labels for issues that are reported once per text, deduplicated in
/// order of first detection.
fn whole_text_labels(text: &str) -> Vec<&'static str> {
    let mut labels = Vec::new();
    let mut push = |label: &'static str| {
        if !labels.contains(&label) {
            labels.push(label);
        }
    };

    if text.chars().next().is_some_and(char::is_lowercase) {
        push("capitalization");
    }
    if EXTRA_WHITESPACE.is_match(text) {
        push("extra_whitespace");
    }
    if SPACE_BEFORE_PUNCT.is_match(text) || PUNCT_BEFORE_LETTER.is_match(text) {
        push("punctuation_spacing");
    }
    if !text.trim_end().ends_with(['.', '!', '?']) {
        push("missing_punctuation");
    }

    labels
}

fn record(
    text: &str,
    kind: &str,
    start: usize,
    end: usize,
    message: &str,
    suggestion: &str,
) -> RawDiagnostic {
    RawDiagnostic::Record(RawRecord {
        kind: kind.to_string(),
        span: Some(RawSpan {
            start,
            end,
            text: text.get(start..end).map(str::to_string),
        }),
        message: Some(message.to_string()),
        suggestion: Some(suggestion.to_string()),
    })
}

fn record_start(diagnostic: &RawDiagnostic) -> usize {
    match diagnostic {
        RawDiagnostic::Record(RawRecord {
            span: Some(span), ..
        }) => span.start,
        _ => usize::MAX,
    }
}
