//! Half-open byte intervals into the evaluated text.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)` of byte offsets into the original text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Span {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl Span {
    /// Create a span. Does not validate; see [`Span::is_valid_for`].
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width span anchored at `at`.
    pub const fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Number of bytes covered. Zero for malformed (`start > end`) spans.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether the two half-open intervals share at least one position.
    ///
    /// Zero-width spans overlap nothing.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `0 <= start <= end <= text.len()` and both ends fall on
    /// character boundaries, so `&text[start..end]` cannot panic.
    pub fn is_valid_for(&self, text: &str) -> bool {
        self.start <= self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end)
    }

    /// The covered slice of `text`, or `None` if the span is not valid for it.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.is_valid_for(text) {
            text.get(self.start..self.end)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
