//! Word and punctuation tokenization with exact source offsets.

use std::sync::LazyLock;

use regex::Regex;

use crate::span::Span;

/// A maximal run of word characters, or a single character that is neither
/// a word character nor whitespace.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+|[^\w\s]").expect("valid regex"));

/// A token borrowed from the text it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The token text, equal to `&source[start..end]`.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Token<'_> {
    /// The token's position as a [`Span`].
    pub const fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Split text into word and punctuation tokens, in source order.
///
/// Whitespace is never part of a token. Empty input yields no tokens.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    TOKEN_PATTERN
        .find_iter(text)
        .map(|m| Token {
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}
