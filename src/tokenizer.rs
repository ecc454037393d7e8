//! Splitting segment text into words.
//!
//! Tokens are maximal runs of non-delimiter characters. Two adjacent
//! delimiters never yield an empty token. The scanner keeps its cursor in
//! the [`Tokens`] value itself, so every worker tokenizes independently.

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// Longest word the table stores, in characters
pub const MAX_WORD_CHARS: usize = 99;

/// Minimum token length, in characters, for a token to be counted
pub const DEFAULT_MIN_WORD_LEN: usize = 6;

/// Punctuation and symbol delimiters. Whitespace is matched separately.
const PUNCTUATION: &[char] = &[
    '"', '\'', '.', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '?', ':', ';', '-', ',',
    '\u{2014}', '*', '(', '$', '%', ')', '!',
];

/// Whether `c` separates tokens
pub fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || PUNCTUATION.contains(&c)
}

/// Iterator over the tokens of a string
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let start = self.rest.find(|c: char| !is_delimiter(c))?;
        let rest = &self.rest[start..];
        let end = rest.find(is_delimiter).unwrap_or(rest.len());
        let (token, remaining) = rest.split_at(end);
        self.rest = remaining;
        Some(token)
    }
}

/// Tokenize `text`
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens::new(text)
}

/// A word bounded to [`MAX_WORD_CHARS`] characters.
///
/// Longer tokens are truncated to their first `MAX_WORD_CHARS` characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Word(String);

/// The first [`MAX_WORD_CHARS`] characters of `token`
pub fn truncate_word(token: &str) -> &str {
    match token.char_indices().nth(MAX_WORD_CHARS) {
        Some((cut, _)) => &token[..cut],
        None => token,
    }
}

impl Word {
    pub fn new(token: &str) -> Self {
        Self(truncate_word(token).to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Borrow<str> for Word {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a token is long enough to be counted
pub fn qualifies(token: &str, min_len: usize) -> bool {
    // Byte length bounds the char count from above.
    token.len() >= min_len && token.chars().count() >= min_len
}
