use std::fmt;
use std::ops::Deref;

use unicode_normalization::UnicodeNormalization;

/// Characters removed outright during normalization.
const STRIPPED_PUNCTUATION: [char; 10] = [',', '.', '\'', '"', '~', '-', '_', '?', '!', '*'];

/// Canonical comparison form of a chat message, trigger word or spam pattern.
///
/// Always lowercase ASCII with no punctuation from [`STRIPPED_PUNCTUATION`],
/// no two identical characters in a row and single spaces between words.
/// The only way to obtain one is [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whitespace-delimited words of the normalized text
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|token| !token.is_empty())
    }

}

impl Deref for NormalizedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize text for spam and trigger comparisons.
///
/// Lowercases, folds accented letters to ASCII through NFKD (anything without
/// an ASCII decomposition disappears), strips the fixed punctuation set,
/// collapses repeated characters ("coooool" -> "col") and squeezes
/// whitespace. Total and idempotent.
pub fn normalize(text: &str) -> NormalizedText {
    let folded: String = text
        .to_lowercase()
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    let compressed = compress_repeated_chars(&folded);

    NormalizedText(compressed.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Collapse every run of identical characters to a single character.
///
/// Runs separated only by stripped punctuation count as one run, because the
/// punctuation is removed before this is called.
fn compress_repeated_chars(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_char = None;

    for ch in text.chars() {
        if prev_char != Some(ch) {
            result.push(ch);
        }
        prev_char = Some(ch);
    }

    result
}
