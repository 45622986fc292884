//! Regex pre-tokenization of text into word/punctuation/whitespace clusters.
//!
//! Merges are confined to individual pre-tokens, so this split is part of
//! the external contract: the same pattern the reference vocabulary was
//! trained against must be used, with genuine Unicode `\p{L}`/`\p{N}`
//! classes and the trailing-whitespace lookahead.

use fancy_regex::Regex;

/// The fixed GPT-2 pre-tokenization pattern.
///
/// Leftmost-first alternation: contractions bind to the apostrophe form, a
/// single optional leading space attaches to the following letter, number,
/// or punctuation run, and whitespace not followed by non-space stands
/// alone so the final run of spaces becomes its own token.
pub const GPT2_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// Compiled pre-tokenizer, built once per tokenizer.
#[derive(Debug)]
pub struct Pretokenizer {
    regex: Regex,
}

impl Pretokenizer {
    /// Compile the default GPT-2 pattern.
    pub fn new() -> Result<Self, fancy_regex::Error> {
        Self::with_pattern(GPT2_PATTERN)
    }

    /// Compile a custom pattern with the same leftmost-first semantics.
    pub fn with_pattern(pattern: &str) -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Lazily yield the non-overlapping pre-tokens of one text segment,
    /// left to right.
    pub fn split<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.regex
            .find_iter(text)
            .filter_map(|m| m.ok())
            .map(move |m| &text[m.start()..m.end()])
    }
}
