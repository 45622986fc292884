//! Splitting raw text around literal special-token occurrences.
//!
//! Special tokens are matched as whole strings before any pre-tokenization
//! or merging, leftmost-longest, so no special token is shadowed by a
//! shorter sibling that happens to be its prefix. Matched delimiters are
//! retained as their own segments and empty segments are dropped.

use aho_corasick::{AhoCorasick, BuildError, MatchKind};

/// One run of input text, tagged by how the encoder must treat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// An exact special-token occurrence; emitted as a single id, never
    /// pre-tokenized or merged.
    Special(&'a str),
    /// Ordinary text, to be pre-tokenized and merged.
    Plain(&'a str),
}

/// Splits text into [`Segment`]s around a fixed special-token set.
#[derive(Debug)]
pub struct SpecialTokenSplitter {
    matcher: Option<AhoCorasick>,
}

impl SpecialTokenSplitter {
    /// Build a splitter for the given special-token strings.
    ///
    /// Leftmost-longest matching makes the result independent of the order
    /// the tokens are supplied in; duplicates are harmless.
    pub fn new<I, S>(tokens: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
        let matcher = if patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&patterns)?,
            )
        };
        Ok(Self { matcher })
    }

    /// Split `text` into ordered segments, retaining special-token matches.
    pub fn split<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let Some(matcher) = &self.matcher else {
            if text.is_empty() {
                return Vec::new();
            }
            return vec![Segment::Plain(text)];
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for m in matcher.find_iter(text) {
            if m.start() > last {
                segments.push(Segment::Plain(&text[last..m.start()]));
            }
            segments.push(Segment::Special(&text[m.start()..m.end()]));
            last = m.end();
        }
        if last < text.len() {
            segments.push(Segment::Plain(&text[last..]));
        }
        segments
    }
}
