//! Textual vocabulary and merge-list file formats.
//!
//! Both formats store token byte sequences in the printable representation
//! of [`byte_level`](super::byte_level):
//!
//! - **Vocabulary (JSON)**: an object mapping a printable token string to
//!   its integer id, e.g. `{"Ġhello": 31373}`.
//! - **Merges (plain text)**: one rule per non-empty line, two
//!   whitespace-separated printable token strings; line order defines rank
//!   (first line = rank 0). Lines that do not split into exactly two fields
//!   are skipped and do not consume a rank.
//!
//! Loading decodes every character back to its raw byte; a character
//! outside the codec alphabet is a hard error, not a silent skip.

use std::path::Path;

use rustc_hash::FxHashMap;

use super::byte_level::char_to_byte;
use super::merges::MergeTable;
use super::vocab::{VocabError, Vocabulary};

fn decode_token(token: &str) -> Result<Vec<u8>, VocabError> {
    token
        .chars()
        .map(|ch| char_to_byte(ch).ok_or(VocabError::UnmappableChar(ch)))
        .collect()
}

/// Parse a JSON vocabulary.
///
/// Duplicate byte sequences follow the [`Vocabulary::new`] lowest-id-wins
/// policy; use [`Vocabulary::strict`] on the raw entries to reject instead.
pub fn load_vocab_json(data: &str) -> Result<Vocabulary, VocabError> {
    let raw: FxHashMap<String, u32> = serde_json::from_str(data)?;
    let mut entries = Vec::with_capacity(raw.len());
    for (token, id) in raw {
        entries.push((id, decode_token(&token)?));
    }
    Ok(Vocabulary::new(entries))
}

/// Read and parse a JSON vocabulary file.
pub fn load_vocab_json_file(path: impl AsRef<Path>) -> Result<Vocabulary, VocabError> {
    let data = std::fs::read_to_string(path)?;
    load_vocab_json(&data)
}

/// Parse a plain-text merge list.
pub fn load_merges(data: &str) -> Result<MergeTable, VocabError> {
    let mut pairs = Vec::new();
    for line in data.lines() {
        let mut fields = line.split_whitespace();
        let (Some(left), Some(right), None) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        pairs.push((decode_token(left)?, decode_token(right)?));
    }
    Ok(MergeTable::new(pairs))
}

/// Read and parse a plain-text merge file.
pub fn load_merges_file(path: impl AsRef<Path>) -> Result<MergeTable, VocabError> {
    let data = std::fs::read_to_string(path)?;
    load_merges(&data)
}
