//! Bidirectional token id ↔ byte-string vocabulary.
//!
//! A vocabulary maps dense (but not necessarily contiguous) non-negative ids
//! to owned byte strings and back. Every single byte value 0-255 is expected
//! to appear as a 1-byte entry; merges can only be applied when their atomic
//! inputs exist. A missing byte entry is not checked at construction and
//! surfaces as an encode-time error instead.
//!
//! # Duplicate entries
//!
//! Source vocabularies occasionally map two distinct ids to the same byte
//! sequence, and a JSON source can equally assign one id to two distinct
//! byte sequences. Either direction makes one of the two indexes lossy, so
//! the policy is explicit rather than left to map iteration order:
//! [`Vocabulary::new`] deterministically keeps the lowest id for a repeated
//! byte sequence and the lexicographically smallest byte sequence for a
//! repeated id, while [`Vocabulary::strict`] rejects the vocabulary with
//! [`VocabError::Ambiguous`] or [`VocabError::DuplicateId`].

use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use thiserror::Error;

/// Errors from vocabulary construction and the textual file formats.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("ids {first} and {second} map to the same byte sequence")]
    Ambiguous { first: u32, second: u32 },
    #[error("id {id} is assigned more than one byte sequence")]
    DuplicateId { id: u32 },
    #[error("invalid JSON vocabulary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token string contains {0:?}, which is outside the byte-level alphabet")]
    UnmappableChar(char),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bidirectional id ↔ byte-string table.
///
/// Built once at tokenizer construction; special tokens are appended through
/// [`register_special`](Vocabulary::register_special) before the value is
/// shared, after which the table is treated as immutable and is safe for
/// unsynchronized concurrent reads.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    id_to_bytes: FxHashMap<u32, Vec<u8>>,
    bytes_to_id: FxHashMap<Vec<u8>, u32>,
}

impl Vocabulary {
    /// Build a vocabulary from `(id, bytes)` entries.
    ///
    /// Duplicate byte strings keep the lowest id in the reverse index;
    /// duplicate ids keep the lexicographically smallest byte string.
    pub fn new(entries: impl IntoIterator<Item = (u32, Vec<u8>)>) -> Self {
        let mut vocab = Self::default();
        for (id, bytes) in entries {
            vocab.insert(id, bytes);
        }
        vocab
    }

    /// Build a vocabulary, rejecting duplicate byte strings and ids.
    pub fn strict(entries: impl IntoIterator<Item = (u32, Vec<u8>)>) -> Result<Self, VocabError> {
        let mut vocab = Self::default();
        for (id, bytes) in entries {
            if let Some(&existing) = vocab.bytes_to_id.get(&bytes) {
                return Err(VocabError::Ambiguous {
                    first: existing.min(id),
                    second: existing.max(id),
                });
            }
            if vocab.id_to_bytes.contains_key(&id) {
                return Err(VocabError::DuplicateId { id });
            }
            vocab.insert(id, bytes);
        }
        Ok(vocab)
    }

    fn insert(&mut self, id: u32, bytes: Vec<u8>) {
        match self.bytes_to_id.entry(bytes.clone()) {
            Entry::Occupied(mut slot) => {
                if id < *slot.get() {
                    slot.insert(id);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        match self.id_to_bytes.entry(id) {
            Entry::Occupied(mut slot) => {
                if bytes < *slot.get() {
                    slot.insert(bytes);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(bytes);
            }
        }
    }

    /// Look up the id for a byte string.
    #[inline]
    pub fn lookup_id(&self, bytes: &[u8]) -> Option<u32> {
        self.bytes_to_id.get(bytes).copied()
    }

    /// Look up the byte string for an id.
    #[inline]
    pub fn lookup_bytes(&self, id: u32) -> Option<&[u8]> {
        self.id_to_bytes.get(&id).map(|b| b.as_slice())
    }

    /// Whether a byte string has an id.
    #[inline]
    pub fn contains_bytes(&self, bytes: &[u8]) -> bool {
        self.bytes_to_id.contains_key(bytes)
    }

    /// Register a special token, appending it if its UTF-8 bytes are absent.
    ///
    /// Idempotent: a token whose bytes already have an id returns that id.
    /// New ids are assigned starting at `len()`, skipping over any id that is
    /// already occupied.
    pub fn register_special(&mut self, token: &str) -> u32 {
        let bytes = token.as_bytes();
        if let Some(id) = self.lookup_id(bytes) {
            return id;
        }
        let mut id = self.id_to_bytes.len() as u32;
        while self.id_to_bytes.contains_key(&id) {
            id += 1;
        }
        self.insert(id, bytes.to_vec());
        id
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.id_to_bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_bytes.is_empty()
    }
}
