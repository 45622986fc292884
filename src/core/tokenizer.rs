//! The encode/decode engine tying vocabulary, merges, pre-tokenization and
//! special-token handling together.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;

use lru::LruCache;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHasher};
use thiserror::Error;

use super::bpe::byte_pair_encode;
use super::formats::{load_merges_file, load_vocab_json_file};
use super::merges::MergeTable;
use super::pretokenize::Pretokenizer;
use super::special::{Segment, SpecialTokenSplitter};
use super::streaming::EncodeIterable;
use super::vocab::{VocabError, Vocabulary};

/// Errors surfaced by tokenizer construction, encoding and decoding.
///
/// All failures are local to a single call; the tokenizer remains valid for
/// subsequent calls and nothing is retried.
#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("unknown token id: {0}")]
    UnknownTokenId(u32),
    #[error("byte sequence {0:?} has no id in the vocabulary")]
    TokenNotInVocabulary(Vec<u8>),
    #[error("vocabulary error: {0}")]
    Vocab(#[from] VocabError),
    #[error("pre-tokenizer pattern error: {0}")]
    Regex(#[from] fancy_regex::Error),
    #[error("special token matcher error: {0}")]
    AhoCorasick(#[from] aho_corasick::BuildError),
}

/// Default size of the per-pre-token result cache.
const DEFAULT_CACHE_SIZE: usize = 4096;

/// Byte-level BPE tokenizer.
///
/// Construction wires the components together and registers the special
/// tokens; afterwards the vocabulary and merge table are immutable, so a
/// `Tokenizer` is safe to share across threads. The only interior mutability
/// is the LRU cache of per-pre-token merge results, which memoizes the
/// output of the merge loop and never changes what is produced.
#[derive(Debug)]
pub struct Tokenizer {
    vocab: Vocabulary,
    merges: MergeTable,
    pretokenizer: Pretokenizer,
    splitter: SpecialTokenSplitter,
    special_ids: FxHashMap<String, u32>,
    chunk_cache: Mutex<LruCache<u64, Vec<u32>>>,
    cache_size: usize,
}

impl Tokenizer {
    /// Create a tokenizer from a vocabulary, a merge table and a collection
    /// of special-token strings.
    ///
    /// Duplicate special tokens collapse to one entry; tokens whose bytes
    /// already have an id reuse it, the rest are appended to the vocabulary.
    pub fn new<I, S>(
        vocab: Vocabulary,
        merges: MergeTable,
        special_tokens: I,
    ) -> Result<Self, TokenizerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_cache_size(vocab, merges, special_tokens, DEFAULT_CACHE_SIZE)
    }

    /// Create a tokenizer with a custom pre-token cache size.
    pub fn with_cache_size<I, S>(
        mut vocab: Vocabulary,
        merges: MergeTable,
        special_tokens: I,
        cache_size: usize,
    ) -> Result<Self, TokenizerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut special_ids = FxHashMap::default();
        let mut ordered: Vec<String> = Vec::new();
        for token in special_tokens {
            let token = token.as_ref();
            if special_ids.contains_key(token) {
                continue;
            }
            let id = vocab.register_special(token);
            special_ids.insert(token.to_string(), id);
            ordered.push(token.to_string());
        }

        let splitter = SpecialTokenSplitter::new(&ordered)?;
        let pretokenizer = Pretokenizer::new()?;
        let cache_size_nz = NonZeroUsize::new(cache_size.max(1)).unwrap();

        Ok(Self {
            vocab,
            merges,
            pretokenizer,
            splitter,
            special_ids,
            chunk_cache: Mutex::new(LruCache::new(cache_size_nz)),
            cache_size,
        })
    }

    /// Load a tokenizer from a JSON vocabulary file and a plain-text merge
    /// file (see [`formats`](super::formats)).
    pub fn from_files<I, S>(
        vocab_path: impl AsRef<Path>,
        merges_path: impl AsRef<Path>,
        special_tokens: I,
    ) -> Result<Self, TokenizerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocab = load_vocab_json_file(vocab_path)?;
        let merges = load_merges_file(merges_path)?;
        Self::new(vocab, merges, special_tokens)
    }

    #[inline]
    fn hash_slice(slice: &[u8]) -> u64 {
        let mut hasher = FxHasher::default();
        slice.hash(&mut hasher);
        hasher.finish()
    }

    /// Merge one pre-token, memoizing the result.
    fn encode_pre_token(&self, piece: &[u8]) -> Result<Vec<u32>, TokenizerError> {
        let hash = Self::hash_slice(piece);
        if let Ok(mut cache) = self.chunk_cache.lock() {
            if let Some(ids) = cache.get(&hash) {
                return Ok(ids.clone());
            }
        }

        let ids = byte_pair_encode(piece, &self.merges, &self.vocab)?;

        if let Ok(mut cache) = self.chunk_cache.lock() {
            cache.put(hash, ids.clone());
        }
        Ok(ids)
    }

    /// Encode text to token ids.
    ///
    /// Special-token occurrences are emitted as single ids; everything else
    /// is pre-tokenized and merged per pre-token, in original order.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let mut ids = Vec::new();
        for segment in self.splitter.split(text) {
            match segment {
                Segment::Special(token) => {
                    if let Some(&id) = self.special_ids.get(token) {
                        ids.push(id);
                    }
                }
                Segment::Plain(chunk) => {
                    for pre_token in self.pretokenizer.split(chunk) {
                        ids.extend(self.encode_pre_token(pre_token.as_bytes())?);
                    }
                }
            }
        }
        Ok(ids)
    }

    /// Lazily encode a stream of text units, yielding one id at a time.
    ///
    /// Each unit is encoded exactly as [`encode`](Self::encode) would encode
    /// it; dropping the iterator early cancels the remaining work.
    pub fn encode_iterable<I>(&self, texts: I) -> EncodeIterable<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        EncodeIterable::new(self, texts.into_iter())
    }

    /// Decode token ids to their concatenated byte strings.
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>, TokenizerError> {
        let mut bytes = Vec::with_capacity(ids.len() * 4);
        for &id in ids {
            let piece = self
                .vocab
                .lookup_bytes(id)
                .ok_or(TokenizerError::UnknownTokenId(id))?;
            bytes.extend_from_slice(piece);
        }
        Ok(bytes)
    }

    /// Decode token ids to text.
    ///
    /// Invalid UTF-8 becomes U+FFFD, which can only happen for id sequences
    /// this tokenizer did not produce; ids from [`encode`](Self::encode)
    /// reconstruct the input exactly.
    pub fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        let bytes = self.decode_bytes(ids)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Encode a batch of texts in parallel, preserving order.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<u32>>, TokenizerError> {
        texts.par_iter().map(|text| self.encode(text)).collect()
    }

    /// Decode a batch of id sequences in parallel, preserving order.
    pub fn decode_batch(&self, id_lists: &[Vec<u32>]) -> Result<Vec<String>, TokenizerError> {
        id_lists.par_iter().map(|ids| self.decode(ids)).collect()
    }

    /// Number of distinct ids in the vocabulary, special tokens included.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// The vocabulary, special tokens included.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The merge rank table.
    pub fn merges(&self) -> &MergeTable {
        &self.merges
    }

    /// Registered special tokens and their ids.
    pub fn special_ids(&self) -> &FxHashMap<String, u32> {
        &self.special_ids
    }

    /// Drop all memoized pre-token results.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.chunk_cache.lock() {
            cache.clear();
        }
    }

    /// Number of memoized pre-token results.
    pub fn cache_len(&self) -> usize {
        self.chunk_cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Clone for Tokenizer {
    fn clone(&self) -> Self {
        // The cache is not shared between clones.
        let cache_size_nz = NonZeroUsize::new(self.cache_size.max(1)).unwrap();
        Self {
            vocab: self.vocab.clone(),
            merges: self.merges.clone(),
            pretokenizer: Pretokenizer::new().expect("default pattern compiles"),
            splitter: SpecialTokenSplitter::new(self.special_ids.keys())
                .expect("patterns already validated"),
            special_ids: self.special_ids.clone(),
            chunk_cache: Mutex::new(LruCache::new(cache_size_nz)),
            cache_size: self.cache_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tokenizer(extra: &[(u32, &[u8])], pairs: &[(&[u8], &[u8])]) -> Tokenizer {
        let vocab = Vocabulary::new(
            (0u32..=255)
                .map(|b| (b, vec![b as u8]))
                .chain(extra.iter().map(|&(id, bytes)| (id, bytes.to_vec()))),
        );
        let merges = MergeTable::new(pairs.iter().map(|&(l, r)| (l.to_vec(), r.to_vec())));
        Tokenizer::new(vocab, merges, ["<|endoftext|>"]).unwrap()
    }

    #[test]
    fn encode_without_merges_is_raw_bytes() {
        let tok = make_tokenizer(&[], &[]);
        let ids = tok.encode("Hello, how are you?").unwrap();
        let expected: Vec<u32> = "Hello, how are you?".bytes().map(u32::from).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn encode_applies_merges_within_pre_tokens() {
        let tok = make_tokenizer(&[(300, b"he")], &[(b"h", b"e")]);
        assert_eq!(tok.encode("he").unwrap(), vec![300]);
    }

    #[test]
    fn decode_inverts_encode() {
        let tok = make_tokenizer(&[], &[]);
        let text = "round trips, naïvely 🙃";
        let ids = tok.encode(text).unwrap();
        assert_eq!(tok.decode(&ids).unwrap(), text);
    }

    #[test]
    fn decode_unknown_id_errors() {
        let tok = make_tokenizer(&[], &[]);
        let err = tok.decode(&[99_999]).unwrap_err();
        assert!(matches!(err, TokenizerError::UnknownTokenId(99_999)));
    }

    #[test]
    fn special_token_is_one_id() {
        let tok = make_tokenizer(&[], &[]);
        let eot = tok.special_ids()["<|endoftext|>"];
        assert_eq!(tok.encode("<|endoftext|>").unwrap(), vec![eot]);
    }

    #[test]
    fn empty_text_encodes_to_nothing() {
        let tok = make_tokenizer(&[], &[]);
        assert!(tok.encode("").unwrap().is_empty());
    }

    #[test]
    fn encode_is_deterministic() {
        let tok = make_tokenizer(&[(300, b"he"), (301, b"ll")], &[(b"h", b"e"), (b"l", b"l")]);
        let a = tok.encode("hello hello").unwrap();
        let b = tok.encode("hello hello").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cache_fills_and_clears() {
        let tok = make_tokenizer(&[], &[]);
        tok.encode("some words here").unwrap();
        assert!(tok.cache_len() > 0);
        tok.clear_cache();
        assert_eq!(tok.cache_len(), 0);
    }

    #[test]
    fn batch_matches_sequential() {
        let tok = make_tokenizer(&[(300, b"he")], &[(b"h", b"e")]);
        let texts = vec!["hello".to_string(), "he".to_string(), "".to_string()];
        let batch = tok.encode_batch(&texts).unwrap();
        for (text, ids) in texts.iter().zip(&batch) {
            assert_eq!(ids, &tok.encode(text).unwrap());
        }
    }

    #[test]
    fn vocab_size_counts_appended_specials() {
        let tok = make_tokenizer(&[], &[]);
        assert_eq!(tok.vocab_size(), 257);
    }

    #[test]
    fn clone_encodes_identically() {
        let tok = make_tokenizer(&[(300, b"he")], &[(b"h", b"e")]);
        let clone = tok.clone();
        assert_eq!(
            tok.encode("he said<|endoftext|>").unwrap(),
            clone.encode("he said<|endoftext|>").unwrap()
        );
        assert!(clone.cache_len() > 0);
    }
}
