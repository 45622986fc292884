//! pairtok - byte-level BPE tokenizer.
//!
//! Encodes text to integer token ids and back using a fixed byte-level
//! vocabulary and a prioritized byte-pair merge table, reproducing the
//! behavior of GPT-2 style reference tokenizers: regex pre-tokenization
//! with real Unicode classes, greedy rank-ordered merging confined to
//! pre-tokens, atomic special tokens, and the byte ↔ printable-codepoint
//! codec used by textual vocabulary files.
//!
//! ```
//! use pairtok::{MergeTable, Tokenizer, Vocabulary};
//!
//! let vocab = Vocabulary::new(
//!     (0u32..=255)
//!         .map(|b| (b, vec![b as u8]))
//!         .chain([(256, b"he".to_vec())]),
//! );
//! let merges = MergeTable::new([(b"h".to_vec(), b"e".to_vec())]);
//! let tok = Tokenizer::new(vocab, merges, ["<|endoftext|>"]).unwrap();
//!
//! let ids = tok.encode("he").unwrap();
//! assert_eq!(ids, vec![256]);
//! assert_eq!(tok.decode(&ids).unwrap(), "he");
//! ```

pub mod core;

pub use crate::core::{
    byte_pair_encode, load_merges, load_merges_file, load_vocab_json, load_vocab_json_file,
    EncodeIterable, MergeTable, Pretokenizer, Segment, SpecialTokenSplitter, StreamingDecoder,
    Tokenizer, TokenizerError, VocabError, Vocabulary, GPT2_PATTERN,
};
