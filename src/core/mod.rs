//! Core byte-pair tokenization engine.
//!
//! The pipeline is: text → [`SpecialTokenSplitter`] → per-segment
//! [`Pretokenizer`] → per-pre-token greedy BPE merge ([`byte_pair_encode`],
//! driven by [`Vocabulary`] and [`MergeTable`]) → id sequence. Decoding
//! reverses only the final vocabulary lookup; merges are never re-derived.
//!
//! # Components
//!
//! - [`Tokenizer`]: the orchestrating encode/decode API, with an LRU cache
//!   of per-pre-token merge results and rayon batch helpers
//! - [`byte_pair_encode`]: the greedy rank-ordered merge loop, fail-soft on
//!   vocabulary-closure gaps
//! - [`Vocabulary`] / [`MergeTable`]: the immutable id and rank tables
//! - [`byte_level`]: the byte ↔ printable-codepoint codec the textual file
//!   formats are written in
//! - [`EncodeIterable`] / [`StreamingDecoder`]: caller-driven streaming in
//!   both directions

mod bpe;
pub mod byte_level;
mod formats;
mod merges;
mod pretokenize;
mod special;
mod streaming;
mod tokenizer;
mod vocab;

pub use bpe::byte_pair_encode;
pub use byte_level::{byte_to_char, bytes_to_printable, char_to_byte, printable_to_bytes};
pub use formats::{load_merges, load_merges_file, load_vocab_json, load_vocab_json_file};
pub use merges::MergeTable;
pub use pretokenize::{Pretokenizer, GPT2_PATTERN};
pub use special::{Segment, SpecialTokenSplitter};
pub use streaming::{EncodeIterable, StreamingDecoder};
pub use tokenizer::{Tokenizer, TokenizerError};
pub use vocab::{VocabError, Vocabulary};
