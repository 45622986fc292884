//! Streaming encode and decode.
//!
//! [`EncodeIterable`] is the lazy counterpart of `Tokenizer::encode`: the
//! caller drives iteration, ids are produced one at a time, and dropping the
//! iterator early is cancellation. [`StreamingDecoder`] is the inverse
//! direction for token-by-token output, buffering incomplete multi-byte
//! UTF-8 sequences that straddle token boundaries.

use std::collections::VecDeque;

use super::tokenizer::{Tokenizer, TokenizerError};

/// Lazy id iterator over a stream of text units.
///
/// One text unit is encoded per pull when the internal queue runs dry; each
/// unit's ids are exactly what [`Tokenizer::encode`] would produce for it.
/// After an encode error the iterator yields that error once and then ends.
pub struct EncodeIterable<'a, I> {
    tokenizer: &'a Tokenizer,
    texts: I,
    pending: VecDeque<u32>,
    failed: bool,
}

impl<'a, I> EncodeIterable<'a, I> {
    pub(crate) fn new(tokenizer: &'a Tokenizer, texts: I) -> Self {
        Self {
            tokenizer,
            texts,
            pending: VecDeque::new(),
            failed: false,
        }
    }
}

impl<I, S> Iterator for EncodeIterable<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<u32, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(id) = self.pending.pop_front() {
                return Some(Ok(id));
            }
            let text = self.texts.next()?;
            match self.tokenizer.encode(text.as_ref()) {
                Ok(ids) => self.pending.extend(ids),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Stateful decoder that emits only complete UTF-8 characters.
///
/// A token's bytes may end mid-character; pushed bytes accumulate until a
/// complete prefix can be handed out. [`flush`](Self::flush) drains whatever
/// remains, replacing an unfinished trailing sequence with U+FFFD.
pub struct StreamingDecoder<'a> {
    tokenizer: &'a Tokenizer,
    buffer: Vec<u8>,
}

impl<'a> StreamingDecoder<'a> {
    pub fn new(tokenizer: &'a Tokenizer) -> Self {
        Self {
            tokenizer,
            buffer: Vec::with_capacity(16),
        }
    }

    /// Append one token's bytes and return any newly completed text.
    ///
    /// # Errors
    ///
    /// [`TokenizerError::UnknownTokenId`] if the id is not in the
    /// vocabulary; the decoder state is unchanged in that case.
    pub fn push_token(&mut self, id: u32) -> Result<Option<String>, TokenizerError> {
        let piece = self
            .tokenizer
            .vocab()
            .lookup_bytes(id)
            .ok_or(TokenizerError::UnknownTokenId(id))?;
        self.buffer.extend_from_slice(piece);
        Ok(self.drain_complete())
    }

    /// Append several tokens at once and return any newly completed text.
    ///
    /// # Errors
    ///
    /// [`TokenizerError::UnknownTokenId`] if any id is not in the
    /// vocabulary; every id is resolved before the buffer is touched, so
    /// the decoder state is unchanged in that case.
    pub fn push_tokens(&mut self, ids: &[u32]) -> Result<Option<String>, TokenizerError> {
        let mut pieces = Vec::with_capacity(ids.len());
        for &id in ids {
            pieces.push(
                self.tokenizer
                    .vocab()
                    .lookup_bytes(id)
                    .ok_or(TokenizerError::UnknownTokenId(id))?,
            );
        }
        for piece in pieces {
            self.buffer.extend_from_slice(piece);
        }
        Ok(self.drain_complete())
    }

    /// Drain remaining bytes, lossily converting an unfinished tail.
    pub fn flush(&mut self) -> String {
        if self.buffer.is_empty() {
            return String::new();
        }
        let bytes = std::mem::take(&mut self.buffer);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Discard buffered bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Drain everything emittable from the buffer.
    ///
    /// Only an incomplete multi-byte sequence at the tail stays buffered;
    /// invalid runs are emitted with replacement characters, together with
    /// whatever valid text follows them, so the decoder cannot stall on
    /// garbage input.
    fn drain_complete(&mut self) -> Option<String> {
        let mut out = String::new();
        while !self.buffer.is_empty() {
            let split = match std::str::from_utf8(&self.buffer) {
                Ok(_) => self.buffer.len(),
                Err(e) => match e.error_len() {
                    None => e.valid_up_to(),
                    Some(bad) => e.valid_up_to() + bad,
                },
            };
            if split == 0 {
                break;
            }
            let rest = self.buffer.split_off(split);
            let chunk = std::mem::replace(&mut self.buffer, rest);
            out.push_str(&String::from_utf8_lossy(&chunk));
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::merges::MergeTable;
    use crate::core::vocab::Vocabulary;

    fn byte_tokenizer() -> Tokenizer {
        let vocab = Vocabulary::new((0u32..=255).map(|b| (b, vec![b as u8])));
        Tokenizer::new(vocab, MergeTable::new([]), ["<|endoftext|>"]).unwrap()
    }

    #[test]
    fn iterable_matches_per_unit_encode() {
        let tok = byte_tokenizer();
        let units = ["Hello, ", "world", "!"];
        let streamed: Result<Vec<u32>, _> = tok.encode_iterable(units).collect();
        let mut expected = Vec::new();
        for unit in units {
            expected.extend(tok.encode(unit).unwrap());
        }
        assert_eq!(streamed.unwrap(), expected);
    }

    #[test]
    fn iterable_is_lazy_and_cancellable() {
        let tok = byte_tokenizer();
        let taken: Vec<_> = tok
            .encode_iterable(["abcdef", "ghij"])
            .take(3)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(taken, vec![97, 98, 99]);
    }

    #[test]
    fn iterable_handles_special_tokens() {
        let tok = byte_tokenizer();
        let eot = tok.special_ids()["<|endoftext|>"];
        let ids: Vec<_> = tok
            .encode_iterable(["a<|endoftext|>"])
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec![97, eot]);
    }

    #[test]
    fn decoder_buffers_split_multibyte_character() {
        let tok = byte_tokenizer();
        let mut decoder = StreamingDecoder::new(&tok);
        // "🙃" is four bytes; push them as four single-byte tokens.
        let bytes = "🙃".as_bytes();
        for &b in &bytes[..3] {
            assert_eq!(decoder.push_token(b as u32).unwrap(), None);
            assert!(decoder.has_pending());
        }
        let out = decoder.push_token(bytes[3] as u32).unwrap();
        assert_eq!(out.as_deref(), Some("🙃"));
        assert!(!decoder.has_pending());
        assert_eq!(decoder.flush(), "");
    }

    #[test]
    fn decoder_emits_ascii_immediately() {
        let tok = byte_tokenizer();
        let mut decoder = StreamingDecoder::new(&tok);
        assert_eq!(decoder.push_token(104).unwrap().as_deref(), Some("h"));
        assert_eq!(decoder.push_token(105).unwrap().as_deref(), Some("i"));
    }

    #[test]
    fn decoder_flush_replaces_unfinished_tail() {
        let tok = byte_tokenizer();
        let mut decoder = StreamingDecoder::new(&tok);
        let bytes = "é".as_bytes();
        assert_eq!(decoder.push_token(bytes[0] as u32).unwrap(), None);
        assert_eq!(decoder.flush(), "\u{FFFD}");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn decoder_rejects_unknown_id() {
        let tok = byte_tokenizer();
        let mut decoder = StreamingDecoder::new(&tok);
        assert!(matches!(
            decoder.push_token(70_000),
            Err(TokenizerError::UnknownTokenId(70_000))
        ));
        assert!(!decoder.has_pending());
    }

    #[test]
    fn failed_batch_push_leaves_decoder_untouched() {
        let tok = byte_tokenizer();
        let mut decoder = StreamingDecoder::new(&tok);
        assert!(matches!(
            decoder.push_tokens(&[104, 105, 70_000]),
            Err(TokenizerError::UnknownTokenId(70_000))
        ));
        // Nothing from the failed call may linger.
        assert!(!decoder.has_pending());
        assert_eq!(decoder.flush(), "");
        // The decoder is still usable afterwards.
        assert_eq!(decoder.push_token(104).unwrap().as_deref(), Some("h"));
    }

    #[test]
    fn text_behind_invalid_byte_drains_in_the_same_call() {
        let tok = byte_tokenizer();
        let mut decoder = StreamingDecoder::new(&tok);
        let out = decoder.push_tokens(&[0xFF, 97]).unwrap();
        assert_eq!(out.as_deref(), Some("\u{FFFD}a"));
        assert!(!decoder.has_pending());
    }

    #[test]
    fn incomplete_tail_after_invalid_byte_stays_buffered() {
        let tok = byte_tokenizer();
        let mut decoder = StreamingDecoder::new(&tok);
        // 0xC3 starts a two-byte sequence; only the invalid 0xFF is emitted.
        let out = decoder.push_tokens(&[0xFF, 0xC3]).unwrap();
        assert_eq!(out.as_deref(), Some("\u{FFFD}"));
        assert_eq!(decoder.pending_bytes(), 1);
        // The continuation byte completes the character.
        let out = decoder.push_token(0xA9).unwrap();
        assert_eq!(out.as_deref(), Some("é"));
    }

    #[test]
    fn decoder_does_not_stall_on_invalid_byte() {
        let tok = byte_tokenizer();
        let mut decoder = StreamingDecoder::new(&tok);
        // 0xFF can never start a valid sequence.
        let out = decoder.push_token(0xFF).unwrap();
        assert_eq!(out.as_deref(), Some("\u{FFFD}"));
        assert!(!decoder.has_pending());
    }
}
