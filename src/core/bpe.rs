//! Greedy rank-ordered byte-pair merging of a single pre-token.

use super::merges::MergeTable;
use super::tokenizer::TokenizerError;
use super::vocab::Vocabulary;

/// Encode one pre-token's bytes into ids by greedy BPE merging.
///
/// The bytes are split into 1-byte symbols, then the lowest-rank adjacent
/// pair is merged repeatedly until no ranked pair remains. A pair whose
/// concatenation has no id is skipped rather than applied, so a gap in
/// vocabulary closure degrades to finer-grained tokens instead of failing.
/// When the same rank occurs at several positions the leftmost merges first.
///
/// Merges never cross pre-token boundaries; callers invoke this once per
/// pre-token.
///
/// # Errors
///
/// [`TokenizerError::TokenNotInVocabulary`] if a surviving symbol has no id,
/// which can only happen when a single-byte entry is missing from the
/// vocabulary.
pub fn byte_pair_encode(
    piece: &[u8],
    merges: &MergeTable,
    vocab: &Vocabulary,
) -> Result<Vec<u32>, TokenizerError> {
    let mut symbols: Vec<Vec<u8>> = piece.iter().map(|&b| vec![b]).collect();

    loop {
        let mut best: Option<(u32, usize)> = None;
        for i in 0..symbols.len().saturating_sub(1) {
            let Some(rank) = merges.rank_of(&symbols[i], &symbols[i + 1]) else {
                continue;
            };
            if best.is_some_and(|(r, _)| r <= rank) {
                continue;
            }
            // The merged symbol must already have an id, otherwise the rule
            // is unusable against this vocabulary.
            let mut merged = symbols[i].clone();
            merged.extend_from_slice(&symbols[i + 1]);
            if !vocab.contains_bytes(&merged) {
                continue;
            }
            best = Some((rank, i));
        }

        let Some((_, i)) = best else { break };
        let right = symbols.remove(i + 1);
        symbols[i].extend_from_slice(&right);
    }

    let mut ids = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match vocab.lookup_id(&symbol) {
            Some(id) => ids.push(id),
            None => return Err(TokenizerError::TokenNotInVocabulary(symbol)),
        }
    }
    Ok(ids)
}
