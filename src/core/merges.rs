//! Ordered byte-pair merge rules with O(1) rank lookup.
//!
//! The merge list is a total order: the list index is the *rank*, and a
//! lower rank means the rule was learned earlier and merges first. The list
//! is materialized once into a hash map at construction so the encoder never
//! rescans it; behavior is identical to a linear scan, only faster.

use rustc_hash::FxHashMap;

/// Immutable `(left, right) → rank` table.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    // Nested map keyed by the left part so lookups borrow plain byte slices.
    ranks: FxHashMap<Vec<u8>, FxHashMap<Vec<u8>, u32>>,
    len: usize,
}

impl MergeTable {
    /// Build the rank table from an ordered list of merge rules.
    ///
    /// Duplicate pairs keep their first (lowest) rank.
    pub fn new(pairs: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>) -> Self {
        let mut ranks: FxHashMap<Vec<u8>, FxHashMap<Vec<u8>, u32>> = FxHashMap::default();
        let mut len = 0usize;
        for (rank, (left, right)) in pairs.into_iter().enumerate() {
            ranks
                .entry(left)
                .or_default()
                .entry(right)
                .or_insert(rank as u32);
            len += 1;
        }
        Self { ranks, len }
    }

    /// Rank of an adjacent pair, if the pair is a known merge rule.
    #[inline]
    pub fn rank_of(&self, left: &[u8], right: &[u8]) -> Option<u32> {
        self.ranks.get(left)?.get(right).copied()
    }

    /// Number of rules the table was built from.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
