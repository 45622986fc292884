//! Byte ↔ printable-codepoint codec for textual BPE vocabulary files.
//!
//! Published GPT-2 style vocabulary and merge files store token byte
//! sequences as strings of printable characters. The mapping is a fixed
//! bijection between the 256 byte values and 256 codepoints:
//!
//! - Bytes 33-126 (`!` to `~`): map to themselves
//! - Bytes 161-172 (`¡` to `¬`): map to themselves
//! - Bytes 174-255 (`®` to `ÿ`): map to themselves
//! - The remaining 68 bytes (0-32, 127-160, 173): assigned, in ascending
//!   byte order, codepoints starting at U+0100
//!
//! This construction must be reproduced exactly to stay compatible with
//! externally published vocabulary files. The runtime vocabulary and merge
//! table operate on raw byte strings; this codec is only consulted when
//! parsing or writing the textual formats.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;

/// Byte value → printable codepoint, 256 entries.
static BYTE_TO_CHAR: LazyLock<[char; 256]> = LazyLock::new(|| {
    let mut table = ['\0'; 256];
    let mut fallback = 256u32;
    for b in 0u32..256 {
        let printable =
            (33..=126).contains(&b) || (161..=172).contains(&b) || (174..=255).contains(&b);
        table[b as usize] = if printable {
            char::from_u32(b).unwrap()
        } else {
            let ch = char::from_u32(fallback).unwrap();
            fallback += 1;
            ch
        };
    }
    table
});

/// Printable codepoint → byte value, inverse of [`BYTE_TO_CHAR`].
static CHAR_TO_BYTE: LazyLock<FxHashMap<char, u8>> = LazyLock::new(|| {
    BYTE_TO_CHAR
        .iter()
        .enumerate()
        .map(|(byte, &ch)| (ch, byte as u8))
        .collect()
});

/// Map a byte value to its printable codepoint.
#[inline]
pub fn byte_to_char(byte: u8) -> char {
    BYTE_TO_CHAR[byte as usize]
}

/// Map a printable codepoint back to its byte value.
///
/// Returns `None` for characters outside the 256-codepoint alphabet.
#[inline]
pub fn char_to_byte(ch: char) -> Option<u8> {
    CHAR_TO_BYTE.get(&ch).copied()
}

/// Render a raw byte string in the printable representation used by
/// vocabulary and merge files.
#[inline]
pub fn bytes_to_printable(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| byte_to_char(b)).collect()
}

/// Recover a raw byte string from its printable representation.
///
/// Returns `None` if any character is outside the codec alphabet.
#[inline]
pub fn printable_to_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(char_to_byte).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn mapping_is_bijective() {
        let mut seen: HashSet<char> = HashSet::new();
        for b in 0u8..=255 {
            assert!(seen.insert(byte_to_char(b)), "duplicate codepoint for byte {b}");
        }
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn printable_ranges_map_to_themselves() {
        for b in (33u8..=126).chain(161..=172).chain(174..=255) {
            assert_eq!(byte_to_char(b) as u32, b as u32);
        }
    }

    #[test]
    fn fallback_bytes_are_assigned_in_ascending_order() {
        // Bytes 0-32 take U+0100..=U+0120, so the space byte lands on 'Ġ'.
        assert_eq!(byte_to_char(0), '\u{100}');
        assert_eq!(byte_to_char(31), '\u{11F}');
        assert_eq!(byte_to_char(32), 'Ġ');
        // 127 is the 34th fallback byte.
        assert_eq!(byte_to_char(127), '\u{121}');
        assert_eq!(byte_to_char(173), '\u{143}');
    }

    #[test]
    fn roundtrip_every_byte() {
        for b in 0u8..=255 {
            assert_eq!(char_to_byte(byte_to_char(b)), Some(b));
        }
    }

    #[test]
    fn printable_string_roundtrip() {
        let original = "Hello, 世界! 🌍".as_bytes();
        let printable = bytes_to_printable(original);
        assert_eq!(printable_to_bytes(&printable).as_deref(), Some(original));
    }

    #[test]
    fn space_prefixed_word() {
        assert_eq!(bytes_to_printable(b" hello"), "\u{120}hello");
    }

    #[test]
    fn unmapped_char_is_rejected() {
        // U+0144 is just past the end of the fallback range.
        assert_eq!(char_to_byte('\u{144}'), None);
        assert_eq!(printable_to_bytes("a\u{0}b"), None);
    }
}
