//! Rolling word hash, per spec.md §4.8.
//!
//! Grounded on `aufdj-prisirv/src/word_model.rs` (fold-through-reorder +
//! `* 43` hash multiplier), generalized from the teacher's ASCII-letter-only
//! unigram model to the full three-hash-output model spec.md names, and
//! cross-checked against `original_source/WordModel.hpp`'s `HashFunc`/
//! `get01Hash` for the hash-combination shape (the length cap here is 16
//! per spec.md's text, not the original's 31 — spec.md is authoritative).

use crate::constant::{WORD_HASH_MUL, WORD_LEN_CAP};

pub struct WordModel {
    hash: u32,
    prev_hash: u32,
    len: u32,
}

impl WordModel {
    pub fn new() -> Self {
        WordModel {
            hash: 0,
            prev_hash: 0,
            len: 0,
        }
    }

    pub fn is_word_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_'
    }

    /// Feed one already-reordered byte.
    pub fn update(&mut self, transformed_byte: u8) {
        if Self::is_word_byte(transformed_byte) {
            if self.len < WORD_LEN_CAP {
                self.hash = self
                    .hash
                    .wrapping_mul(WORD_HASH_MUL)
                    .wrapping_add(transformed_byte as u32);
                self.len += 1;
            }
        } else {
            if self.len > 0 {
                self.prev_hash = self.hash;
            }
            self.hash = 0;
            self.len = 0;
        }
    }

    pub fn get_hash(&self) -> u32 {
        self.hash
    }

    pub fn get_prev_hash(&self) -> u32 {
        self.prev_hash
    }

    pub fn get01_hash(&self) -> u32 {
        self.hash ^ self.prev_hash
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for WordModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resets_on_non_word_byte() {
        let mut w = WordModel::new();
        for b in b"hello" {
            w.update(*b);
        }
        let hash_before_break = w.get_hash();
        w.update(b' ');
        assert_eq!(w.get_hash(), 0);
        assert_eq!(w.get_prev_hash(), hash_before_break);
    }

    #[test]
    fn caps_length() {
        let mut w = WordModel::new();
        for _ in 0..64 {
            w.update(b'a');
        }
        assert_eq!(w.len(), WORD_LEN_CAP);
    }

    #[test]
    fn get01_hash_combines_both() {
        let mut w = WordModel::new();
        for b in b"ab" {
            w.update(*b);
        }
        w.update(b' ');
        for b in b"cd" {
            w.update(*b);
        }
        assert_eq!(w.get01_hash(), w.get_hash() ^ w.get_prev_hash());
    }
}
