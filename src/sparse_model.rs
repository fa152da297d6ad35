//! Context models keyed by non-adjacent byte positions: the "sparse 2/3/4"
//! single-offset models and the "sparse 2-3"/"3-4" gapped pairs spec.md
//! §4.11's profile configuration names.
//!
//! Reuses the same hash-table/state-map machinery as `order_model`, just
//! re-keyed from "last N contiguous bytes" to specific lookback offsets —
//! the standard lpaq/paq8 sparse-context selection this model family
//! descends from.

use crate::byte_buffer::ByteBuffer;
use crate::hash_table::HashTable;
use crate::logistic::Stretch;
use crate::state_map::StateMap;
use crate::tables::StateTable;

const HASH_MUL: u32 = 0x9E37_79B1;

fn mix(mut h: u32) -> u32 {
    h ^= h >> 15;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h
}

fn sparse_hash(offsets: &[usize], buf: &ByteBuffer) -> u32 {
    let mut h = 0xC2B2_AE35u32 ^ offsets.len() as u32;
    for &off in offsets {
        h = h
            .wrapping_mul(HASH_MUL)
            .wrapping_add(buf.at_back(off) as u32 + 1);
    }
    mix(h)
}

pub struct SparseModel {
    offsets: Vec<usize>,
    table: HashTable,
    state_map: StateMap,
    hash: u32,
    idx: usize,
    state: u8,
}

impl SparseModel {
    /// `offsets` are back-distances from the current position, e.g. `[2]`
    /// for "byte two back" or `[2, 3]` for the "2-3" gapped pair.
    pub fn new(offsets: &[usize], table_bits: u32, stretch: &Stretch) -> Self {
        SparseModel {
            offsets: offsets.to_vec(),
            table: HashTable::new(table_bits),
            state_map: StateMap::with_state_table(4, 9, stretch),
            hash: 0,
            idx: 0,
            state: 0,
        }
    }

    pub fn begin_byte(&mut self, buf: &ByteBuffer) {
        self.hash = sparse_hash(&self.offsets, buf);
    }

    pub fn predict(&mut self, bit_context: u32) -> i32 {
        self.idx = self.table.zone(self.hash) + bit_context as usize;
        self.state = self.table.get(self.idx);
        self.state_map.p(self.state as usize)
    }

    pub fn update(&mut self, bit: u32, states: &StateTable, stretch: &Stretch) {
        self.state_map.update(self.state as usize, bit, stretch);
        let next = states.next(self.state, bit);
        self.table.set(self.idx, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_offset_differs_from_single() {
        let mut buf = ByteBuffer::new(64);
        for b in b"abcdefgh" {
            buf.push(*b);
        }
        let single = sparse_hash(&[2], &buf);
        let pair = sparse_hash(&[2, 3], &buf);
        assert_ne!(single, pair);
    }
}
