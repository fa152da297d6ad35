//! Shared per-bit plumbing for context models whose hash is computed
//! externally (word, bracket, special-char, interval): zone lookup in a
//! direct-mapped hash table, state-based probability, FSM advance. The
//! order/sparse models duplicate this shape themselves since their hash
//! computation is internal; this type exists so the miscellaneous
//! single-hash models (§4.8–§4.10) don't each reimplement it.

use crate::hash_table::HashTable;
use crate::logistic::Stretch;
use crate::state_map::StateMap;
use crate::tables::StateTable;

pub struct HashModel {
    table: HashTable,
    state_map: StateMap,
    idx: usize,
    state: u8,
}

impl HashModel {
    pub fn new(table_bits: u32, stretch: &Stretch) -> Self {
        HashModel {
            table: HashTable::new(table_bits),
            state_map: StateMap::with_state_table(4, 9, stretch),
            idx: 0,
            state: 0,
        }
    }

    pub fn predict(&mut self, hash: u32, bit_context: u32) -> i32 {
        self.idx = self.table.zone(hash) + bit_context as usize;
        self.state = self.table.get(self.idx);
        self.state_map.p(self.state as usize)
    }

    pub fn update(&mut self, bit: u32, states: &StateTable, stretch: &Stretch) {
        self.state_map.update(self.state as usize, bit, stretch);
        let next = states.next(self.state, bit);
        self.table.set(self.idx, next);
    }
}
