//! The per-bit prediction loop tying every model together: context
//! assembly, mixing, SSE refinement. Generalizes
//! `aufdj-prisirv/src/predictor.rs` (`Predictor::update`'s overall shape —
//! add each model's stretched probability into the mixer, pick a mixer
//! context from match state, blend through two SSE stages) from the
//! teacher's fixed 7-model lpaq1 bank into the profile-driven bank spec.md
//! §4.11 describes.

use crate::bracket_model::{BracketModel, LastSpecialCharModel};
use crate::byte_buffer::ByteBuffer;
use crate::constant::HASH_TABLE_BASE_BITS;
use crate::hash_model::HashModel;
use crate::interval_model::IntervalModel;
use crate::logistic::Stretch;
use crate::match_model::MatchModel;
use crate::mixer::Mixer;
use crate::order_model::OrderModel;
use crate::profile::{ModelSet, ProfileConfig};
use crate::reorder::ReorderTable;
use crate::sparse_model::SparseModel;
use crate::sse::SseBank;
use crate::tables::StateTable;
use crate::word_model::WordModel;

const ORDERS: [(ModelSet, usize); 8] = [
    (ModelSet::ORDER0, 0),
    (ModelSet::ORDER1, 1),
    (ModelSet::ORDER2, 2),
    (ModelSet::ORDER3, 3),
    (ModelSet::ORDER4, 4),
    (ModelSet::ORDER6, 6),
    (ModelSet::ORDER8, 8),
    (ModelSet::ORDER12, 12),
];

const SPARSE: [(ModelSet, &[usize]); 5] = [
    (ModelSet::SPARSE2, &[2]),
    (ModelSet::SPARSE3, &[3]),
    (ModelSet::SPARSE4, &[4]),
    (ModelSet::SPARSE_2_3, &[2, 3]),
    (ModelSet::SPARSE_3_4, &[3, 4]),
];

fn len_bucket(len: u32) -> u32 {
    32 - len.min(u32::MAX >> 1).leading_zeros().min(31)
}

/// A coarse, length-scaled confidence for the match model's expected bit
/// when it contributes to the mixer outside the LZP fast path (below
/// `min_lzp_len`, or after a within-byte mismatch resets `active`).
fn match_confidence(expected_bit: u32, len: u32) -> i32 {
    let magnitude = (200 + len as i32 * 96).min(2000);
    if expected_bit == 1 {
        magnitude
    } else {
        -magnitude
    }
}

pub struct Predictor {
    stretch: Stretch,
    states: StateTable,
    cfg: ProfileConfig,
    reorder: ReorderTable,
    buf: ByteBuffer,

    orders: Vec<(ModelSet, OrderModel)>,
    sparse: Vec<(ModelSet, SparseModel)>,

    word_model: WordModel,
    word1: HashModel,
    word2: HashModel,
    word12: HashModel,

    bracket_model: BracketModel,
    bracket_hash: HashModel,

    special_model: LastSpecialCharModel,
    special_hash: HashModel,

    interval_model: IntervalModel,
    interval_hash: HashModel,
    interval2_hash: HashModel,

    match_model: MatchModel,
    mixer: Mixer,
    sse: SseBank,

    c0: u32,
    last_pr: i32,
    expected_bit_this_bit: Option<u32>,
    byte_diverged: bool,
}

impl Predictor {
    pub fn new(cfg: ProfileConfig, mem_level: u8) -> Self {
        let stretch = Stretch::new();
        let states = StateTable::new();
        let table_bits = HASH_TABLE_BASE_BITS + mem_level as u32;
        let buf_size = (crate::constant::BYTE_BUFFER_BASE << mem_level).next_power_of_two();

        let mut orders = Vec::new();
        for &(flag, order) in ORDERS.iter() {
            if cfg.models.contains(flag) {
                orders.push((flag, OrderModel::new(order, table_bits, &stretch)));
            }
        }
        let mut sparse = Vec::new();
        for &(flag, offsets) in SPARSE.iter() {
            if cfg.models.contains(flag) {
                sparse.push((flag, SparseModel::new(offsets, table_bits, &stretch)));
            }
        }

        let n_inputs = orders.len()
            + sparse.len()
            + cfg.models.contains(ModelSet::WORD1) as usize
            + cfg.models.contains(ModelSet::WORD2) as usize
            + cfg.models.contains(ModelSet::WORD12) as usize
            + cfg.models.contains(ModelSet::BRACKET) as usize
            + cfg.models.contains(ModelSet::SPECIAL_CHAR) as usize
            + cfg.models.contains(ModelSet::INTERVAL) as usize
            + cfg.models.contains(ModelSet::INTERVAL2) as usize
            + 1 // match-model expected-bit contribution
            + 1; // always at least one input so the mixer is never empty

        Predictor {
            match_model: MatchModel::new(cfg.match_model_order as usize, table_bits, 4),
            orders,
            sparse,
            word_model: WordModel::new(),
            word1: HashModel::new(table_bits, &stretch),
            word2: HashModel::new(table_bits, &stretch),
            word12: HashModel::new(table_bits, &stretch),
            bracket_model: BracketModel::new(),
            bracket_hash: HashModel::new(table_bits, &stretch),
            special_model: LastSpecialCharModel::new(),
            special_hash: HashModel::new(table_bits, &stretch),
            interval_model: IntervalModel::new(cfg.interval_mask_bits, cfg.profile == crate::profile::Profile::Text),
            interval_hash: HashModel::new(table_bits, &stretch),
            interval2_hash: HashModel::new(table_bits, &stretch),
            mixer: Mixer::new(n_inputs, 16),
            sse: SseBank::new(2048, 256, 4096, &stretch),
            buf: ByteBuffer::new(buf_size),
            reorder: ReorderTable::new(cfg.profile.reorder_kind()),
            states,
            stretch,
            cfg,
            c0: 1,
            last_pr: 2048,
            expected_bit_this_bit: None,
            byte_diverged: false,
        }
    }

    fn mixer_context(&self) -> usize {
        let small = self.interval_model.small() as usize & 0x7;
        let active = self.match_model.active as usize;
        (small | (active << 3)) & 0xF
    }

    /// Recomputes every model's per-byte context hash. Call once per byte,
    /// before coding its bits (or its single LZP bit).
    pub fn begin_byte(&mut self) {
        self.c0 = 1;
        self.byte_diverged = false;
        for (_, m) in self.orders.iter_mut() {
            m.begin_byte(&self.buf);
        }
        for (_, m) in self.sparse.iter_mut() {
            m.begin_byte(&self.buf);
        }
        self.match_model.begin_byte(&self.buf);
    }

    pub fn lzp_eligible(&self) -> bool {
        self.match_model.lzp_eligible()
    }

    pub fn expected_char(&self) -> u8 {
        self.match_model.expected_char(&self.buf)
    }

    /// Probability that the LZP match/mismatch bit is 1 (byte equals the
    /// expected char), refined through the LZP SSE instance keyed by
    /// `(expected_char, match_len)` per spec.md §4.7.
    pub fn predict_lzp(&mut self) -> i32 {
        let len = self.match_model.match_len;
        let baseline = (4095 - 4095 / (len as i32 + 2)).clamp(1, 4095);
        let ctx = (self.match_model.expected_char(&self.buf) as usize) * 8
            + len_bucket(len).min(7) as usize;
        self.sse.lzp.p(baseline, ctx, &self.stretch)
    }

    pub fn update_lzp(&mut self, bit: u32) {
        self.sse.lzp.update(bit, 7);
    }

    /// Stretched probability for the bit about to be coded (nibble-tree
    /// position tracked by `c0`, the standard PAQ whole-byte bit-tree
    /// index: starts at 1, doubles and folds in each decided bit, so it
    /// stays in `1..255` for all 8 bits of a byte).
    pub fn predict_bit(&mut self) -> i32 {
        let ctx = self.mixer_context();
        self.mixer.set_context(ctx);

        for (_, m) in self.orders.iter_mut() {
            self.mixer.add(m.predict(self.c0));
        }
        for (_, m) in self.sparse.iter_mut() {
            self.mixer.add(m.predict(self.c0));
        }
        if self.cfg.models.contains(ModelSet::WORD1) {
            self.mixer.add(self.word1.predict(self.word_model.get_hash(), self.c0));
        }
        if self.cfg.models.contains(ModelSet::WORD2) {
            self.mixer
                .add(self.word2.predict(self.word_model.get_prev_hash(), self.c0));
        }
        if self.cfg.models.contains(ModelSet::WORD12) {
            self.mixer
                .add(self.word12.predict(self.word_model.get01_hash(), self.c0));
        }
        if self.cfg.models.contains(ModelSet::BRACKET) {
            self.mixer
                .add(self.bracket_hash.predict(self.bracket_model.hash(), self.c0));
        }
        if self.cfg.models.contains(ModelSet::SPECIAL_CHAR) {
            self.mixer
                .add(self.special_hash.predict(self.special_model.hash(), self.c0));
        }
        if self.cfg.models.contains(ModelSet::INTERVAL) {
            self.mixer
                .add(self.interval_hash.predict(self.interval_model.interval() as u32, self.c0));
        }
        if self.cfg.models.contains(ModelSet::INTERVAL2) {
            self.mixer.add(
                self.interval2_hash
                    .predict(self.interval_model.interval2() as u32, self.c0),
            );
        }

        let bit_pos = 31 - self.c0.leading_zeros();
        self.expected_bit_this_bit = if self.match_model.active && !self.byte_diverged {
            Some(self.match_model.expected_bit(&self.buf, bit_pos))
        } else {
            None
        };
        let match_input = match self.expected_bit_this_bit {
            Some(eb) => match_confidence(eb, self.match_model.match_len),
            None => 0,
        };
        self.mixer.add(match_input);
        // Keep the mixer's input count stable even when optional models
        // are disabled for this profile, so context weight vectors line up
        // byte to byte.
        self.mixer.add(0);

        let p = self.mixer.predict();
        let p = self.sse.normal.p(p, self.c0 as usize & 0xFF, &self.stretch);
        let general_ctx = ((self.buf.at_back(1) as usize) << 4) | ctx;
        let p = self.sse.general.p(p, general_ctx & 0xFFF, &self.stretch);
        self.last_pr = p;
        p
    }

    pub fn update_bit(&mut self, bit: u32) {
        for (_, m) in self.orders.iter_mut() {
            m.update(bit, &self.states, &self.stretch);
        }
        for (_, m) in self.sparse.iter_mut() {
            m.update(bit, &self.states, &self.stretch);
        }
        if self.cfg.models.contains(ModelSet::WORD1) {
            self.word1.update(bit, &self.states, &self.stretch);
        }
        if self.cfg.models.contains(ModelSet::WORD2) {
            self.word2.update(bit, &self.states, &self.stretch);
        }
        if self.cfg.models.contains(ModelSet::WORD12) {
            self.word12.update(bit, &self.states, &self.stretch);
        }
        if self.cfg.models.contains(ModelSet::BRACKET) {
            self.bracket_hash.update(bit, &self.states, &self.stretch);
        }
        if self.cfg.models.contains(ModelSet::SPECIAL_CHAR) {
            self.special_hash.update(bit, &self.states, &self.stretch);
        }
        if self.cfg.models.contains(ModelSet::INTERVAL) {
            self.interval_hash.update(bit, &self.states, &self.stretch);
        }
        if self.cfg.models.contains(ModelSet::INTERVAL2) {
            self.interval2_hash.update(bit, &self.states, &self.stretch);
        }
        self.mixer.update(bit, self.last_pr);
        self.sse.normal.update(bit, 7);
        self.sse.general.update(bit, 7);

        if let Some(expected) = self.expected_bit_this_bit {
            if bit != expected {
                self.byte_diverged = true;
            }
        }
        self.c0 = (self.c0 << 1) | bit;
        if self.c0 >= 256 {
            self.c0 = 1;
        }
    }

    /// Finalizes bookkeeping for a byte coded bit-by-bit (the non-LZP
    /// path) and pushes it into the shared buffer.
    pub fn end_byte(&mut self, byte: u8) {
        self.finish_common(byte, !self.byte_diverged && self.match_model.active);
    }

    /// Finalizes bookkeeping for a byte that the LZP fast path reconstructed
    /// as `expected_char` without coding any further bits.
    pub fn end_byte_lzp_match(&mut self) {
        let byte = self.match_model.expected_char(&self.buf);
        self.finish_common(byte, true);
    }

    fn finish_common(&mut self, byte: u8, matched: bool) {
        let transformed = self.reorder.forward(byte);
        self.word_model.update(transformed);
        self.bracket_model.update(transformed);
        self.special_model.update(transformed);
        self.interval_model.update(transformed);
        self.match_model.end_byte(&self.buf, matched);
        self.buf.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileConfig;

    #[test]
    fn predicts_and_updates_without_panicking() {
        let mut p = Predictor::new(ProfileConfig::simple(), 2);
        for byte in b"hello hello hello world".iter() {
            p.begin_byte();
            if p.lzp_eligible() {
                let pr = p.predict_lzp();
                assert!((1..4096).contains(&pr));
                p.update_lzp(0);
            }
            for bit_pos in 0..8 {
                let pr = p.predict_bit();
                assert!((1..4096).contains(&pr), "pr={}", pr);
                let bit = (byte >> (7 - bit_pos)) & 1;
                p.update_bit(bit as u32);
            }
            p.end_byte(*byte);
        }
    }
}
