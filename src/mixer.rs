//! Logistic mixer: combines per-model stretched probabilities into one
//! prediction via a per-context weighted sum, then adapts the weights
//! toward the observed bit.

use crate::logistic::{squash, Stretch};

const DOT_SHIFT: u32 = 16;
const MAX_WEIGHT_ABS: i32 = 1 << 20;
const DELTA_ROUND: i32 = 2;
const LEARN_RAMP_CAP: u8 = 63;

pub struct Mixer {
    /// `num_contexts * n_inputs` weights in 16.16 fixed point.
    weights: Vec<i32>,
    skew: Vec<i32>,
    learn: Vec<u8>,
    inputs: Vec<i32>,
    n_inputs: usize,
    ctx: usize,
    last_stretched: i32,
}

impl Mixer {
    pub fn new(n_inputs: usize, num_contexts: usize) -> Self {
        Mixer {
            weights: vec![0i32; n_inputs * num_contexts],
            skew: vec![0i32; num_contexts],
            learn: vec![0u8; num_contexts],
            inputs: Vec::with_capacity(n_inputs),
            n_inputs,
            ctx: 0,
            last_stretched: 0,
        }
    }

    /// Select the active per-bit mixer context (composite of interval bits,
    /// match-length flag, etc., per spec.md §4.5).
    #[inline]
    pub fn set_context(&mut self, ctx: usize) {
        self.ctx = ctx;
        self.inputs.clear();
    }

    /// Feed one model's stretched probability for the bit about to be coded.
    #[inline]
    pub fn add(&mut self, stretched: i32) {
        debug_assert!(self.inputs.len() < self.n_inputs, "too many mixer inputs");
        self.inputs.push(stretched);
    }

    /// Dot product of the active context's weights with the fed inputs,
    /// clamped and squashed into a coder-ready probability in `(0, 4096)`.
    pub fn predict(&mut self) -> i32 {
        let base = self.ctx * self.n_inputs;
        let mut dot: i64 = self.skew[self.ctx] as i64;
        for (i, &s) in self.inputs.iter().enumerate() {
            dot += self.weights[base + i] as i64 * s as i64;
        }
        let stretched = ((dot >> DOT_SHIFT) as i32).clamp(-2047, 2047);
        self.last_stretched = stretched;
        squash(stretched)
    }

    /// Adapt weights toward the observed `bit` (0 or 1). `pr` is the
    /// probability `predict()` returned for this bit.
    pub fn update(&mut self, bit: u32, pr: i32) {
        let target = (bit as i32) << 12;
        let error = target - pr;
        if error.abs() < DELTA_ROUND {
            return;
        }
        let base = self.ctx * self.n_inputs;
        let learn = self.learn[self.ctx] as i32 + 1;
        for (i, &s) in self.inputs.iter().enumerate() {
            let delta = (error * s * learn) >> 10;
            let w = &mut self.weights[base + i];
            *w = (*w + delta).clamp(-MAX_WEIGHT_ABS, MAX_WEIGHT_ABS);
        }
        self.skew[self.ctx] = (self.skew[self.ctx] + (error << 6)).clamp(-MAX_WEIGHT_ABS, MAX_WEIGHT_ABS);
        if self.learn[self.ctx] < LEARN_RAMP_CAP {
            self.learn[self.ctx] += 1;
        }
    }

    pub fn last_stretched(&self) -> i32 {
        self.last_stretched
    }
}

/// Convenience used by tests and by models that want a stand-alone
/// stretch/squash pair without threading a `Stretch` table through.
pub fn stretch_via(table: &Stretch, p: i32) -> i32 {
    table.stretch(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_input_learns_constant_bit() {
        let mut m = Mixer::new(1, 1);
        for _ in 0..2000 {
            m.set_context(0);
            m.add(2000);
            let p = m.predict();
            m.update(1, p);
        }
        m.set_context(0);
        m.add(2000);
        let p = m.predict();
        assert!(p > 2500, "expected mixer to learn toward 1, got p={}", p);
    }

    #[test]
    fn contexts_are_independent() {
        let mut m = Mixer::new(1, 2);
        for _ in 0..2000 {
            m.set_context(0);
            m.add(2000);
            let p = m.predict();
            m.update(1, p);

            m.set_context(1);
            m.add(2000);
            let p = m.predict();
            m.update(0, p);
        }
        m.set_context(0);
        m.add(2000);
        let p0 = m.predict();
        m.set_context(1);
        m.add(2000);
        let p1 = m.predict();
        assert!(p0 > p1);
    }
}
