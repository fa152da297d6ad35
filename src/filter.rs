//! Tagged-variant filter dispatch, per spec.md §9 Design Notes: filters are
//! selected once per block, not polymorphic inside the per-bit hot path.

use crate::dict_filter::{Codebook, DictFilter};
use crate::error::CmpressError;
use crate::word_counter::WordCounter;
use crate::x86_filter::X86Filter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    None,
    Dict,
    X86,
}

impl FilterKind {
    pub fn to_wire(self) -> u8 {
        match self {
            FilterKind::None => 0,
            FilterKind::Dict => 1,
            FilterKind::X86 => 2,
        }
    }

    pub fn from_wire(b: u8) -> Self {
        match b {
            1 => FilterKind::Dict,
            2 => FilterKind::X86,
            _ => FilterKind::None,
        }
    }
}

pub enum Filter {
    None,
    Dict(DictFilter),
    X86(X86Filter),
}

impl Filter {
    pub fn build(kind: FilterKind, counter: Option<&WordCounter>, min_occurrences: u32) -> Self {
        match kind {
            FilterKind::None => Filter::None,
            FilterKind::Dict => {
                let codebook = match counter {
                    Some(c) => Codebook::build(c, min_occurrences),
                    None => Codebook::build(&WordCounter::new(16), min_occurrences),
                };
                Filter::Dict(DictFilter::new(codebook))
            }
            FilterKind::X86 => Filter::X86(X86Filter::new()),
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::None => FilterKind::None,
            Filter::Dict(_) => FilterKind::Dict,
            Filter::X86(_) => FilterKind::X86,
        }
    }

    pub fn forward(&mut self, input: &[u8], out: &mut Vec<u8>) {
        match self {
            Filter::None => out.extend_from_slice(input),
            Filter::Dict(f) => f.forward(input, out),
            Filter::X86(f) => f.forward(input, out),
        }
    }

    pub fn reverse(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CmpressError> {
        match self {
            Filter::None => {
                out.extend_from_slice(input);
                Ok(())
            }
            Filter::Dict(f) => f.reverse(input, out),
            Filter::X86(f) => f.reverse(input, out),
        }
    }

    /// Rough byte-frequency profile of the filter's own alphabet use, for
    /// diagnostics/verbose reporting — not part of the wire format.
    pub fn frequencies(&self) -> [u32; 256] {
        let mut freq = [0u32; 256];
        if let Filter::X86(_) = self {
            freq[0xE8] = 1;
            freq[0xE9] = 1;
        }
        freq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_filter_is_identity() {
        let mut f = Filter::build(FilterKind::None, None, 8);
        let data = b"arbitrary bytes \xff\x00".to_vec();
        let mut encoded = Vec::new();
        f.forward(&data, &mut encoded);
        let mut decoded = Vec::new();
        f.reverse(&encoded, &mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn wire_kind_round_trips() {
        for k in [FilterKind::None, FilterKind::Dict, FilterKind::X86] {
            assert_eq!(FilterKind::from_wire(k.to_wire()), k);
        }
    }
}
