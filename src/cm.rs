//! Drives `Predictor` and the range coder together over a byte stream:
//! the encode/decode halves of spec.md §4.11's per-byte bit loop, including
//! the LZP fast path (§4.7 step 4) that can finish a byte after a single
//! bit.

use std::io;

use crate::predictor::Predictor;
use crate::profile::ProfileConfig;
use crate::range_coder::{RangeDecoder, RangeEncoder};

pub fn compress(data: &[u8], cfg: ProfileConfig, mem_level: u8) -> io::Result<Vec<u8>> {
    let mut predictor = Predictor::new(cfg, mem_level);
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    {
        let mut enc = RangeEncoder::new(&mut out);
        for &byte in data {
            predictor.begin_byte();
            if predictor.lzp_eligible() {
                let p = predictor.predict_lzp();
                let bit = (byte == predictor.expected_char()) as u32;
                enc.encode(bit, p as u32, 12)?;
                predictor.update_lzp(bit);
                if bit == 1 {
                    predictor.end_byte_lzp_match();
                    continue;
                }
            }
            for bit_pos in 0..8 {
                let p = predictor.predict_bit();
                let bit = ((byte >> (7 - bit_pos)) & 1) as u32;
                enc.encode(bit, p as u32, 12)?;
                predictor.update_bit(bit);
            }
            predictor.end_byte(byte);
        }
        enc.flush()?;
    }
    Ok(out)
}

/// `len` is the number of decoded bytes to produce; callers already know it
/// from the archive's stored segment/block lengths, per spec.md §4.11's
/// termination rule.
pub fn decompress(data: &[u8], len: usize, cfg: ProfileConfig, mem_level: u8) -> io::Result<Vec<u8>> {
    let mut predictor = Predictor::new(cfg, mem_level);
    let mut dec = RangeDecoder::new(data)?;
    let mut out = Vec::with_capacity(len);

    for _ in 0..len {
        predictor.begin_byte();
        if predictor.lzp_eligible() {
            let p = predictor.predict_lzp();
            let bit = dec.decode(p as u32, 12)?;
            predictor.update_lzp(bit);
            if bit == 1 {
                let byte = predictor.expected_char();
                predictor.end_byte_lzp_match();
                out.push(byte);
                continue;
            }
        }
        let mut byte = 0u8;
        for _ in 0..8 {
            let p = predictor.predict_bit();
            let bit = dec.decode(p as u32, 12)?;
            predictor.update_bit(bit);
            byte = (byte << 1) | bit as u8;
        }
        predictor.end_byte(byte);
        out.push(byte);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8], cfg: ProfileConfig) {
        let compressed = compress(data, cfg, 2).unwrap();
        let decompressed = decompress(&compressed, data.len(), cfg, 2).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn empty_input_round_trips() {
        round_trip(b"", ProfileConfig::simple());
    }

    #[test]
    fn repetitive_text_round_trips() {
        round_trip(
            b"the quick brown fox jumps over the lazy dog. the quick brown fox.",
            ProfileConfig::text(),
        );
    }

    #[test]
    fn binary_bytes_round_trip() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        round_trip(&data, ProfileConfig::binary());
    }

    #[test]
    fn zeros_round_trip_and_shrink() {
        let data = vec![0u8; 1 << 16];
        let compressed = compress(&data, ProfileConfig::binary(), 2).unwrap();
        assert!(compressed.len() < data.len() / 4);
        let decompressed = decompress(&compressed, data.len(), ProfileConfig::binary(), 2).unwrap();
        assert_eq!(decompressed, data);
    }
}
