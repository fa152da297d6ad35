//! Carry-propagating binary arithmetic coder.
//!
//! Grounded on the 7-zip-style `Range7` coder (`examples/original_source/
//! Range.hpp`): a 32-bit `range`, a 64-bit `low` wide enough to observe a
//! carry out of the top byte, and an explicit cache of pending `0xFF` bytes
//! that may all flip to `0x00` when a carry finally arrives. The teacher's
//! own `encoder.rs`/`decoder.rs` used a simpler high/low scheme with no
//! carry cache; this format's renormalization needs the cache, so this
//! module follows `Range7` instead.

use std::io::{self, Read, Write};

const TOP: u32 = 1 << 24;

pub struct RangeEncoder<W: Write> {
    low: u64,
    range: u32,
    cache: u8,
    cache_size: u64,
    out: W,
}

impl<W: Write> RangeEncoder<W> {
    pub fn new(out: W) -> Self {
        RangeEncoder {
            low: 0,
            range: 0xFFFF_FFFF,
            cache: 0xFF,
            cache_size: 1,
            out,
        }
    }

    fn shift_low(&mut self) -> io::Result<()> {
        if (self.low as u32) < 0xFF00_0000 || (self.low >> 32) != 0 {
            let carry = (self.low >> 32) as u8;
            let mut temp = self.cache;
            loop {
                self.out.write_all(&[temp.wrapping_add(carry)])?;
                temp = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = (self.low >> 24) as u8;
        }
        self.cache_size += 1;
        self.low = (self.low << 8) & 0xFFFF_FFFF;
        Ok(())
    }

    #[inline]
    fn normalize(&mut self) -> io::Result<()> {
        while self.range < TOP {
            self.shift_low()?;
            self.range <<= 8;
        }
        Ok(())
    }

    /// `p` is the probability of `bit == 1`, in `(0, 2^shift)`.
    pub fn encode(&mut self, bit: u32, p: u32, shift: u32) -> io::Result<()> {
        debug_assert!(p > 0 && p < (1 << shift));
        let mid = (self.range >> shift).wrapping_mul(p);
        if bit == 1 {
            self.range = mid;
        } else {
            self.low += mid as u64;
            self.range -= mid;
        }
        self.normalize()
    }

    /// Equiprobable single bit, used for header/direct fields.
    pub fn encode_bit_direct(&mut self, bit: u32) -> io::Result<()> {
        self.range >>= 1;
        if bit == 1 {
            self.low += self.range as u64;
        }
        self.normalize()
    }

    /// `n_bits` equiprobable bits, most-significant first.
    pub fn encode_bits_direct(&mut self, value: u32, n_bits: u32) -> io::Result<()> {
        for i in (0..n_bits).rev() {
            self.encode_bit_direct((value >> i) & 1)?;
        }
        Ok(())
    }

    /// Flushes the 5 pending bytes needed for the decoder to resynchronize.
    pub fn flush(&mut self) -> io::Result<()> {
        for _ in 0..5 {
            self.shift_low()?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub struct RangeDecoder<R: Read> {
    code: u32,
    range: u32,
    input: R,
}

impl<R: Read> RangeDecoder<R> {
    /// Reads the 5 bytes the encoder's `flush` produced at stream start: the
    /// first is the carry sentinel and is always discarded.
    pub fn new(mut input: R) -> io::Result<Self> {
        let mut skip = [0u8; 1];
        input.read_exact(&mut skip)?;
        let mut code = 0u32;
        let mut buf = [0u8; 1];
        for _ in 0..4 {
            input.read_exact(&mut buf)?;
            code = (code << 8) | buf[0] as u32;
        }
        Ok(RangeDecoder {
            code,
            range: 0xFFFF_FFFF,
            input,
        })
    }

    fn next_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        match self.input.read(&mut buf)? {
            0 => Ok(0),
            _ => Ok(buf[0]),
        }
    }

    #[inline]
    fn normalize(&mut self) -> io::Result<()> {
        while self.range < TOP {
            let b = self.next_byte()?;
            self.code = (self.code << 8) | b as u32;
            self.range <<= 8;
        }
        Ok(())
    }

    pub fn decode(&mut self, p: u32, shift: u32) -> io::Result<u32> {
        debug_assert!(p > 0 && p < (1 << shift));
        let mid = (self.range >> shift).wrapping_mul(p);
        let bit = if self.code < mid {
            self.range = mid;
            1
        } else {
            self.code -= mid;
            self.range -= mid;
            0
        };
        self.normalize()?;
        Ok(bit)
    }

    pub fn decode_bit_direct(&mut self) -> io::Result<u32> {
        self.range >>= 1;
        let bit = if self.code >= self.range {
            self.code -= self.range;
            1
        } else {
            0
        };
        self.normalize()?;
        Ok(bit)
    }

    pub fn decode_bits_direct(&mut self, n_bits: u32) -> io::Result<u32> {
        let mut value = 0u32;
        for _ in 0..n_bits {
            value = (value << 1) | self.decode_bit_direct()?;
        }
        Ok(value)
    }

    pub fn into_inner(self) -> R {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_biased_bits() {
        let bits: Vec<(u32, u32)> = (0..2000)
            .map(|i| (((i * 7) % 3 == 0) as u32, 200 + (i % 3800) as u32))
            .collect();

        let mut buf = Vec::new();
        {
            let mut enc = RangeEncoder::new(&mut buf);
            for &(bit, p) in &bits {
                enc.encode(bit, p, 12).unwrap();
            }
            enc.flush().unwrap();
        }

        let mut dec = RangeDecoder::new(buf.as_slice()).unwrap();
        for &(bit, p) in &bits {
            assert_eq!(dec.decode(p, 12).unwrap(), bit);
        }
    }

    #[test]
    fn round_trips_direct_bits() {
        let mut buf = Vec::new();
        {
            let mut enc = RangeEncoder::new(&mut buf);
            enc.encode_bits_direct(0xABCD, 16).unwrap();
            enc.flush().unwrap();
        }
        let mut dec = RangeDecoder::new(buf.as_slice()).unwrap();
        assert_eq!(dec.decode_bits_direct(16).unwrap(), 0xABCD);
    }

    #[test]
    fn handles_carry_propagation() {
        // Force a long run of near-1.0 probabilities so `low` repeatedly
        // approaches the top of the range, exercising the 0xFF cache run.
        let mut buf = Vec::new();
        {
            let mut enc = RangeEncoder::new(&mut buf);
            for _ in 0..5000 {
                enc.encode(1, 4094, 12).unwrap();
            }
            enc.encode(0, 2048, 12).unwrap();
            enc.flush().unwrap();
        }
        let mut dec = RangeDecoder::new(buf.as_slice()).unwrap();
        for _ in 0..5000 {
            assert_eq!(dec.decode(4094, 12).unwrap(), 1);
        }
        assert_eq!(dec.decode(2048, 12).unwrap(), 0);
    }
}
