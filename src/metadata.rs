//! Archive metadata: block table + prefix-shared file list, per spec.md
//! §4.15's wire layout.
//!
//! Grounded on `examples/aufdj-prisirv/src/metadata.rs`'s overall shape
//! (one struct describing the whole archive's block/file layout) and
//! `block.rs`'s header read/write pattern, adapted from that teacher's
//! fixed-width fields to the LEB128 varints and prefix-shared names §4.15
//! specifies.

use crate::buffered_io::{leb128_decode, leb128_encode};
use crate::error::CmpressError;
use crate::filter::FilterKind;
use crate::profile::Profile;
use crate::segment::{AlgorithmDescriptor, FileSegments, SegmentRange, SolidBlock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Attributes(pub u8);

impl Attributes {
    pub const DIR: Attributes = Attributes(1 << 0);
    pub const READ: Attributes = Attributes(1 << 1);
    pub const WRITE: Attributes = Attributes(1 << 2);
    pub const EXEC: Attributes = Attributes(1 << 3);
    pub const SYSTEM: Attributes = Attributes(1 << 4);
    pub const HIDDEN: Attributes = Attributes(1 << 5);

    pub fn contains(self, other: Attributes) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Attributes {
    type Output = Attributes;
    fn bitor(self, rhs: Attributes) -> Attributes {
        Attributes(self.0 | rhs.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub attributes: Attributes,
}

#[derive(Clone, Debug, Default)]
pub struct Metadata {
    pub blocks: Vec<SolidBlock>,
    pub files: Vec<FileEntry>,
}

fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

impl Metadata {
    pub fn new() -> Self {
        Metadata::default()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        leb128_encode(self.blocks.len() as u64, &mut out);
        for block in &self.blocks {
            out.push(block.algo.mem_level);
            out.push(block.algo.compressor_variant);
            out.push(block.algo.lzp_enabled as u8);
            out.push(block.algo.filter_type.to_wire());
            out.push(block.algo.profile.to_wire());
            leb128_encode(block.segments.len() as u64, &mut out);
            for seg in &block.segments {
                leb128_encode(seg.file_index as u64, &mut out);
                leb128_encode(seg.base_offset, &mut out);
                leb128_encode(seg.ranges.len() as u64, &mut out);
                for r in &seg.ranges {
                    leb128_encode(r.length, &mut out);
                }
                let mut prev_end = 0u64;
                for r in &seg.ranges {
                    let delta = r.offset - prev_end;
                    leb128_encode(delta, &mut out);
                    prev_end = r.offset + r.length;
                }
            }
        }

        leb128_encode(self.files.len() as u64, &mut out);
        let mut prev_name = String::new();
        for file in &self.files {
            let shared = shared_prefix_len(&prev_name, &file.name);
            out.extend_from_slice(file.name[shared..].as_bytes());
            out.push(0);
            prev_name = file.name.clone();
        }
        let mut prev_name = String::new();
        for file in &self.files {
            let shared = shared_prefix_len(&prev_name, &file.name);
            leb128_encode(shared as u64, &mut out);
            prev_name = file.name.clone();
        }
        for file in &self.files {
            out.push(file.attributes.0);
        }
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, CmpressError> {
        let mut iter = data.iter().copied().peekable();
        let corrupt = |reason: &str| CmpressError::CorruptMetadata { reason: reason.to_string() };

        let num_blocks = leb128_decode(&mut iter)?;
        if num_blocks > 10_000_000 {
            return Err(corrupt("implausible block count"));
        }
        let mut blocks = Vec::with_capacity(num_blocks as usize);
        for _ in 0..num_blocks {
            let mem_level = iter.next().ok_or_else(|| corrupt("truncated algorithm descriptor"))?;
            let compressor_variant = iter.next().ok_or_else(|| corrupt("truncated algorithm descriptor"))?;
            let lzp_enabled = iter.next().ok_or_else(|| corrupt("truncated algorithm descriptor"))? != 0;
            let filter_type = FilterKind::from_wire(iter.next().ok_or_else(|| corrupt("truncated algorithm descriptor"))?);
            let profile = Profile::from_wire(iter.next().ok_or_else(|| corrupt("truncated algorithm descriptor"))?);
            let algo = AlgorithmDescriptor {
                mem_level,
                compressor_variant,
                lzp_enabled,
                filter_type,
                profile,
            };
            let mut block = SolidBlock::new(algo);

            let num_segments = leb128_decode(&mut iter)?;
            if num_segments > 10_000_000 {
                return Err(corrupt("implausible segment count"));
            }
            for _ in 0..num_segments {
                let file_index = leb128_decode(&mut iter)? as usize;
                let base_offset = leb128_decode(&mut iter)?;
                let num_ranges = leb128_decode(&mut iter)?;
                if num_ranges > 10_000_000 {
                    return Err(corrupt("implausible range count"));
                }
                let mut seg = FileSegments::new(file_index, base_offset, 0);
                let mut lengths = Vec::with_capacity(num_ranges as usize);
                for _ in 0..num_ranges {
                    lengths.push(leb128_decode(&mut iter)?);
                }
                let mut prev_end = 0u64;
                for length in lengths {
                    let delta = leb128_decode(&mut iter)?;
                    let offset = prev_end + delta;
                    seg.ranges.push(SegmentRange { offset, length });
                    prev_end = offset + length;
                    seg.total_size += length;
                }
                block.total_size += seg.total_size;
                block.segments.push(seg);
            }
            blocks.push(block);
        }

        let num_files = leb128_decode(&mut iter)?;
        if num_files > 10_000_000 {
            return Err(corrupt("implausible file count"));
        }
        let mut suffixes = Vec::with_capacity(num_files as usize);
        for _ in 0..num_files {
            let mut bytes = Vec::new();
            loop {
                let b = iter.next().ok_or_else(|| corrupt("truncated file name"))?;
                if b == 0 {
                    break;
                }
                bytes.push(b);
            }
            suffixes.push(String::from_utf8(bytes).map_err(|_| corrupt("file name is not utf-8"))?);
        }
        let mut shared_lens = Vec::with_capacity(num_files as usize);
        for _ in 0..num_files {
            shared_lens.push(leb128_decode(&mut iter)? as usize);
        }
        let mut names = Vec::with_capacity(num_files as usize);
        let mut prev_name = String::new();
        for (suffix, shared) in suffixes.into_iter().zip(shared_lens) {
            if shared > prev_name.len() {
                return Err(corrupt("shared_prefix_len exceeds previous name length"));
            }
            let mut name = prev_name[..shared].to_string();
            name.push_str(&suffix);
            prev_name = name.clone();
            names.push(name);
        }
        let mut files = Vec::with_capacity(num_files as usize);
        for name in names {
            let attr = iter.next().ok_or_else(|| corrupt("truncated attribute list"))?;
            files.push(FileEntry {
                name,
                attributes: Attributes(attr),
            });
        }

        Ok(Metadata { blocks, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::AlgorithmDescriptor;

    fn sample() -> Metadata {
        let algo = AlgorithmDescriptor {
            mem_level: 2,
            compressor_variant: 0,
            lzp_enabled: true,
            filter_type: FilterKind::Dict,
            profile: Profile::Text,
        };
        let mut block = SolidBlock::new(algo);
        let mut seg = FileSegments::new(0, 0, 0);
        seg.ranges.push(SegmentRange { offset: 0, length: 6 });
        seg.total_size = 6;
        block.segments.push(seg);
        block.total_size = 6;

        Metadata {
            blocks: vec![block],
            files: vec![
                FileEntry { name: "aaabbb".into(), attributes: Attributes::READ },
                FileEntry { name: "aaaccc".into(), attributes: Attributes::READ | Attributes::WRITE },
            ],
        }
    }

    #[test]
    fn round_trips_blocks_and_files() {
        let meta = sample();
        let encoded = meta.encode();
        let decoded = Metadata::decode(&encoded).unwrap();
        assert_eq!(decoded.files.len(), 2);
        assert_eq!(decoded.files[0].name, "aaabbb");
        assert_eq!(decoded.files[1].name, "aaaccc");
        assert_eq!(decoded.blocks[0].segments[0].ranges[0].length, 6);
    }

    #[test]
    fn shares_prefix_between_similar_names() {
        let meta = sample();
        assert_eq!(shared_prefix_len(&meta.files[0].name, &meta.files[1].name), 3);
    }

    #[test]
    fn rejects_corrupt_leb128() {
        let bad = vec![0x80u8, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80];
        assert!(Metadata::decode(&bad).is_err());
    }
}
