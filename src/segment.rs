//! Segment/solid-block data model, per spec.md §3.
//!
//! Grounded on `examples/aufdj-prisirv/src/filedata.rs`'s `seg_beg`/
//! `seg_end` shape, generalized from "one file may span two blocks" to an
//! explicit ordered list of ranges so a file can appear fragmented across
//! any number of blocks.

use crate::filter::FilterKind;
use crate::profile::Profile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentRange {
    pub offset: u64,
    pub length: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSegments {
    pub file_index: usize,
    pub base_offset: u64,
    pub total_size: u64,
    pub ranges: Vec<SegmentRange>,
}

impl FileSegments {
    pub fn new(file_index: usize, base_offset: u64, total_size: u64) -> Self {
        FileSegments {
            file_index,
            base_offset,
            total_size,
            ranges: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    pub mem_level: u8,
    /// `0` = range-coded with the profile's model bank, `1` = stored
    /// verbatim (`-store`/`-t0`-equivalent passthrough).
    pub compressor_variant: u8,
    pub lzp_enabled: bool,
    pub filter_type: FilterKind,
    pub profile: Profile,
}

#[derive(Clone, Debug)]
pub struct SolidBlock {
    pub algo: AlgorithmDescriptor,
    pub segments: Vec<FileSegments>,
    pub total_size: u64,
}

impl SolidBlock {
    pub fn new(algo: AlgorithmDescriptor) -> Self {
        SolidBlock {
            algo,
            segments: Vec::new(),
            total_size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_accumulate_total_size() {
        let mut seg = FileSegments::new(0, 0, 10);
        seg.ranges.push(SegmentRange { offset: 0, length: 6 });
        seg.ranges.push(SegmentRange { offset: 6, length: 4 });
        let sum: u64 = seg.ranges.iter().map(|r| r.length).sum();
        assert_eq!(sum, seg.total_size);
    }
}
