//! Streaming content classification: partitions a byte stream into
//! Text/Binary/Wave16 blocks.
//!
//! Grounded on `examples/original_source/Detector.hpp`'s explicit
//! state-machine shape (a `saved_blocks` queue for blocks speculatively
//! emitted while still inside an outer scan, per spec.md §9's "coroutine /
//! generator" design note) — there's no teacher equivalent, so this is new
//! code following that shape, with the heuristics of spec.md §4.12.

use std::collections::VecDeque;

use crate::profile::Profile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectedBlock {
    pub profile: Profile,
    pub offset: usize,
    pub length: usize,
}

#[inline]
fn is_forbidden_control(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F)
}

const MAX_LOOKAHEAD: usize = 256 * 1024;

pub struct Detector<'a> {
    data: &'a [u8],
    pos: usize,
    saved_blocks: VecDeque<DetectedBlock>,
}

impl<'a> Detector<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Detector {
            data,
            pos: 0,
            saved_blocks: VecDeque::new(),
        }
    }

    /// Pops from `saved_blocks` when a previous pass queued speculative
    /// blocks (Wave16's header/data split); otherwise performs one
    /// detection pass from the current position.
    pub fn next_block(&mut self) -> Option<DetectedBlock> {
        if let Some(b) = self.saved_blocks.pop_front() {
            return Some(b);
        }
        if self.pos >= self.data.len() {
            return None;
        }

        if let Some(lead_binary) = self.try_wave16() {
            self.pos = lead_binary.offset + lead_binary.length;
            return Some(lead_binary);
        }
        if let Some(text) = self.try_text() {
            self.pos = text.offset + text.length;
            return Some(text);
        }

        let start = self.pos;
        let mut end = start + 1;
        while end < self.data.len() && !self.looks_like_boundary(end) {
            end += 1;
        }
        self.pos = end;
        Some(DetectedBlock {
            profile: Profile::Binary,
            offset: start,
            length: end - start,
        })
    }

    fn looks_like_boundary(&self, at: usize) -> bool {
        self.data[at..].starts_with(b"RIFF") || self.text_run_len(at) > 64
    }

    /// Detects `RIFF...WAVE...fmt ` with `audio_format == 1`,
    /// `num_channels == 2`, followed by a `data` chunk. On a hit, queues
    /// the Wave16 data range and returns the bytes before it (the RIFF/fmt
    /// header) as a Binary block, so the header itself still gets coded.
    fn try_wave16(&mut self) -> Option<DetectedBlock> {
        let start = self.pos;
        if start + 12 > self.data.len() || &self.data[start..start + 4] != b"RIFF" {
            return None;
        }
        if &self.data[start + 8..start + 12] != b"WAVE" {
            return None;
        }

        let mut cursor = start + 12;
        let mut audio_format = None;
        let mut channels = None;
        let mut data_chunk = None;

        while cursor + 8 <= self.data.len() {
            let id = &self.data[cursor..cursor + 4];
            let size =
                u32::from_le_bytes(self.data[cursor + 4..cursor + 8].try_into().unwrap()) as usize;
            let body = cursor + 8;
            if body + size > self.data.len() {
                break;
            }
            if id == b"fmt " && size >= 4 {
                audio_format = Some(u16::from_le_bytes(self.data[body..body + 2].try_into().unwrap()));
                channels = Some(u16::from_le_bytes(
                    self.data[body + 2..body + 4].try_into().unwrap(),
                ));
            } else if id == b"data" {
                data_chunk = Some((body, size));
                break;
            }
            cursor = body + size + (size & 1);
        }

        if audio_format != Some(1) || channels != Some(2) {
            return None;
        }
        let (data_offset, data_len) = data_chunk?;

        self.saved_blocks.push_back(DetectedBlock {
            profile: Profile::Wave16,
            offset: data_offset,
            length: data_len,
        });
        let header_len = data_offset - start;
        if header_len == 0 {
            // Nothing to emit before the data chunk; hand the Wave16 block
            // straight back instead of an empty Binary lead-in.
            return self.saved_blocks.pop_front();
        }
        Some(DetectedBlock {
            profile: Profile::Binary,
            offset: start,
            length: header_len,
        })
    }

    fn text_run_len(&self, start: usize) -> usize {
        let mut len = 0usize;
        while start + len < self.data.len() && len < MAX_LOOKAHEAD {
            if is_forbidden_control(self.data[start + len]) {
                break;
            }
            len += 1;
        }
        match std::str::from_utf8(&self.data[start..start + len]) {
            Ok(_) => len,
            Err(e) => e.valid_up_to(),
        }
    }

    fn try_text(&mut self) -> Option<DetectedBlock> {
        let start = self.pos;
        let valid_len = self.text_run_len(start);
        if valid_len == 0 {
            return None;
        }
        let slice = &self.data[start..start + valid_len];
        let space_count = slice.iter().filter(|&&b| b == b' ').count();
        let score = text_score(slice);

        if valid_len > 64 && space_count * 100 > valid_len && score > valid_len {
            Some(DetectedBlock {
                profile: Profile::Text,
                offset: start,
                length: valid_len,
            })
        } else {
            None
        }
    }
}

/// Rewards word-character runs (3..31 letters) and short digit runs
/// (1..12), penalizes adjacent non-space/non-digit duplicate bytes.
fn text_score(slice: &[u8]) -> usize {
    let mut score = 0isize;
    let mut i = 0;
    let mut prev_punct: Option<u8> = None;

    while i < slice.len() {
        let b = slice[i];
        if b.is_ascii_alphabetic() {
            let start = i;
            while i < slice.len() && slice[i].is_ascii_alphabetic() {
                i += 1;
            }
            let run = i - start;
            if (3..=31).contains(&run) {
                score += run as isize;
            }
            prev_punct = None;
        } else if b.is_ascii_digit() {
            let start = i;
            while i < slice.len() && slice[i].is_ascii_digit() {
                i += 1;
            }
            let run = i - start;
            if (1..=12).contains(&run) {
                score += run as isize;
            }
            prev_punct = None;
        } else {
            if b != b' ' {
                if prev_punct == Some(b) {
                    score -= 1;
                }
                prev_punct = Some(b);
            } else {
                prev_punct = None;
            }
            i += 1;
        }
    }
    score.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_plain_text() {
        let text = "the quick brown fox jumps over the lazy dog many times today ok.".repeat(2);
        let mut d = Detector::new(text.as_bytes());
        let block = d.next_block().unwrap();
        assert_eq!(block.profile, Profile::Text);
        assert_eq!(block.length, text.len());
    }

    #[test]
    fn classifies_random_bytes_as_binary() {
        let data: Vec<u8> = (0..512u32).map(|i| (i * 37 % 256) as u8).collect();
        let mut d = Detector::new(&data);
        let mut total = 0;
        while let Some(b) = d.next_block() {
            assert_eq!(b.profile, Profile::Binary);
            total += b.length;
        }
        assert_eq!(total, data.len());
    }

    #[test]
    fn detects_wave16_pcm_stereo() {
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&36u32.to_le_bytes()); // placeholder size
        data.extend_from_slice(b"WAVE");
        data.extend_from_slice(b"fmt ");
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes()); // PCM
        data.extend_from_slice(&2u16.to_le_bytes()); // stereo
        data.extend_from_slice(&44100u32.to_le_bytes());
        data.extend_from_slice(&176400u32.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&16u16.to_le_bytes());
        data.extend_from_slice(b"data");
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);

        let mut d = Detector::new(&data);
        let first = d.next_block().unwrap();
        assert_eq!(first.profile, Profile::Binary);
        let second = d.next_block().unwrap();
        assert_eq!(second.profile, Profile::Wave16);
        assert_eq!(second.length, 8);
    }
}
