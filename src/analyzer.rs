//! Runs the detector over each enumerated file and feeds text blocks into
//! a shared word-frequency table for dictionary codebook generation.

use crate::detector::{DetectedBlock, Detector};
use crate::profile::Profile;
use crate::word_counter::WordCounter;

pub struct Analyzer {
    pub word_counter: WordCounter,
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            word_counter: WordCounter::new(1 << 16),
        }
    }

    /// Classifies `data` into blocks and records every word found in its
    /// Text blocks into the shared counter.
    pub fn analyze(&mut self, data: &[u8]) -> Vec<DetectedBlock> {
        let mut detector = Detector::new(data);
        let mut blocks = Vec::new();
        while let Some(block) = detector.next_block() {
            if block.profile == Profile::Text {
                self.feed_words(&data[block.offset..block.offset + block.length]);
            }
            blocks.push(block);
        }
        blocks
    }

    /// Feeds an externally supplied word list (e.g. a `-dict` file) into
    /// the shared counter, the same way a Text block's words are recorded.
    pub fn seed_words(&mut self, text: &[u8]) {
        self.feed_words(text);
    }

    fn feed_words(&mut self, text: &[u8]) {
        let mut start = None;
        for (i, &b) in text.iter().enumerate() {
            if b.is_ascii_alphabetic() {
                if start.is_none() {
                    start = Some(i);
                }
            } else if let Some(s) = start.take() {
                self.word_counter.record(&text[s..i]);
            }
        }
        if let Some(s) = start {
            self.word_counter.record(&text[s..]);
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_blocks_covering_whole_input() {
        let mut a = Analyzer::new();
        let data = b"some ordinary ascii text that is long enough to qualify as text content here";
        let blocks = a.analyze(data);
        let total: usize = blocks.iter().map(|b| b.length).sum();
        assert_eq!(total, data.len());
    }

    #[test]
    fn records_words_from_text_blocks() {
        let mut a = Analyzer::new();
        let data = "banana banana banana split split split split".repeat(1);
        a.analyze(data.as_bytes());
        let words = a.word_counter.words_at_least(1);
        assert!(words.iter().any(|(w, _)| w == b"banana"));
    }
}
