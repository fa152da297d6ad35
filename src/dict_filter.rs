//! Word → 1/2/3-byte codeword dictionary transform, per spec.md §4.13.
//! No teacher equivalent exists; grounded directly on
//! `examples/original_source/Dict.hpp`'s escape-byte scheme and tiered
//! codeword length allocation.

use std::collections::HashMap;

use crate::word_counter::{classify_case, CaseClass, WordCounter};

const ESCAPE: u8 = 0xFF;
const ESCAPE_CAP_FIRST: u8 = 0xFE;
const ESCAPE_CAP_WORD: u8 = 0xFD;
const CODE_BASE: u16 = 128;

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn savings(word_len: usize, code_len: usize, count: u32) -> i64 {
    (word_len as i64 - code_len as i64) * count as i64
}

pub struct Codebook {
    words1: Vec<Vec<u8>>,
    words2: Vec<Vec<u8>>,
    words3: Vec<Vec<u8>>,
    lookup: HashMap<Vec<u8>, Vec<u8>>,
    base2: u8,
    base3: u8,
}

impl Codebook {
    /// Builds a codebook from words seen at least `min_occurrences` times:
    /// sort-and-fill by savings at each tier (spec.md §4.13 steps 1-5).
    pub fn build(counter: &WordCounter, min_occurrences: u32) -> Self {
        let mut candidates = counter.words_at_least(min_occurrences);

        candidates.sort_by_key(|(w, c)| std::cmp::Reverse(savings(w.len(), 1, *c)));
        let num1 = candidates.len().clamp(0, 120).min(candidates.len());
        let num1 = if candidates.len() < 32 { candidates.len() } else { num1.min(120) };
        let words1: Vec<Vec<u8>> = candidates.drain(..num1.min(candidates.len())).map(|(w, _)| w).collect();

        candidates.sort_by_key(|(w, c)| std::cmp::Reverse(savings(w.len(), 2, *c)));
        let num2 = candidates.len().min(128);
        let words2: Vec<Vec<u8>> = candidates.drain(..num2).map(|(w, _)| w).collect();

        candidates.sort_by_key(|(w, c)| std::cmp::Reverse(savings(w.len(), 3, *c)));
        let num3 = candidates.len().min(128 * 128);
        let words3: Vec<Vec<u8>> = candidates
            .drain(..num3)
            .filter(|(w, c)| savings(w.len(), 3, *c) > 0)
            .map(|(w, _)| w)
            .collect();

        let base2 = CODE_BASE as u8 + words1.len() as u8;
        let base3 = base2 + if words2.is_empty() { 0 } else { 1 };

        let mut lookup = HashMap::new();
        for (i, w) in words1.iter().enumerate() {
            lookup.insert(w.clone(), vec![CODE_BASE as u8 + i as u8]);
        }
        for (i, w) in words2.iter().enumerate() {
            lookup.insert(w.clone(), vec![base2, CODE_BASE as u8 + i as u8]);
        }
        for (i, w) in words3.iter().enumerate() {
            let hi = CODE_BASE as u8 + (i / 128) as u8;
            let lo = CODE_BASE as u8 + (i % 128) as u8;
            lookup.insert(w.clone(), vec![base3, hi, lo]);
        }

        Codebook {
            words1,
            words2,
            words3,
            lookup,
            base2,
            base3,
        }
    }

    pub fn num_codes(&self) -> usize {
        self.words1.len() + self.words2.len() + self.words3.len()
    }

    /// All codebook words in tier order, for dumping to a `-out-dict` file.
    pub fn words(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.words1.iter().chain(self.words2.iter()).chain(self.words3.iter())
    }

    /// Header(7) + 4-byte length prefix + null-terminated words, per
    /// spec.md §4.13 step 6.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.push(ESCAPE);
        body.push(ESCAPE_CAP_FIRST);
        body.push(ESCAPE_CAP_WORD);
        body.push(self.words1.len() as u8);
        body.push(if self.words2.is_empty() { 0 } else { 1 });
        body.push(if self.words3.is_empty() { 0 } else { 1 });
        body.push(self.num_codes() as u8);
        for w in self.words1.iter().chain(self.words2.iter()).chain(self.words3.iter()) {
            body.extend_from_slice(w);
            body.push(0);
        }

        let mut out = Vec::with_capacity(4 + body.len());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// Returns the decoded codebook plus how many bytes of `data` it
    /// consumed, so the caller can continue parsing right after it.
    pub fn deserialize(data: &[u8]) -> Option<(Self, usize)> {
        if data.len() < 4 {
            return None;
        }
        let len = u32::from_le_bytes(data[0..4].try_into().unwrap()) as usize;
        let body = data.get(4..4 + len)?;
        if body.len() < 7 {
            return None;
        }
        let num1 = body[3] as usize;
        let has2 = body[4] != 0;
        let has3 = body[5] != 0;
        let mut words = Vec::new();
        let mut cursor = 7;
        while cursor < body.len() {
            let end = body[cursor..].iter().position(|&b| b == 0)? + cursor;
            words.push(body[cursor..end].to_vec());
            cursor = end + 1;
        }
        let words1: Vec<Vec<u8>> = words.drain(..num1.min(words.len())).collect();
        let num2 = if has2 { words.len().min(128) } else { 0 };
        let words2: Vec<Vec<u8>> = words.drain(..num2).collect();
        let num3 = if has3 { words.len() } else { 0 };
        let words3: Vec<Vec<u8>> = words.drain(..num3).collect();

        let base2 = CODE_BASE as u8 + words1.len() as u8;
        let base3 = base2 + if words2.is_empty() { 0 } else { 1 };
        let mut lookup = HashMap::new();
        for (i, w) in words1.iter().enumerate() {
            lookup.insert(w.clone(), vec![CODE_BASE as u8 + i as u8]);
        }
        for (i, w) in words2.iter().enumerate() {
            lookup.insert(w.clone(), vec![base2, CODE_BASE as u8 + i as u8]);
        }
        for (i, w) in words3.iter().enumerate() {
            let hi = CODE_BASE as u8 + (i / 128) as u8;
            let lo = CODE_BASE as u8 + (i % 128) as u8;
            lookup.insert(w.clone(), vec![base3, hi, lo]);
        }

        Some((
            Codebook {
                words1,
                words2,
                words3,
                lookup,
                base2,
                base3,
            },
            4 + len,
        ))
    }
}

pub struct DictFilter {
    codebook: Codebook,
}

impl DictFilter {
    pub fn new(codebook: Codebook) -> Self {
        DictFilter { codebook }
    }

    fn needs_escape(&self, b: u8) -> bool {
        b >= CODE_BASE as u8 || b == ESCAPE || b == ESCAPE_CAP_FIRST || b == ESCAPE_CAP_WORD
    }

    /// Prepends the codebook the caller will need to reverse this stream —
    /// without it, a decoder has no way to recover which words the
    /// codewords stand for (spec.md §4.13 step 6).
    pub fn forward(&self, input: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(&self.codebook.serialize());
        let mut i = 0;
        while i < input.len() {
            let b = input[i];
            if is_word_byte(b) {
                let start = i;
                while i < input.len() && is_word_byte(input[i]) && i - start < 256 {
                    i += 1;
                }
                self.encode_word(&input[start..i], out);
            } else {
                if self.needs_escape(b) {
                    out.push(ESCAPE);
                }
                out.push(b);
                i += 1;
            }
        }
    }

    fn encode_word(&self, word: &[u8], out: &mut Vec<u8>) {
        let case = classify_case(word);
        let lower: Vec<u8> = word.iter().map(u8::to_ascii_lowercase).collect();
        if let Some(code) = self.codebook.lookup.get(&lower) {
            match case {
                CaseClass::FirstCap => out.push(ESCAPE_CAP_FIRST),
                CaseClass::AllCap => out.push(ESCAPE_CAP_WORD),
                CaseClass::None => {}
            }
            out.extend_from_slice(code);
        } else {
            for &b in word {
                if self.needs_escape(b) {
                    out.push(ESCAPE);
                }
                out.push(b);
            }
        }
    }

    /// Reads the codebook `forward` embedded at the start of `input`
    /// before reversing the codeword stream — `self.codebook` is not used
    /// here, since a decoder builds `DictFilter` with no word counts of
    /// its own (see `Filter::build`'s `counter: None` path).
    pub fn reverse(&self, input: &[u8], out: &mut Vec<u8>) -> Result<(), crate::error::CmpressError> {
        let (codebook, consumed) = Codebook::deserialize(input).ok_or_else(parse_error)?;
        let input = &input[consumed..];
        let mut i = 0;
        while i < input.len() {
            let b = input[i];
            if b == ESCAPE {
                let lit = *input
                    .get(i + 1)
                    .ok_or_else(|| parse_error())?;
                out.push(lit);
                i += 2;
                continue;
            }
            let mut case = CaseClass::None;
            let mut j = i;
            if b == ESCAPE_CAP_FIRST {
                case = CaseClass::FirstCap;
                j += 1;
            } else if b == ESCAPE_CAP_WORD {
                case = CaseClass::AllCap;
                j += 1;
            }
            let code_byte = *input.get(j).ok_or_else(parse_error)?;
            if code_byte < CODE_BASE as u8 {
                out.push(code_byte);
                i = j + 1;
                continue;
            }
            let word = decode_codeword(&codebook, input, &mut j, code_byte)?;
            apply_case(&word, case, out);
            i = j;
        }
        Ok(())
    }
}

fn decode_codeword(codebook: &Codebook, input: &[u8], j: &mut usize, code_byte: u8) -> Result<Vec<u8>, crate::error::CmpressError> {
    let idx1 = code_byte as usize - CODE_BASE as usize;
    if idx1 < codebook.words1.len() {
        *j += 1;
        return Ok(codebook.words1[idx1].clone());
    }
    if code_byte == codebook.base2 {
        let lo = *input.get(*j + 1).ok_or_else(parse_error)?;
        let idx = lo as usize - CODE_BASE as usize;
        let word = codebook.words2.get(idx).cloned().ok_or_else(parse_error)?;
        *j += 2;
        return Ok(word);
    }
    if code_byte == codebook.base3 {
        let hi = *input.get(*j + 1).ok_or_else(parse_error)?;
        let lo = *input.get(*j + 2).ok_or_else(parse_error)?;
        let idx = (hi as usize - CODE_BASE as usize) * 128 + (lo as usize - CODE_BASE as usize);
        let word = codebook.words3.get(idx).cloned().ok_or_else(parse_error)?;
        *j += 3;
        return Ok(word);
    }
    Err(parse_error())
}

fn parse_error() -> crate::error::CmpressError {
    crate::error::CmpressError::FilterParseError { block_index: 0 }
}

fn apply_case(word: &[u8], case: CaseClass, out: &mut Vec<u8>) {
    match case {
        CaseClass::None => out.extend_from_slice(word),
        CaseClass::FirstCap => {
            for (i, &b) in word.iter().enumerate() {
                out.push(if i == 0 { b.to_ascii_uppercase() } else { b });
            }
        }
        CaseClass::AllCap => {
            for &b in word {
                out.push(b.to_ascii_uppercase());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_filter(text: &[u8]) -> DictFilter {
        let mut counter = WordCounter::new(1 << 12);
        let mut start = None;
        for (i, &b) in text.iter().enumerate() {
            if is_word_byte(b) {
                if start.is_none() {
                    start = Some(i);
                }
            } else if let Some(s) = start.take() {
                for _ in 0..10 {
                    counter.record(&text[s..i]);
                }
            }
        }
        DictFilter::new(Codebook::build(&counter, 1))
    }

    #[test]
    fn round_trips_words_and_case() {
        let text = b"Banana banana BANANA split apples!".to_vec();
        let filter = build_filter(&text);
        let mut encoded = Vec::new();
        filter.forward(&text, &mut encoded);
        let mut decoded = Vec::new();
        filter.reverse(&encoded, &mut decoded).unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn escapes_high_bytes() {
        let mut counter = WordCounter::new(16);
        counter.record(b"word");
        let filter = DictFilter::new(Codebook::build(&counter, 1));
        let data = vec![0xFFu8, 0x80, b'!'];
        let mut encoded = Vec::new();
        filter.forward(&data, &mut encoded);
        let mut decoded = Vec::new();
        filter.reverse(&encoded, &mut decoded).unwrap();
        assert_eq!(decoded, data);
    }
}
