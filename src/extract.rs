//! Archive disassembly: the `d`/decompress, `l`/list, and `-test`/verify
//! pipelines, spec.md §3, §4.15, and (for verify) SPEC_FULL.md §4.20.
//!
//! Grounded on `examples/aufdj-prisirv/src/extract.rs`'s "read header,
//! decode metadata, walk blocks, scatter bytes to output files" shape,
//! adapted to this format's explicit filtered/compressed length pair (see
//! `archive.rs`'s header comment) and per-block filter reversal.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::buffered_io::leb128_decode;
use crate::constant::{ARCHIVE_MAGIC, ARCHIVE_MAJOR, ARCHIVE_MINOR, METADATA_SENTINEL};
use crate::error::CmpressError;
use crate::filter::Filter;
use crate::metadata::Metadata;
use crate::profile::ProfileConfig;

#[derive(Debug)]
pub struct ParsedArchive {
    pub metadata: Metadata,
    pub files: Vec<Vec<u8>>,
}

struct Header {
    end: usize,
    meta_mem_level: u8,
}

fn read_header(data: &[u8], path: &std::path::Path) -> Result<Header, CmpressError> {
    if data.len() < 15 || &data[0..10] != ARCHIVE_MAGIC {
        return Err(CmpressError::BadMagic { path: path.to_path_buf() });
    }
    let major = u16::from_le_bytes([data[10], data[11]]);
    let minor = u16::from_le_bytes([data[12], data[13]]);
    if major != ARCHIVE_MAJOR || minor > ARCHIVE_MINOR {
        return Err(CmpressError::VersionMismatch { major, minor });
    }
    Ok(Header { end: 15, meta_mem_level: data[14] })
}

/// Decodes the full archive into its metadata and reconstructed file
/// contents, without touching the filesystem — shared by `d`, `l`, and the
/// in-memory half of `-test`.
pub fn parse(data: &[u8], path: &std::path::Path) -> Result<ParsedArchive, CmpressError> {
    let header = read_header(data, path)?;
    let mut pos = header.end;
    let corrupt = |reason: &str| CmpressError::CorruptMetadata { reason: reason.to_string() };

    let mut iter = data[pos..].iter().copied();
    let meta_uncompressed_len = leb128_decode(&mut iter)?;
    let meta_compressed_len = leb128_decode(&mut iter)?;
    pos = data.len() - iter.clone().count();

    if pos + meta_compressed_len as usize > data.len() {
        return Err(corrupt("metadata section runs past end of archive"));
    }
    let meta_compressed = &data[pos..pos + meta_compressed_len as usize];
    pos += meta_compressed_len as usize;

    let meta_bytes = crate::cm::decompress(
        meta_compressed,
        meta_uncompressed_len as usize,
        ProfileConfig::simple(),
        header.meta_mem_level,
    )
    .map_err(|_| corrupt("metadata payload failed to decompress"))?;
    let metadata = Metadata::decode(&meta_bytes)?;

    let mut iter = data[pos..].iter().copied();
    let sentinel = leb128_decode(&mut iter)?;
    if sentinel != METADATA_SENTINEL {
        return Err(corrupt("metadata sentinel mismatch"));
    }
    pos = data.len() - iter.clone().count();

    let mut file_buffers: HashMap<usize, Vec<u8>> = HashMap::new();
    for (block_index, block) in metadata.blocks.iter().enumerate() {
        let mut iter = data[pos..].iter().copied();
        let filtered_len = leb128_decode(&mut iter)?;
        let compressed_len = leb128_decode(&mut iter)?;
        pos = data.len() - iter.clone().count();

        if pos + compressed_len as usize > data.len() {
            return Err(corrupt("block payload runs past end of archive"));
        }
        let compressed = &data[pos..pos + compressed_len as usize];
        pos += compressed_len as usize;

        let cfg = ProfileConfig::for_profile(block.algo.profile);
        let filtered = if block.algo.compressor_variant == 1 {
            compressed.to_vec()
        } else {
            crate::cm::decompress(compressed, filtered_len as usize, cfg, block.algo.mem_level)
                .map_err(|_| corrupt("block payload failed to decompress"))?
        };

        let mut filter = Filter::build(block.algo.filter_type, None, crate::constant::DICT_MIN_OCCURRENCES);
        let mut restored = Vec::new();
        filter
            .reverse(&filtered, &mut restored)
            .map_err(|_| CmpressError::FilterParseError { block_index })?;

        for seg in &block.segments {
            let buf = file_buffers.entry(seg.file_index).or_default();
            let mut cursor = 0usize;
            for range in &seg.ranges {
                let end = (seg.base_offset + range.offset + range.length) as usize;
                if buf.len() < end {
                    buf.resize(end, 0);
                }
                let start = (seg.base_offset + range.offset) as usize;
                let len = range.length as usize;
                buf[start..end].copy_from_slice(&restored[cursor..cursor + len]);
                cursor += len;
            }
        }
    }

    let files = (0..metadata.files.len())
        .map(|i| file_buffers.remove(&i).unwrap_or_default())
        .collect();

    Ok(ParsedArchive { metadata, files })
}

pub struct Extractor {
    pub clobber: bool,
}

impl Extractor {
    pub fn new(clobber: bool) -> Self {
        Extractor { clobber }
    }

    pub fn extract_to_disk(&self, data: &[u8], archive_path: &std::path::Path, out_dir: Option<&std::path::Path>) -> Result<(), CmpressError> {
        let parsed = parse(data, archive_path)?;
        for (entry, contents) in parsed.metadata.files.iter().zip(parsed.files.iter()) {
            let mut out_path = PathBuf::from(out_dir.unwrap_or_else(|| std::path::Path::new(".")));
            out_path.push(&entry.name);
            use std::io::Write;
            let mut writer = crate::buffered_io::new_output_file_checked(&out_path, self.clobber)?;
            writer.write_all(contents).map_err(|e| CmpressError::io(out_path.clone(), e))?;
        }
        Ok(())
    }

    pub fn list(&self, data: &[u8], archive_path: &std::path::Path) -> Result<Vec<(String, u64)>, CmpressError> {
        let parsed = parse(data, archive_path)?;
        Ok(parsed
            .metadata
            .files
            .iter()
            .zip(parsed.files.iter())
            .map(|(entry, contents)| (entry.name.clone(), contents.len() as u64))
            .collect())
    }
}

/// Compresses `files` to an in-memory archive, immediately decompresses
/// it, and compares against the originals byte-for-byte, per
/// SPEC_FULL.md §4.20. Never touches disk for either half.
pub fn verify(cfg: &crate::config::Config, files: &[(PathBuf, Vec<u8>)]) -> Result<(), CmpressError> {
    let archiver = crate::archive::Archiver::new(cfg);
    let bytes = archiver.build(files)?;
    let parsed = parse(&bytes, std::path::Path::new("<in-memory>"))?;

    for (i, (path, original)) in files.iter().enumerate() {
        let restored = parsed.files.get(i).map(Vec::as_slice).unwrap_or(&[]);
        if restored != original.as_slice() {
            let first_offset = original
                .iter()
                .zip(restored.iter())
                .position(|(a, b)| a != b)
                .unwrap_or(original.len().min(restored.len())) as u64;
            let mismatch_count = original
                .iter()
                .zip(restored.iter())
                .filter(|(a, b)| a != b)
                .count() as u64
                + (original.len() as i64 - restored.len() as i64).unsigned_abs();
            let _ = path;
            return Err(CmpressError::VerificationDifference { first_offset, mismatch_count });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn round_trips_a_small_text_file() {
        let cfg = Config::default();
        let files = vec![(
            PathBuf::from("hello.txt"),
            b"Hello, world!\n\n\n".to_vec(),
        )];
        let archiver = crate::archive::Archiver::new(&cfg);
        let bytes = archiver.build(&files).unwrap();
        let parsed = parse(&bytes, std::path::Path::new("hello.mcm")).unwrap();
        assert_eq!(parsed.files[0], files[0].1);
        assert_eq!(parsed.metadata.files[0].name, "hello.txt");
    }

    #[test]
    fn round_trips_an_empty_file() {
        let cfg = Config::default();
        let files = vec![(PathBuf::from("empty.bin"), Vec::new())];
        let archiver = crate::archive::Archiver::new(&cfg);
        let bytes = archiver.build(&files).unwrap();
        let parsed = parse(&bytes, std::path::Path::new("empty.mcm")).unwrap();
        assert_eq!(parsed.files[0], Vec::<u8>::new());
    }

    #[test]
    fn verify_accepts_clean_round_trip() {
        let cfg = Config::default();
        let files = vec![(PathBuf::from("a.txt"), b"aaabbbcccaaabbbccc".to_vec())];
        assert!(verify(&cfg, &files).is_ok());
    }

    /// Long enough and wordy enough that the detector classifies it Text and
    /// the default `FilterOverride::Auto` routes it through the dictionary
    /// filter, so this exercises the codebook actually being carried on the
    /// wire instead of just the short Binary-classified inputs above.
    #[test]
    fn round_trips_a_dictionary_filtered_text_block() {
        let cfg = Config::default();
        let text = "the quick brown fox jumps over the lazy dog many times today ok."
            .repeat(20);
        let files = vec![(PathBuf::from("story.txt"), text.clone().into_bytes())];
        let archiver = crate::archive::Archiver::new(&cfg);
        let bytes = archiver.build(&files).unwrap();
        let parsed = parse(&bytes, std::path::Path::new("story.mcm")).unwrap();
        assert_eq!(
            parsed.metadata.blocks[0].algo.filter_type,
            crate::filter::FilterKind::Dict
        );
        assert_eq!(parsed.files[0], text.into_bytes());
    }

    #[test]
    fn rejects_bad_magic() {
        let data = vec![0u8; 20];
        let err = parse(&data, std::path::Path::new("x")).unwrap_err();
        assert!(matches!(err, CmpressError::BadMagic { .. }));
    }
}
