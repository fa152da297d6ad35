//! Archive assembly: the `c`/compress pipeline, spec.md §3 + §4.15.
//!
//! Grounded on `examples/aufdj-prisirv/src/archive.rs`'s top-level
//! "read inputs, build metadata, write one container file" shape, adapted
//! from the teacher's fixed block-count solid-archive format to per-file
//! detection, per-block filter selection, and the LEB128 metadata/block
//! framing this format uses.
//!
//! spec.md §4.15 describes a single ambiguous "encoded length" field per
//! block and for the metadata section, but `cm::decompress` needs the
//! filtered (post-filter, pre-range-coder) byte count, which differs from
//! the compressed length and, whenever a filter changes size, from the
//! original byte count too. This crate stores both lengths explicitly
//! instead of relying on one field to mean two things (documented in
//! DESIGN.md).

use std::path::{Path, PathBuf};

use crate::analyzer::Analyzer;
use crate::buffered_io::leb128_encode;
use crate::config::Config;
use crate::constant::{ARCHIVE_MAGIC, ARCHIVE_MAJOR, ARCHIVE_MINOR, DICT_MIN_OCCURRENCES, METADATA_SENTINEL};
use crate::dict_filter::Codebook;
use crate::error::CmpressError;
use crate::filter::Filter;
use crate::metadata::{Attributes, FileEntry, Metadata};
use crate::profile::ProfileConfig;
use crate::segment::{AlgorithmDescriptor, FileSegments, SegmentRange, SolidBlock};

pub struct Archiver<'a> {
    cfg: &'a Config,
}

impl<'a> Archiver<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Archiver { cfg }
    }

    pub fn create_archive(&self) -> Result<(), CmpressError> {
        let output = self
            .cfg
            .output
            .clone()
            .ok_or_else(|| CmpressError::io(PathBuf::from("<output>"), std::io::Error::new(std::io::ErrorKind::NotFound, "no output path")))?;

        let files: Vec<(PathBuf, Vec<u8>)> = self
            .cfg
            .inputs
            .iter()
            .map(|p| std::fs::read(p).map(|d| (p.clone(), d)).map_err(|e| CmpressError::io(p.clone(), e)))
            .collect::<Result<_, _>>()?;

        let bytes = self.build(&files)?;
        std::fs::write(&output, &bytes).map_err(|e| CmpressError::io(output.clone(), e))?;
        Ok(())
    }

    /// Builds the full archive byte stream from in-memory file contents.
    /// Split out from `create_archive` so the `-test` verify path can run
    /// it without touching the filesystem.
    pub fn build(&self, files: &[(PathBuf, Vec<u8>)]) -> Result<Vec<u8>, CmpressError> {
        let mut analyzer = Analyzer::new();
        let mut per_file_blocks = Vec::with_capacity(files.len());
        for (_, data) in files {
            per_file_blocks.push(analyzer.analyze(data));
        }

        // An external dictionary (`-dict`) seeds the word counter before
        // codebook generation, so words that don't occur often enough in
        // this particular input can still be assigned codewords.
        if let Some(dict_path) = &self.cfg.dict_path {
            let contents = std::fs::read(dict_path).map_err(|e| CmpressError::io(dict_path.clone(), e))?;
            analyzer.seed_words(&contents);
        }

        let mut metadata = Metadata::new();
        for (path, _) in files {
            metadata.files.push(FileEntry {
                name: file_name(path),
                attributes: read_attributes(path),
            });
        }

        let mut block_payloads: Vec<(AlgorithmDescriptor, Vec<u8>)> = Vec::new();
        for (file_index, (_, data)) in files.iter().enumerate() {
            let mut base_offset = 0u64;
            for block in &per_file_blocks[file_index] {
                let raw = &data[block.offset..block.offset + block.length];
                let filter_kind = self.cfg.filter.resolve(block.profile);
                let mut filter = Filter::build(
                    filter_kind,
                    Some(&analyzer.word_counter),
                    DICT_MIN_OCCURRENCES,
                );
                let mut filtered = Vec::new();
                filter.forward(raw, &mut filtered);

                let algo = AlgorithmDescriptor {
                    mem_level: self.cfg.mem_level,
                    compressor_variant: if self.cfg.store { 1 } else { 0 },
                    lzp_enabled: !matches!(self.cfg.lzp, crate::config::LzpOverride::False),
                    filter_type: filter.kind(),
                    profile: block.profile,
                };

                // Ranges and `total_size` live in the *original* file's byte
                // space, since that's what extraction scatters into. The
                // filtered byte count (which can differ, e.g. the dictionary
                // filter shrinking text) travels separately as this block's
                // `filtered_len` wire field below.
                let mut solid_block = SolidBlock::new(algo);
                let mut seg = FileSegments::new(file_index, base_offset, block.length as u64);
                seg.ranges.push(SegmentRange { offset: 0, length: block.length as u64 });
                solid_block.segments.push(seg);
                solid_block.total_size = block.length as u64;
                metadata.blocks.push(solid_block);
                block_payloads.push((algo, filtered));
                base_offset += block.length as u64;
            }
        }

        if let Some(out_dict_path) = &self.cfg.out_dict_path {
            let codebook = Codebook::build(&analyzer.word_counter, DICT_MIN_OCCURRENCES);
            let mut dump = Vec::new();
            for word in codebook.words() {
                dump.extend_from_slice(word);
                dump.push(b'\n');
            }
            std::fs::write(out_dict_path, &dump).map_err(|e| CmpressError::io(out_dict_path.clone(), e))?;
        }

        // spec.md §4.15: solid blocks are compressed largest-first, so the
        // biggest payloads get first crack at the model bank's adaptive
        // state before it's diluted by many small ones. `metadata.blocks`
        // and `block_payloads` are reordered together so the block table
        // still lines up with the physical block order on the wire.
        let mut order: Vec<usize> = (0..metadata.blocks.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(metadata.blocks[i].total_size));
        metadata.blocks = order.iter().map(|&i| metadata.blocks[i].clone()).collect();
        block_payloads = order.into_iter().map(|i| block_payloads[i].clone()).collect();

        let mut out = Vec::new();
        out.extend_from_slice(ARCHIVE_MAGIC);
        out.extend_from_slice(&ARCHIVE_MAJOR.to_le_bytes());
        out.extend_from_slice(&ARCHIVE_MINOR.to_le_bytes());
        // Metadata is always coded at this mem level regardless of
        // `-m`/`-t`, so a decoder never has to guess it before it has
        // decoded the very structure that would tell it.
        out.push(self.cfg.mem_level);

        let meta_bytes = metadata.encode();
        let meta_cfg = ProfileConfig::simple();
        let meta_compressed = crate::cm::compress(&meta_bytes, meta_cfg, self.cfg.mem_level)
            .map_err(|_| CmpressError::ResourceExhaustion)?;
        leb128_encode(meta_bytes.len() as u64, &mut out);
        leb128_encode(meta_compressed.len() as u64, &mut out);
        out.extend_from_slice(&meta_compressed);
        leb128_encode(METADATA_SENTINEL, &mut out);

        for (algo, filtered) in &block_payloads {
            let cfg = ProfileConfig::for_profile(algo.profile);
            let compressed = if self.cfg.store {
                filtered.clone()
            } else {
                crate::cm::compress(filtered, cfg, algo.mem_level).map_err(|_| CmpressError::ResourceExhaustion)?
            };
            leb128_encode(filtered.len() as u64, &mut out);
            leb128_encode(compressed.len() as u64, &mut out);
            out.extend_from_slice(&compressed);
        }

        Ok(out)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Reads the directory/r-w-x/system/hidden bits spec.md §6 says an archive
/// preserves. Falls back to a read-only file entry if the filesystem can't
/// be queried (e.g. the path was already read into memory from a pipe).
fn read_attributes(path: &Path) -> Attributes {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return Attributes::READ,
    };

    let mut attrs = Attributes::READ;
    if meta.is_dir() {
        attrs = attrs | Attributes::DIR;
    }
    if is_hidden(path) {
        attrs = attrs | Attributes::HIDDEN;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode();
        if mode & 0o200 != 0 {
            attrs = attrs | Attributes::WRITE;
        }
        if mode & 0o100 != 0 {
            attrs = attrs | Attributes::EXEC;
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_READONLY: u32 = 0x1;
        const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
        let raw = meta.file_attributes();
        if raw & FILE_ATTRIBUTE_READONLY == 0 {
            attrs = attrs | Attributes::WRITE;
        }
        if raw & FILE_ATTRIBUTE_SYSTEM != 0 {
            attrs = attrs | Attributes::SYSTEM;
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        attrs = attrs | Attributes::WRITE;
    }

    attrs
}

#[cfg(unix)]
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(windows)]
fn is_hidden(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    std::fs::metadata(path)
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builds_an_archive_with_valid_header() {
        let cfg = Config::default();
        let archiver = Archiver::new(&cfg);
        let files = vec![(PathBuf::from("a.txt"), b"hello world, hello there, hello again".to_vec())];
        let bytes = archiver.build(&files).unwrap();
        assert_eq!(&bytes[0..10], ARCHIVE_MAGIC);
    }

    #[test]
    fn empty_file_produces_zero_length_block() {
        let cfg = Config::default();
        let archiver = Archiver::new(&cfg);
        let files = vec![(PathBuf::from("empty.bin"), Vec::new())];
        let bytes = archiver.build(&files).unwrap();
        assert!(bytes.len() > 10);
    }

    #[test]
    fn reads_real_attributes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("plain.txt");
        std::fs::write(&file_path, b"hi").unwrap();

        let attrs = read_attributes(&file_path);
        assert!(attrs.contains(Attributes::READ));
        assert!(attrs.contains(Attributes::WRITE));
        assert!(!attrs.contains(Attributes::DIR));

        let dir_attrs = read_attributes(dir.path());
        assert!(dir_attrs.contains(Attributes::DIR));
    }

    #[test]
    fn external_dictionary_and_out_dict_are_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let dict_path = dir.path().join("seed.txt");
        let seed = "xylophone ".repeat(12);
        std::fs::write(&dict_path, seed.as_bytes()).unwrap();
        let out_dict_path = dir.path().join("out.txt");

        let mut cfg = Config::default();
        cfg.dict_path = Some(dict_path);
        cfg.out_dict_path = Some(out_dict_path.clone());
        let archiver = Archiver::new(&cfg);
        let files = vec![(PathBuf::from("a.txt"), b"hello world, hello there, hello again".to_vec())];
        archiver.build(&files).unwrap();

        let dumped = std::fs::read_to_string(&out_dict_path).unwrap();
        assert!(dumped.lines().any(|w| w == "xylophone"));
    }

    #[test]
    fn blocks_are_ordered_largest_first() {
        let cfg = Config::default();
        let archiver = Archiver::new(&cfg);
        let files = vec![
            (PathBuf::from("small.bin"), vec![1u8; 20]),
            (PathBuf::from("big.bin"), vec![2u8; 4000]),
        ];
        let bytes = archiver.build(&files).unwrap();
        let parsed = crate::extract::parse(&bytes, std::path::Path::new("x.mcm")).unwrap();
        let sizes: Vec<u64> = parsed.metadata.blocks.iter().map(|b| b.total_size).collect();
        let mut sorted = sizes.clone();
        sorted.sort_by_key(|&s| std::cmp::Reverse(s));
        assert_eq!(sizes, sorted);
    }
}
