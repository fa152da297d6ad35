//! Context-mixing file archiver: text/binary/PCM detection feeding
//! per-block filters and a bit-level predictor bank into a range coder.
//!
//! `Cmpress` is the library entry point; `main.rs` is a thin CLI shell
//! around it, mirroring `examples/aufdj-prisirv/src/lib.rs`'s method-
//! chaining facade over its own `Archiver`/`Extractor`.

pub mod analyzer;
pub mod archive;
pub mod bracket_model;
pub mod buffered_io;
pub mod byte_buffer;
pub mod cm;
pub mod config;
pub mod constant;
pub mod detector;
pub mod dict_filter;
pub mod error;
pub mod extract;
pub mod filter;
pub mod hash_model;
pub mod hash_table;
pub mod interval_model;
#[macro_use]
pub mod log;
pub mod logistic;
pub mod match_model;
pub mod metadata;
pub mod mixer;
pub mod order_model;
pub mod predictor;
pub mod profile;
pub mod range_coder;
pub mod reorder;
pub mod segment;
pub mod sparse_model;
pub mod sse;
pub mod state_map;
pub mod tables;
pub mod word_counter;
pub mod word_model;
pub mod x86_filter;

use std::path::PathBuf;

use crate::config::{Config, FilterOverride, LzpOverride, Mode};
use crate::error::{CmpressError, ConfigError};

/// Method-chaining facade over `Config` + the archive/extract pipelines,
/// for callers embedding this crate instead of driving it through argv.
#[derive(Clone, Default)]
pub struct Cmpress {
    cfg: Config,
}

impl Cmpress {
    pub fn new() -> Self {
        Cmpress { cfg: Config::default() }
    }

    pub fn with_config(cfg: Config) -> Self {
        Cmpress { cfg }
    }

    pub fn quiet(mut self) -> Self {
        self.cfg.quiet = true;
        self
    }

    pub fn verbose(mut self) -> Self {
        self.cfg.verbose = true;
        self
    }

    pub fn clobber(mut self) -> Self {
        self.cfg.clobber = true;
        self
    }

    pub fn store(mut self) -> Self {
        self.cfg.store = true;
        self
    }

    pub fn mem_level(mut self, level: u8) -> Self {
        self.cfg.mem_level = level;
        self
    }

    pub fn filter(mut self, filter: FilterOverride) -> Self {
        self.cfg.filter = filter;
        self
    }

    pub fn lzp(mut self, lzp: LzpOverride) -> Self {
        self.cfg.lzp = lzp;
        self
    }

    pub fn inputs(mut self, inputs: &[&str]) -> Result<Self, ConfigError> {
        for input in inputs {
            let path = PathBuf::from(input);
            if !path.exists() {
                return Err(ConfigError::MissingFiles);
            }
            self.cfg.inputs.push(path);
        }
        Ok(self)
    }

    pub fn output(mut self, path: &str) -> Self {
        self.cfg.output = Some(PathBuf::from(path));
        self
    }

    pub fn create_archive(mut self) -> Result<(), CmpressError> {
        self.cfg.mode = Mode::Compress;
        if self.cfg.output.is_none() {
            if let Some(first) = self.cfg.inputs.first() {
                let stem = first
                    .file_stem()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("archive"));
                self.cfg.output = Some(stem.with_extension(crate::constant::DEFAULT_ARCHIVE_EXTENSION));
            }
        }
        archive::Archiver::new(&self.cfg).create_archive()
    }

    pub fn extract_archive(mut self) -> Result<(), CmpressError> {
        self.cfg.mode = Mode::Decompress;
        let archive_path = self.cfg.inputs.first().cloned().ok_or(CmpressError::io(
            PathBuf::from("<archive>"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no archive given"),
        ))?;
        let data = std::fs::read(&archive_path).map_err(|e| CmpressError::io(archive_path.clone(), e))?;
        let extractor = extract::Extractor::new(self.cfg.clobber);
        extractor.extract_to_disk(&data, &archive_path, self.cfg.output.as_deref())
    }

    pub fn verify(self) -> Result<(), CmpressError> {
        let files: Vec<(PathBuf, Vec<u8>)> = self
            .cfg
            .inputs
            .iter()
            .map(|p| std::fs::read(p).map(|d| (p.clone(), d)).map_err(|e| CmpressError::io(p.clone(), e)))
            .collect::<Result<_, _>>()?;
        extract::verify(&self.cfg, &files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chains_without_panicking() {
        let c = Cmpress::new().quiet().clobber().mem_level(3);
        assert_eq!(c.cfg.mem_level, 3);
        assert!(c.cfg.quiet);
    }
}
