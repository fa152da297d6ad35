//! Error taxonomy for the archive pipeline and argument parsing.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, reading, or verifying an archive.
#[derive(Error, Debug)]
pub enum CmpressError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not an archive: bad magic in {path}")]
    BadMagic { path: PathBuf },

    #[error("archive version {major}.{minor} is not supported by this build")]
    VersionMismatch { major: u16, minor: u16 },

    #[error("corrupt metadata: {reason}")]
    CorruptMetadata { reason: String },

    #[error("dictionary header malformed in block {block_index}")]
    FilterParseError { block_index: usize },

    #[error(
        "verification failed: first mismatch at byte {first_offset}, {mismatch_count} bytes differ"
    )]
    VerificationDifference {
        first_offset: u64,
        mismatch_count: u64,
    },

    #[error("could not allocate resources for compression (mem level too high for this input)")]
    ResourceExhaustion,
}

impl CmpressError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CmpressError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code this error maps to, per the CLI's exit code table.
    pub fn exit_code(&self) -> i32 {
        match self {
            CmpressError::Io { .. }
            | CmpressError::BadMagic { .. }
            | CmpressError::VersionMismatch { .. }
            | CmpressError::CorruptMetadata { .. }
            | CmpressError::FilterParseError { .. }
            | CmpressError::ResourceExhaustion => 1,
            CmpressError::VerificationDifference { .. } => 1,
        }
    }
}

/// Errors in the CLI argument grammar, distinct from archive-content errors
/// because they're detected before any file is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("more than one command given")]
    MultipleCommands,

    #[error("missing archive argument")]
    MissingArchive,

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("missing file arguments")]
    MissingFiles,
}

impl ConfigError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::MultipleCommands => 2,
            ConfigError::MissingArchive => 3,
            ConfigError::UnknownOption(_) => 4,
            ConfigError::MissingFiles => 5,
        }
    }
}

/// A profile value stored in an archive that this build doesn't recognize
/// is not an error per spec.md §7: it's silently treated as Binary. This
/// type exists so callers that want to log the downgrade still can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileMismatch {
    pub raw: u8,
}

impl fmt::Display for ProfileMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized profile byte {} treated as Binary", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_exit_codes_match_the_cli_table() {
        assert_eq!(ConfigError::MultipleCommands.exit_code(), 2);
        assert_eq!(ConfigError::MissingArchive.exit_code(), 3);
        assert_eq!(ConfigError::UnknownOption("x".into()).exit_code(), 4);
        assert_eq!(ConfigError::MissingFiles.exit_code(), 5);
    }

    #[test]
    fn archive_errors_all_exit_nonzero() {
        assert_eq!(CmpressError::ResourceExhaustion.exit_code(), 1);
        assert_eq!(
            CmpressError::VerificationDifference { first_offset: 0, mismatch_count: 1 }.exit_code(),
            1
        );
    }
}
