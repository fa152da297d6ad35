//! Command-line argument parsing into a `Config`, per spec.md §6 and
//! SPEC_FULL.md §4.16.
//!
//! Grounded on `examples/aufdj-prisirv/src/config.rs`'s `Parse` enum
//! walking argument tokens one at a time, adapted to this format's flag
//! grammar (compression-level/mem-level combined flags, filter/lzp
//! overrides, external dictionary paths) instead of the teacher's
//! sort/solid/thread options.

use std::path::PathBuf;

use crate::constant::{DEFAULT_ARCHIVE_EXTENSION, MAX_MEM_LEVEL};
use crate::error::ConfigError;
use crate::filter::FilterKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Compress,
    Decompress,
    List,
    Test,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOverride {
    Auto,
    None,
    Dict,
    X86,
}

impl FilterOverride {
    pub fn resolve(self, profile: crate::profile::Profile) -> FilterKind {
        use crate::profile::Profile;
        match self {
            FilterOverride::None => FilterKind::None,
            FilterOverride::Dict => FilterKind::Dict,
            FilterOverride::X86 => FilterKind::X86,
            FilterOverride::Auto => match profile {
                Profile::Text => FilterKind::Dict,
                Profile::Binary => FilterKind::X86,
                _ => FilterKind::None,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LzpOverride {
    Auto,
    True,
    False,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mode: Mode,
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub mem_level: u8,
    pub store: bool,
    pub filter: FilterOverride,
    pub lzp: LzpOverride,
    pub dict_path: Option<PathBuf>,
    pub out_dict_path: Option<PathBuf>,
    pub block_size_mb: Option<usize>,
    pub quiet: bool,
    pub verbose: bool,
    pub clobber: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::Compress,
            inputs: Vec::new(),
            output: None,
            mem_level: 2,
            store: false,
            filter: FilterOverride::Auto,
            lzp: LzpOverride::Auto,
            dict_path: None,
            out_dict_path: None,
            block_size_mb: None,
            quiet: false,
            verbose: false,
            clobber: false,
        }
    }
}

enum Parse {
    None,
    Filter,
    Lzp,
    Dict,
    OutDict,
    BlockSize,
}

fn parse_filter_value(arg: &str, value: &str) -> Result<FilterOverride, ConfigError> {
    match value {
        "none" => Ok(FilterOverride::None),
        "dict" => Ok(FilterOverride::Dict),
        "x86" => Ok(FilterOverride::X86),
        "auto" => Ok(FilterOverride::Auto),
        _ => Err(ConfigError::UnknownOption(arg.to_string())),
    }
}

fn parse_lzp_value(arg: &str, value: &str) -> Result<LzpOverride, ConfigError> {
    match value {
        "auto" => Ok(LzpOverride::Auto),
        "true" => Ok(LzpOverride::True),
        "false" => Ok(LzpOverride::False),
        _ => Err(ConfigError::UnknownOption(arg.to_string())),
    }
}

impl Config {
    pub fn new(args: &[String]) -> Result<Config, ConfigError> {
        let mut cfg = Config::default();
        let mut parser = Parse::None;
        let mut command_seen = false;
        let mut positionals: Vec<PathBuf> = Vec::new();

        for arg in args {
            // `-filter=dict`/`-lzp=auto`/`-dict=<path>`/`-out-dict=<path>`/
            // `-b=<mb>` inline-value syntax, tried before the bare
            // token-then-separate-argument form below.
            if let Some(eq) = arg.find('=') {
                let (key, value) = (&arg[..eq], &arg[eq + 1..]);
                match key {
                    "-filter" => {
                        cfg.filter = parse_filter_value(arg, value)?;
                        continue;
                    }
                    "-lzp" => {
                        cfg.lzp = parse_lzp_value(arg, value)?;
                        continue;
                    }
                    "-dict" => {
                        cfg.dict_path = Some(PathBuf::from(value));
                        continue;
                    }
                    "-out-dict" => {
                        cfg.out_dict_path = Some(PathBuf::from(value));
                        continue;
                    }
                    "-b" => {
                        cfg.block_size_mb =
                            Some(value.parse().map_err(|_| ConfigError::UnknownOption(arg.clone()))?);
                        continue;
                    }
                    _ => {}
                }
            }

            match arg.as_str() {
                "c" => {
                    set_command(&mut command_seen, &mut cfg, Mode::Compress)?;
                    continue;
                }
                "d" => {
                    set_command(&mut command_seen, &mut cfg, Mode::Decompress)?;
                    continue;
                }
                "l" => {
                    set_command(&mut command_seen, &mut cfg, Mode::List)?;
                    continue;
                }
                "-test" => {
                    set_command(&mut command_seen, &mut cfg, Mode::Test)?;
                    continue;
                }
                "-store" => {
                    cfg.store = true;
                    continue;
                }
                "-q" | "-quiet" => {
                    cfg.quiet = true;
                    continue;
                }
                "-v" | "-verbose" => {
                    cfg.verbose = true;
                    continue;
                }
                "-clobber" => {
                    cfg.clobber = true;
                    continue;
                }
                "-filter" => {
                    parser = Parse::Filter;
                    continue;
                }
                "-lzp" => {
                    parser = Parse::Lzp;
                    continue;
                }
                "-dict" => {
                    parser = Parse::Dict;
                    continue;
                }
                "-out-dict" => {
                    parser = Parse::OutDict;
                    continue;
                }
                "-b" => {
                    parser = Parse::BlockSize;
                    continue;
                }
                _ => {}
            }

            if let Some(stripped) = arg.strip_prefix('-') {
                if let Some(first) = stripped.chars().next() {
                    if "tfmhxs".contains(first) {
                        let level: u8 = stripped[1..]
                            .parse()
                            .map_err(|_| ConfigError::UnknownOption(arg.clone()))?;
                        if level as u32 > MAX_MEM_LEVEL as u32 {
                            return Err(ConfigError::UnknownOption(arg.clone()));
                        }
                        cfg.mem_level = level;
                        continue;
                    }
                }
            }

            match parser {
                Parse::None => positionals.push(PathBuf::from(arg)),
                Parse::Filter => {
                    cfg.filter = parse_filter_value(arg, arg)?;
                    parser = Parse::None;
                }
                Parse::Lzp => {
                    cfg.lzp = parse_lzp_value(arg, arg)?;
                    parser = Parse::None;
                }
                Parse::Dict => {
                    cfg.dict_path = Some(PathBuf::from(arg));
                    parser = Parse::None;
                }
                Parse::OutDict => {
                    cfg.out_dict_path = Some(PathBuf::from(arg));
                    parser = Parse::None;
                }
                Parse::BlockSize => {
                    cfg.block_size_mb = Some(arg.parse().map_err(|_| ConfigError::UnknownOption(arg.clone()))?);
                    parser = Parse::None;
                }
            }
        }

        if !command_seen {
            cfg.mode = Mode::Decompress;
        }

        match cfg.mode {
            Mode::List => {
                let archive = positionals.first().cloned().ok_or(ConfigError::MissingArchive)?;
                cfg.inputs = vec![archive];
            }
            Mode::Decompress => {
                let archive = positionals.first().cloned().ok_or(ConfigError::MissingArchive)?;
                cfg.inputs = vec![archive];
                cfg.output = positionals.get(1).cloned();
            }
            Mode::Compress | Mode::Test => {
                if positionals.is_empty() {
                    return Err(ConfigError::MissingFiles);
                }
                cfg.output = positionals.last().cloned().filter(|_| positionals.len() > 1);
                let n = if cfg.output.is_some() { positionals.len() - 1 } else { positionals.len() };
                cfg.inputs = positionals[..n].to_vec();
            }
        }

        if cfg.mode == Mode::Compress && cfg.output.is_none() {
            if let Some(first) = cfg.inputs.first() {
                let stem = first.file_stem().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("archive"));
                cfg.output = Some(stem.with_extension(DEFAULT_ARCHIVE_EXTENSION));
            }
        }

        Ok(cfg)
    }
}

fn set_command(seen: &mut bool, cfg: &mut Config, mode: Mode) -> Result<(), ConfigError> {
    if *seen {
        return Err(ConfigError::MultipleCommands);
    }
    *seen = true;
    cfg.mode = mode;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compress_defaults_output_extension() {
        let cfg = Config::new(&args(&["c", "foo.txt"])).unwrap();
        assert_eq!(cfg.mode, Mode::Compress);
        assert_eq!(cfg.output, Some(PathBuf::from("foo.mcm")));
    }

    #[test]
    fn rejects_multiple_commands() {
        let err = Config::new(&args(&["c", "d", "foo.txt"])).unwrap_err();
        assert!(matches!(err, ConfigError::MultipleCommands));
    }

    #[test]
    fn parses_level_and_filter_flags() {
        let cfg = Config::new(&args(&["c", "-t5", "-filter", "dict", "foo.txt"])).unwrap();
        assert_eq!(cfg.mem_level, 5);
        assert_eq!(cfg.filter, FilterOverride::Dict);
    }

    #[test]
    fn parses_inline_equals_syntax() {
        let cfg = Config::new(&args(&["c", "-filter=dict", "-lzp=false", "foo.txt"])).unwrap();
        assert_eq!(cfg.filter, FilterOverride::Dict);
        assert_eq!(cfg.lzp, LzpOverride::False);
    }

    #[test]
    fn parses_inline_dict_paths() {
        let cfg = Config::new(&args(&["c", "-dict=words.txt", "-out-dict=out.txt", "foo.txt"])).unwrap();
        assert_eq!(cfg.dict_path, Some(PathBuf::from("words.txt")));
        assert_eq!(cfg.out_dict_path, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn no_command_means_decompress() {
        let cfg = Config::new(&args(&["archive.mcm"])).unwrap();
        assert_eq!(cfg.mode, Mode::Decompress);
        assert_eq!(cfg.inputs, vec![PathBuf::from("archive.mcm")]);
    }

    #[test]
    fn missing_files_is_an_error() {
        let err = Config::new(&args(&["c"])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFiles));
    }
}
