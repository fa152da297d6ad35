use std::process::ExitCode;

use cmpress::config::{Config, Mode};
use cmpress::{archive::Archiver, error::CmpressError, extract, log, log_error, log_info};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let cfg = match Config::new(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    log::set_quiet(cfg.quiet);
    log::set_verbose(cfg.verbose);

    let result = match cfg.mode {
        Mode::Compress => Archiver::new(&cfg).create_archive(),
        Mode::Decompress => run_decompress(&cfg),
        Mode::List => run_list(&cfg),
        Mode::Test => run_test(&cfg),
    };

    match result {
        Ok(()) => {
            log_info!("done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error!("{}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run_decompress(cfg: &Config) -> Result<(), CmpressError> {
    let archive_path = cfg.inputs[0].clone();
    let data = std::fs::read(&archive_path).map_err(|e| CmpressError::io(archive_path.clone(), e))?;
    let extractor = extract::Extractor::new(cfg.clobber);
    extractor.extract_to_disk(&data, &archive_path, cfg.output.as_deref())
}

fn run_list(cfg: &Config) -> Result<(), CmpressError> {
    let archive_path = cfg.inputs[0].clone();
    let data = std::fs::read(&archive_path).map_err(|e| CmpressError::io(archive_path.clone(), e))?;
    let extractor = extract::Extractor::new(cfg.clobber);
    for (name, size) in extractor.list(&data, &archive_path)? {
        log_info!("{:>12}  {}", size, name);
    }
    Ok(())
}

fn run_test(cfg: &Config) -> Result<(), CmpressError> {
    let files: Vec<(std::path::PathBuf, Vec<u8>)> = cfg
        .inputs
        .iter()
        .map(|p| std::fs::read(p).map(|d| (p.clone(), d)).map_err(|e| CmpressError::io(p.clone(), e)))
        .collect::<Result<_, _>>()?;
    extract::verify(cfg, &files)
}
