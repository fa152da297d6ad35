//! Leveled logging gated on `Config::quiet`, per SPEC_FULL.md §4.17.
//!
//! Grounded on the teacher's habit of `println!` at pipeline milestones
//! (`aufdj-prisirv/src/config.rs::print`, `progress.rs`), centralized here
//! so verbosity becomes one knob instead of scattered call sites.

use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if !$crate::log::is_quiet() {
            println!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_verbose {
    ($($arg:tt)*) => {
        if !$crate::log::is_quiet() && $crate::log::is_verbose() {
            println!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if !$crate::log::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}
