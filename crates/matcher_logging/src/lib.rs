#![deny(missing_docs)]
//! Shared logging utilities for the matcher workspace.
//!
//! This crate provides the `matcher_*` logging macros used across the
//! workspace, a per-thread run tag that those macros prefix to every line,
//! and a minimal test initializer for the global logger.

use std::cell::Cell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Analysis run currently being driven on this thread, if any.
    static CURRENT_RUN: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Tags subsequent log lines on this thread with the given run id.
///
/// Pass `None` once no analysis is in flight.
pub fn set_current_run(run: Option<u64>) {
    CURRENT_RUN.with(|v| v.set(run));
}

/// Returns the run id log lines on this thread are tagged with.
pub fn current_run() -> Option<u64> {
    CURRENT_RUN.with(|v| v.get())
}

#[doc(hidden)]
#[macro_export]
macro_rules! __matcher_log {
    ($level:ident, $($arg:tt)*) => {{
        match $crate::current_run() {
            Some(run) => $crate::log::$level!("[run {}] {}", run, format_args!($($arg)*)),
            None => $crate::log::$level!($($arg)*),
        }
    }};
}

/// Logs a trace-level message, tagged with the current run.
#[macro_export]
macro_rules! matcher_trace {
    ($($arg:tt)*) => { $crate::__matcher_log!(trace, $($arg)*) };
}

/// Logs a debug-level message, tagged with the current run.
#[macro_export]
macro_rules! matcher_debug {
    ($($arg:tt)*) => { $crate::__matcher_log!(debug, $($arg)*) };
}

/// Logs an info-level message, tagged with the current run.
#[macro_export]
macro_rules! matcher_info {
    ($($arg:tt)*) => { $crate::__matcher_log!(info, $($arg)*) };
}

/// Logs a warn-level message, tagged with the current run.
#[macro_export]
macro_rules! matcher_warn {
    ($($arg:tt)*) => { $crate::__matcher_log!(warn, $($arg)*) };
}

/// Logs an error-level message, tagged with the current run.
#[macro_export]
macro_rules! matcher_error {
    ($($arg:tt)*) => { $crate::__matcher_log!(error, $($arg)*) };
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have set the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
