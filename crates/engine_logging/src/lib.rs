#![deny(missing_docs)]
//! Shared logging utilities for the wiper workspace.
//!
//! This crate provides the `engine_*` logging macros used by the engine and a
//! minimal test initializer for the global logger. Every record is prefixed
//! with the discovery pass the Run Controller is currently in, so interleaved
//! per-message lines can be grouped after the fact.

use std::cell::Cell;
use std::future::Future;

tokio::task_local! {
    /// Pass of the task running inside [`scope_pass`]. Follows the task
    /// across worker threads.
    static TASK_PASS: Cell<u64>;
}

thread_local! {
    /// Fallback for code running outside any [`scope_pass`] task.
    static PASS: Cell<u64> = const { Cell::new(0) };
}

/// Runs `future` with its own pass counter, starting at 0.
/// The Run Controller wraps a whole run in this.
pub async fn scope_pass<F: Future>(future: F) -> F::Output {
    TASK_PASS.scope(Cell::new(0), future).await
}

/// Sets the discovery pass for the current task, or for the current thread
/// when called outside [`scope_pass`].
pub fn set_pass(pass: u64) {
    if TASK_PASS.try_with(|v| v.set(pass)).is_err() {
        PASS.with(|v| v.set(pass));
    }
}

/// Retrieves the discovery pass. Returns 0 before the first batch.
pub fn current_pass() -> u64 {
    TASK_PASS
        .try_with(Cell::get)
        .unwrap_or_else(|_| PASS.with(Cell::get))
}

/// Logs a trace-level message tagged with the current pass.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[pass {}] {}", $crate::current_pass(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current pass.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("[pass {}] {}", $crate::current_pass(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current pass.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[pass {}] {}", $crate::current_pass(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current pass.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[pass {}] {}", $crate::current_pass(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current pass.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[pass {}] {}", $crate::current_pass(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
