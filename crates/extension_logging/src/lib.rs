#![deny(missing_docs)]
//! Shared logging utilities for the extension contexts.
//!
//! Every context (background, content relay, panel, job engine, message bus)
//! logs through the `ext_*` macros below, passing its own name as the log
//! target so interleaved output from concurrent contexts stays attributable.

#[doc(hidden)]
pub use log;

/// Log target for the background controller.
pub const BACKGROUND: &str = "background";
/// Log target for the per-page content relay.
pub const CONTENT: &str = "content";
/// Log target for the panel controller.
pub const PANEL: &str = "panel";
/// Log target for the job engine and summarizer backends.
pub const JOB_ENGINE: &str = "job_engine";
/// Log target for the message bus.
pub const BUS: &str = "bus";
/// Log target for the command-line host.
pub const APP: &str = "app";

/// Logs a trace-level message on behalf of a context.
#[macro_export]
macro_rules! ext_trace {
    ($ctx:expr, $($arg:tt)+) => {{
        $crate::log::trace!(target: $ctx, $($arg)+);
    }};
}

/// Logs a debug-level message on behalf of a context.
#[macro_export]
macro_rules! ext_debug {
    ($ctx:expr, $($arg:tt)+) => {{
        $crate::log::debug!(target: $ctx, $($arg)+);
    }};
}

/// Logs an info-level message on behalf of a context.
#[macro_export]
macro_rules! ext_info {
    ($ctx:expr, $($arg:tt)+) => {{
        $crate::log::info!(target: $ctx, $($arg)+);
    }};
}

/// Logs a warn-level message on behalf of a context.
#[macro_export]
macro_rules! ext_warn {
    ($ctx:expr, $($arg:tt)+) => {{
        $crate::log::warn!(target: $ctx, $($arg)+);
    }};
}

/// Logs an error-level message on behalf of a context.
#[macro_export]
macro_rules! ext_error {
    ($ctx:expr, $($arg:tt)+) => {{
        $crate::log::error!(target: $ctx, $($arg)+);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Show the target so each line names the context that produced it.
    let config = ConfigBuilder::new()
        .set_target_level(log::LevelFilter::Error)
        .build();

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
