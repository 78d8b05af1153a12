//! Checkers shipped with lighthouse

pub mod format_args;

pub use format_args::FormatArgsChecker;
