//! Lighthouse - Common Types and Utilities
//!
//! This crate contains the identifier aliases, source locations and
//! diagnostic types shared by the IR, the analysis framework and the driver.

pub mod error;
pub mod types;
pub mod source_loc;

pub use error::{Diagnostic, DiagnosticSink, Excerpt, Severity};
pub use types::*;
pub use source_loc::{Location, LocationError};
