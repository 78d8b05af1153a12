//! Lighthouse - Call-Site Checker Framework
//!
//! Runs pluggable checkers over the call statements of decoded units.
//!
//! ## Architecture
//!
//! - `checker` - the checker trait and callee handler tables
//! - `registry` - manifests, the checker catalog and the enabled set
//! - `report` - warnings, errors and internal faults as diagnostics
//! - `dispatch` - walking a unit and offering calls to handlers
//! - `checkers` - built-in checkers

pub use self::checker::{CallSite, Checker, Handler, HandlerTable};
pub use self::checkers::FormatArgsChecker;
pub use self::dispatch::{analyse_unit, AnalysisRun};
pub use self::error::{AnalysisError, HandlerError};
pub use self::registry::{AnalysisConfig, CheckerCatalog, CheckerRegistry, Constructor, Manifest};
pub use self::report::Reporter;

pub mod checkers;

mod checker;
mod dispatch;
mod error;
mod registry;
mod report;
