//! Checker and run failures

use std::path::PathBuf;
use thiserror::Error;

/// Why a handler stopped working on a call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// An error diagnostic was recorded; the rest of the call is skipped
    #[error("error reported")]
    Reported,

    /// The checker itself is broken
    #[error("internal fault: {0}")]
    Internal(String),
}

/// Failures that end an analysis run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("checker manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("internal fault in checker '{checker}' at call to {callee} in {function}: {message}")]
    InternalFault {
        checker: String,
        function: String,
        callee: String,
        message: String,
    },
}
