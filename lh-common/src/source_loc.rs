//! Source location tracking for diagnostics
//!
//! Locations arrive from the upstream tree document as `file:line` or
//! `file:line:column` strings. They are parsed here and rendered back,
//! and can produce a small excerpt of the unit's source around the line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of source lines shown on either side of a highlighted line
pub const EXCERPT_CONTEXT: usize = 5;

/// Width of the `>>> NNNN ` gutter in front of excerpt lines
const GUTTER_WIDTH: usize = 9;

/// A location in a source file. Line and column are 1-based; a column of
/// zero means the producer did not record one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{text:?} is not a valid location")]
pub struct LocationError {
    pub text: String,
}

impl Location {
    pub fn new(file: &str, line: u32, column: u32) -> Self {
        Self {
            file: file.to_string(),
            line,
            column,
        }
    }

    /// Location without a column
    pub fn line_only(file: &str, line: u32) -> Self {
        Self::new(file, line, 0)
    }

    pub fn has_column(&self) -> bool {
        self.column != 0
    }

    /// Render the lines surrounding this location from `source`, marking the
    /// line itself and, when a column is known, pointing a caret at it.
    pub fn highlight(&self, source: &str, label: &str) -> String {
        let lines: Vec<&str> = source.lines().collect();
        let target = self.line as usize;
        let first = target.saturating_sub(1 + EXCERPT_CONTEXT);
        let last = (target + EXCERPT_CONTEXT).min(lines.len());

        let mut out = Vec::new();
        for (index, text) in lines.iter().enumerate().take(last).skip(first) {
            let number = index + 1;
            if number == target {
                out.push(format!(">>> {:<4} {}", number, text));
                if self.has_column() {
                    let pad = GUTTER_WIDTH + self.column as usize - 1;
                    out.push(format!("{}^----- {}", " ".repeat(pad), label));
                }
            } else {
                out.push(format!("*** {:<4} {}", number, text));
            }
        }
        out.join("\n")
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LocationError { text: s.to_string() };

        let (head, last) = s.rsplit_once(':').ok_or_else(invalid)?;
        let last: u32 = last.parse().map_err(|_| invalid())?;

        // file:line:column, unless the middle piece is part of the file name
        if let Some((file, middle)) = head.rsplit_once(':') {
            if let Ok(line) = middle.parse::<u32>() {
                if file.is_empty() {
                    return Err(invalid());
                }
                return Ok(Location::new(file, line, last));
            }
        }

        if head.is_empty() {
            return Err(invalid());
        }
        Ok(Location::line_only(head, last))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_column() {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.file, self.line)
        }
    }
}

/// Trait for IR entities that may carry a source location
pub trait HasLocation {
    fn location(&self) -> Option<&Location>;
}
