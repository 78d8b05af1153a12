//! Decode and link failures
//!
//! Both are fatal for the translation unit they occur in: no partially
//! decoded or partially linked unit is ever produced.

use lh_common::{BindingId, BlockId, LocationError, TypeId};
use thiserror::Error;

/// The tree document does not have the shape the decoder requires
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("<{tag}> is missing required attribute '{attribute}'")]
    MissingAttribute { tag: String, attribute: String },

    #[error("<{tag}> attribute '{attribute}' has invalid value {value:?}")]
    InvalidAttribute {
        tag: String,
        attribute: String,
        value: String,
    },

    #[error("<{parent}> has no <{child}> child")]
    MissingChild { parent: String, child: String },

    #[error("<{tag}> should have exactly one child, found {found}")]
    ExpectedOneChild { tag: String, found: usize },

    #[error("unknown type <{0}>")]
    UnknownType(String),

    #[error("unknown statement <{0}>")]
    UnknownStatement(String),

    #[error("unknown constant <{0}>")]
    UnknownConstant(String),

    #[error("<{found}> cannot be used as an lvalue")]
    InvalidLvalue { found: String },

    #[error("unexpected <{found}> where {expected} was expected")]
    UnexpectedTag { expected: String, found: String },

    #[error("strange case label: {0}")]
    MalformedCase(String),

    #[error("case range {low} ... {high} spans more than {limit} values")]
    CaseRangeTooWide { low: i128, high: i128, limit: i128 },

    #[error("duplicate {what} id {id}")]
    DuplicateId { what: &'static str, id: u32 },

    #[error("function {function} has no entry block {entry}")]
    MissingEntryBlock { function: String, entry: BlockId },

    #[error("{0:?} is not a supported language")]
    InvalidLanguage(String),

    #[error("bad escape sequence in string literal {0:?}")]
    BadEscape(String),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("malformed document: {0}")]
    Document(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Document(err.to_string())
    }
}

/// A reference in a decoded unit does not resolve
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("aggregate type {id} is referenced but never defined")]
    UnresolvedAggregate { id: TypeId },

    #[error("array type {id} contains itself")]
    CyclicArray { id: TypeId },

    #[error("binding {id} used in function {function} has no declaration")]
    UnresolvedBinding { function: String, id: BindingId },

    #[error("block {from} of function {function} branches to missing block {to}")]
    DanglingEdge {
        function: String,
        from: BlockId,
        to: BlockId,
    },
}

/// Anything that stops a document from becoming a linked unit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("link failed: {0}")]
    Link(#[from] LinkError),
}
