//! Identifier types shared across the IR and the analysis framework
//!
//! All identifiers are the numeric uids assigned by the upstream compiler
//! that produced the tree document.

/// Identity of a declared or temporary variable
pub type BindingId = u32;

/// Basic block identifier, unique within one function
pub type BlockId = u32;

/// Type identity, as carried by aggregate, function and typedef'd types
pub type TypeId = u32;

/// Binding id used by placeholder expressions that stand in for
/// constructs the decoder does not model
pub const PLACEHOLDER_BINDING: BindingId = 0;
