//! Lighthouse - Intermediate Representation
//!
//! Typed model of one pre-parsed C/C++ translation unit.
//!
//! ## Architecture
//!
//! - `input` - the tagged tree document handed over by the compiler plugin
//! - `types` - C types, the aggregate arena and type compatibility
//! - `decl` - bindings and declarations
//! - `constant` - literal constants
//! - `expression` - expressions and operator tokens
//! - `statement` - statements and their branch targets
//! - `block` - basic blocks
//! - `function` - function bodies, natural block order and complexity
//! - `unit` - decoding and linking a whole translation unit

// Public exports - clean API surface
pub use self::block::Block;
pub use self::constant::{Constant, StringLiteral};
pub use self::decl::{Binding, Decl};
pub use self::error::{DecodeError, IrError, LinkError};
pub use self::expression::{binary_operator, unary_operator, Bound, Expression, Operator};
pub use self::function::{BodyBounds, Function};
pub use self::input::Node;
pub use self::statement::{Statement, StatementKind, MAX_CASE_RANGE};
pub use self::types::{
    Aggregate, AggregateTable, ArrayType, BooleanType, EnumType, FloatType, FunctionType, IntegerType, PointerType,
    Record, RecordType, Type, TypeCompareResult,
};
pub use self::unit::{Language, Unit};

// Internal modules
mod block;
mod constant;
mod decl;
mod error;
mod expression;
mod function;
mod input;
mod statement;
mod types;
mod unit;

#[cfg(test)]
mod tests;
