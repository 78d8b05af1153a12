//! Expressions appearing in statements
//!
//! Operators are kept as flat tokens in the order they appear in the tree,
//! so an assignment's right hand side reads like the source
//! (`a + b` is three expressions).

use crate::constant::Constant;
use crate::decl::Decl;
use crate::error::{DecodeError, LinkError};
use crate::input::Node;
use crate::types::{AggregateTable, Type};
use lh_common::BindingId;
use log::warn;
use std::fmt;

/// A reference to a declaration by binding id
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub id: BindingId,
    /// Name carried by the reference itself (call targets)
    pub hint: Option<String>,
    /// Attached during linking
    pub decl: Option<Decl>,
}

impl Bound {
    pub fn new(id: BindingId) -> Self {
        Self {
            id,
            hint: None,
            decl: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.decl.is_some()
    }

    fn decode(node: &Node) -> Result<Bound, DecodeError> {
        Ok(Bound {
            id: node.required_parse("id")?,
            hint: node.attr("name").map(str::to_string),
            decl: None,
        })
    }
}

/// An operator token and its C spelling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub tag: String,
    pub text: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Bound(Bound),
    MemberRef {
        structure: Box<Expression>,
        member: Box<Expression>,
    },
    ItemRef {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    Indirect(Box<Expression>),
    AddrOf(Box<Expression>),
    BinaryOp(Operator),
    UnaryOp(Operator),
    Constant(Constant),
    Void,
    /// The enclosing function's return slot
    Result,
}

pub fn binary_operator(tag: &str) -> Option<&'static str> {
    let text = match tag {
        "plus" | "pointer-offset" => "+",
        "minus" => "-",
        "multiply" => "*",
        "division-truncate" | "division-ceil" | "division-exact" | "division-round" | "division-real" => "/",
        "division-floor" => "//",
        "modulo-truncate" | "modulo-ceil" | "modulo-floor" | "modulo-round" => "%",
        "shift-left" | "rotate-left" => "<<",
        "shift-right" | "rotate-right" => ">>",
        "bitwise-or" => "|",
        "bitwise-xor" => "^",
        "bitwise-and" => "&",
        "logical-short-and" | "logical-and" => "&&",
        "logical-short-or" | "logical-or" => "||",
        "logical-xor" => "^^",
        "less-than" => "<",
        "less-than-or-equal" => "<=",
        "greater-than" => ">",
        "greater-than-or-equal" => ">=",
        "equal" => "==",
        "not-equal" => "!=",
        "min" => "min",
        "max" => "max",
        "unordered" => "unordered",
        "ordered" => "ordered",
        _ => return None,
    };
    Some(text)
}

pub fn unary_operator(tag: &str) -> Option<&'static str> {
    let text = match tag {
        "float" => "(float)",
        "fixed-point-truncate" => "(int)",
        "negate" => "-",
        "absolute" => "abs",
        "bitwise-not" => "~",
        "logical-not" => "!",
        "nop-convert" => "(reinterpret)",
        "exception-pointer" => "???",
        "convert" => "(convert)",
        "address-of" => "&",
        _ => return None,
    };
    Some(text)
}

impl Expression {
    pub fn get_type(&self) -> Option<Type> {
        match self {
            Expression::Bound(bound) => bound.decl.as_ref().map(|d| d.ty.clone()),
            Expression::MemberRef { member, .. } => member.get_type(),
            Expression::ItemRef { array, .. } => array.get_type()?.pointee().cloned(),
            Expression::Indirect(pointer) => pointer.get_type()?.pointee().cloned(),
            Expression::AddrOf(target) => match target.as_ref() {
                Expression::ItemRef { array, .. } if self.string_literal().is_some() => array.get_type(),
                _ => Some(Type::pointer_to(target.get_type()?)),
            },
            Expression::Constant(constant) => Some(constant.get_type()),
            Expression::Void => Some(Type::Void),
            Expression::BinaryOp(_) | Expression::UnaryOp(_) | Expression::Result => None,
        }
    }

    /// Rendered type, `<unknown>` when the expression has none
    pub fn type_spelling(&self) -> String {
        match self.get_type() {
            Some(ty) => ty.to_string(),
            None => "<unknown>".to_string(),
        }
    }

    /// The compile-time string this expression denotes, if provably one
    ///
    /// `&"abc"[n]` yields the literal from offset `n` on. Trailing NULs are
    /// dropped.
    pub fn string_literal(&self) -> Option<String> {
        let (value, offset) = match self {
            Expression::Constant(Constant::String(s)) => (&s.value, 0),
            Expression::AddrOf(target) => match target.as_ref() {
                Expression::ItemRef { array, index } => match (array.as_ref(), index.as_ref()) {
                    (Expression::Constant(Constant::String(s)), Expression::Constant(c)) => {
                        (&s.value, usize::try_from(c.as_integer()?).ok()?)
                    }
                    _ => return None,
                },
                _ => return None,
            },
            _ => return None,
        };
        let residual: String = value.chars().skip(offset).collect();
        Some(residual.trim_end_matches('\0').to_string())
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Expression::BinaryOp(_) | Expression::UnaryOp(_))
    }

    /// Visit every bound reference, outermost first
    pub fn for_each_bound<'a>(&'a self, f: &mut dyn FnMut(&'a Bound)) {
        match self {
            Expression::Bound(bound) => f(bound),
            Expression::MemberRef { structure: a, member: b } | Expression::ItemRef { array: a, index: b } => {
                a.for_each_bound(f);
                b.for_each_bound(f);
            }
            Expression::Indirect(inner) | Expression::AddrOf(inner) => inner.for_each_bound(f),
            _ => {}
        }
    }

    pub fn for_each_bound_mut(&mut self, f: &mut dyn FnMut(&mut Bound)) {
        match self {
            Expression::Bound(bound) => f(bound),
            Expression::MemberRef { structure: a, member: b } | Expression::ItemRef { array: a, index: b } => {
                a.for_each_bound_mut(f);
                b.for_each_bound_mut(f);
            }
            Expression::Indirect(inner) | Expression::AddrOf(inner) => inner.for_each_bound_mut(f),
            _ => {}
        }
    }

    /// Resolve the types embedded in constants and attached declarations
    pub(crate) fn resolve_aggregates(&mut self, table: &AggregateTable) -> Result<(), LinkError> {
        match self {
            Expression::Constant(Constant::String(s)) => s.ty.of.resolve_aggregates(table),
            Expression::Constant(Constant::Integer { ty, .. }) | Expression::Constant(Constant::Float { ty, .. }) => {
                ty.resolve_aggregates(table)
            }
            Expression::Bound(Bound { decl: Some(decl), .. }) => decl.ty.resolve_aggregates(table),
            Expression::MemberRef { structure: a, member: b } | Expression::ItemRef { array: a, index: b } => {
                a.resolve_aggregates(table)?;
                b.resolve_aggregates(table)
            }
            Expression::Indirect(inner) | Expression::AddrOf(inner) => inner.resolve_aggregates(table),
            _ => Ok(()),
        }
    }

    pub(crate) fn decode(node: &Node) -> Result<Expression, DecodeError> {
        let tag = node.tag.as_str();
        if is_lvalue_tag(tag) {
            return Expression::decode_lvalue(node);
        }
        if let Some(text) = binary_operator(tag) {
            return Ok(Expression::BinaryOp(Operator { tag: tag.to_string(), text }));
        }
        if let Some(text) = unary_operator(tag) {
            return Ok(Expression::UnaryOp(Operator { tag: tag.to_string(), text }));
        }

        match tag {
            "constant" => Ok(Expression::Constant(Constant::decode(node)?)),
            "addr-of" => Ok(Expression::AddrOf(Box::new(Expression::decode(node.descend_one()?)?))),
            "void" => Ok(Expression::Void),
            "function" => Expression::decode(node.descend_one()?),
            other => {
                warn!("expression <{other}> unhandled, using a placeholder binding");
                Ok(Expression::Bound(Bound::new(lh_common::PLACEHOLDER_BINDING)))
            }
        }
    }

    /// Decode an expression that can be assigned to
    pub(crate) fn decode_lvalue(node: &Node) -> Result<Expression, DecodeError> {
        let expression = match node.tag.as_str() {
            "bound" | "bound-parameter" => Expression::Bound(Bound::decode(node)?),
            "member-ref" => Expression::MemberRef {
                structure: Box::new(Expression::decode(node.child("structure")?.descend_one()?)?),
                member: Box::new(Expression::decode(node.child("member")?.descend_one()?)?),
            },
            "item-ref" => Expression::ItemRef {
                array: Box::new(Expression::decode(node.child("array")?.descend_one()?)?),
                index: Box::new(Expression::decode(node.child("index")?.descend_one()?)?),
            },
            "indirection" => Expression::Indirect(Box::new(Expression::decode_lvalue(node.descend_one()?)?)),
            "result" => Expression::Result,
            other => return Err(DecodeError::InvalidLvalue { found: other.to_string() }),
        };
        Ok(expression)
    }
}

fn is_lvalue_tag(tag: &str) -> bool {
    matches!(
        tag,
        "bound" | "bound-parameter" | "member-ref" | "item-ref" | "indirection" | "result"
    )
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Bound(bound) => match (&bound.decl, &bound.hint) {
                (Some(decl), _) => write!(f, "{}", decl.binding),
                (None, Some(hint)) => write!(f, "{hint}"),
                (None, None) => write!(f, "U.{}", bound.id),
            },
            Expression::MemberRef { structure, member } => write!(f, "{structure}.{member}"),
            Expression::ItemRef { array, index } => write!(f, "{array}[{index}]"),
            Expression::Indirect(pointer) => write!(f, "*{pointer}"),
            Expression::AddrOf(target) => write!(f, "&{target}"),
            Expression::BinaryOp(op) | Expression::UnaryOp(op) => write!(f, "{}", op.text),
            Expression::Constant(constant) => write!(f, "{constant}"),
            Expression::Void => write!(f, "(void)"),
            Expression::Result => write!(f, "__result"),
        }
    }
}

#[cfg(test)]
#[path = "expression_tests.rs"]
mod tests;
