//! Statements within a basic block

use crate::constant::Constant;
use crate::error::{DecodeError, LinkError};
use crate::expression::{Bound, Expression};
use crate::input::Node;
use crate::types::AggregateTable;
use lh_common::source_loc::HasLocation;
use lh_common::{BindingId, BlockId, Location};
use std::collections::BTreeMap;
use std::fmt;

/// Most values a single `case low ... high` label may expand to
pub const MAX_CASE_RANGE: i128 = 1 << 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub location: Option<Location>,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Assignment {
        lhs: Expression,
        rhs: Vec<Expression>,
    },
    Cond {
        condition: Vec<Expression>,
        then_block: BlockId,
        else_block: BlockId,
    },
    Call {
        callee: Expression,
        lhs: Expression,
        args: Vec<Expression>,
    },
    Return(Option<Expression>),
    Switch {
        index: Expression,
        cases: BTreeMap<i128, BlockId>,
        default: Option<BlockId>,
    },
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self { location: None, kind }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Branch targets carried by this statement
    pub fn get_edges(&self) -> Vec<BlockId> {
        match &self.kind {
            StatementKind::Cond {
                then_block, else_block, ..
            } => vec![*then_block, *else_block],
            StatementKind::Switch { cases, default, .. } => cases.values().copied().chain(*default).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, StatementKind::Call { .. })
    }

    /// Rendered call target, for call statements
    pub fn callee_name(&self) -> Option<String> {
        match &self.kind {
            StatementKind::Call { callee, .. } => Some(callee.to_string()),
            _ => None,
        }
    }

    pub fn expressions(&self) -> Vec<&Expression> {
        match &self.kind {
            StatementKind::Assignment { lhs, rhs } => std::iter::once(lhs).chain(rhs).collect(),
            StatementKind::Cond { condition, .. } => condition.iter().collect(),
            StatementKind::Call { callee, lhs, args } => [callee, lhs].into_iter().chain(args).collect(),
            StatementKind::Return(value) => value.iter().collect(),
            StatementKind::Switch { index, .. } => vec![index],
        }
    }

    pub fn expressions_mut(&mut self) -> Vec<&mut Expression> {
        match &mut self.kind {
            StatementKind::Assignment { lhs, rhs } => std::iter::once(lhs).chain(rhs.iter_mut()).collect(),
            StatementKind::Cond { condition, .. } => condition.iter_mut().collect(),
            StatementKind::Call { callee, lhs, args } => [callee, lhs].into_iter().chain(args.iter_mut()).collect(),
            StatementKind::Return(value) => value.iter_mut().collect(),
            StatementKind::Switch { index, .. } => vec![index],
        }
    }

    pub fn for_each_bound_mut(&mut self, f: &mut dyn FnMut(&mut Bound)) {
        for expression in self.expressions_mut() {
            expression.for_each_bound_mut(f);
        }
    }

    pub(crate) fn resolve_aggregates(&mut self, table: &AggregateTable) -> Result<(), LinkError> {
        for expression in self.expressions_mut() {
            expression.resolve_aggregates(table)?;
        }
        Ok(())
    }

    /// An assignment of a single value to a compiler temporary folds into
    /// the temporary's name. Returns the temporary and its folded text.
    pub fn temporary_fold(&self) -> Option<(BindingId, String)> {
        match &self.kind {
            StatementKind::Assignment {
                lhs: Expression::Bound(Bound { id, decl: Some(decl), .. }),
                rhs,
            } if decl.is_temporary() => match rhs.as_slice() {
                [value] if !value.is_operator() => Some((*id, value.to_string())),
                _ => None,
            },
            _ => None,
        }
    }

    /// Decode one statement; ignored statement kinds yield `None`
    pub(crate) fn decode(node: &Node) -> Result<Option<Statement>, DecodeError> {
        let kind = match node.tag.as_str() {
            "exception-dispatch" => return Ok(None),
            "assign" => StatementKind::Assignment {
                lhs: Expression::decode_lvalue(node.child("lhs")?.descend_one()?)?,
                rhs: decode_all(node.child("rhs")?)?,
            },
            "if" => decode_cond(node)?,
            "call" => decode_call(node)?,
            "return" => match node.children.as_slice() {
                [] => StatementKind::Return(None),
                _ => StatementKind::Return(Some(Expression::decode(node.descend_one()?)?)),
            },
            "switch" => decode_switch(node)?,
            other => return Err(DecodeError::UnknownStatement(other.to_string())),
        };

        let location = match node.attr("location") {
            Some(text) => Some(text.parse()?),
            None => None,
        };
        Ok(Some(Statement { location, kind }))
    }
}

fn decode_all(node: &Node) -> Result<Vec<Expression>, DecodeError> {
    node.children.iter().map(Expression::decode).collect()
}

fn decode_cond(node: &Node) -> Result<StatementKind, DecodeError> {
    let mut condition = Vec::new();
    let mut then_block = None;
    let mut else_block = None;

    for child in &node.children {
        match child.tag.as_str() {
            "then" => then_block = Some(child.required_parse("id")?),
            "else" => else_block = Some(child.required_parse("id")?),
            _ => condition.push(Expression::decode(child)?),
        }
    }

    let missing = |child: &str| DecodeError::MissingChild {
        parent: node.tag.clone(),
        child: child.to_string(),
    };
    Ok(StatementKind::Cond {
        condition,
        then_block: then_block.ok_or_else(|| missing("then"))?,
        else_block: else_block.ok_or_else(|| missing("else"))?,
    })
}

fn decode_call(node: &Node) -> Result<StatementKind, DecodeError> {
    let callee = match node.find("function") {
        Some(function) => Expression::Bound(Bound {
            id: function.required_parse("id")?,
            hint: function.attr("name").map(str::to_string),
            decl: None,
        }),
        None => match node.children.first() {
            Some(first) => Expression::decode(first)?,
            None => {
                return Err(DecodeError::MissingChild {
                    parent: node.tag.clone(),
                    child: "function".to_string(),
                })
            }
        },
    };
    // Calls whose value is discarded may omit the target entirely
    let lhs = match node.find("lhs") {
        Some(lhs) => Expression::decode(lhs.descend_one()?)?,
        None => Expression::Void,
    };
    Ok(StatementKind::Call {
        callee,
        lhs,
        args: decode_all(node.child("args")?)?,
    })
}

fn case_value(node: &Node, label: &Node) -> Result<i128, DecodeError> {
    let malformed = || DecodeError::MalformedCase(format!("<{}> under case for block {:?}", label.tag, node.attr("id")));
    let constant = Constant::decode(label.descend_one()?)?;
    constant.as_integer().ok_or_else(malformed)
}

fn decode_switch(node: &Node) -> Result<StatementKind, DecodeError> {
    let index = Expression::decode(node.child("index")?.descend_one()?)?;
    let default = match node.find("default") {
        Some(default) => Some(default.required_parse("id")?),
        None => None,
    };

    // Overlapping ranges are not rejected: the last case written wins
    let mut cases = BTreeMap::new();
    for case in node.find_all("case") {
        let target: BlockId = case.required_parse("id")?;
        match case.children.as_slice() {
            [exact] if exact.tag == "exact" => {
                cases.insert(case_value(case, exact)?, target);
            }
            [low, high] if low.tag == "low-bound" && high.tag == "high-bound" => {
                let (low, high) = (case_value(case, low)?, case_value(case, high)?);
                if high.saturating_sub(low) >= MAX_CASE_RANGE {
                    return Err(DecodeError::CaseRangeTooWide {
                        low,
                        high,
                        limit: MAX_CASE_RANGE,
                    });
                }
                for value in low..=high {
                    cases.insert(value, target);
                }
            }
            other => {
                let tags: Vec<&str> = other.iter().map(|c| c.tag.as_str()).collect();
                return Err(DecodeError::MalformedCase(format!("case with children {tags:?}")));
            }
        }
    }

    Ok(StatementKind::Switch { index, cases, default })
}

impl HasLocation for Statement {
    fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

fn join(expressions: &[Expression], separator: &str) -> String {
    expressions.iter().map(ToString::to_string).collect::<Vec<_>>().join(separator)
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Assignment { lhs, rhs } => write!(f, "{lhs} = {}", join(rhs, " ")),
            StatementKind::Cond {
                condition,
                then_block,
                else_block,
            } => write!(
                f,
                "if ({})\n  goto bb{then_block};\nelse\n  goto bb{else_block}",
                join(condition, " ")
            ),
            StatementKind::Call { callee, lhs, args } => write!(f, "{lhs} = {callee}({})", join(args, ", ")),
            StatementKind::Return(Some(value)) => write!(f, "return {value}"),
            StatementKind::Return(None) => write!(f, "return"),
            StatementKind::Switch { index, cases, default } => {
                writeln!(f, "switch ({index})")?;
                writeln!(f, "{{")?;
                for (value, target) in cases {
                    writeln!(f, "  case {value}: goto bb{target};")?;
                }
                if let Some(default) = default {
                    writeln!(f, "  default: goto bb{default};")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
#[path = "statement_tests.rs"]
mod tests;
