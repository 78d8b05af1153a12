//! Basic blocks

use crate::error::DecodeError;
use crate::input::Node;
use crate::statement::Statement;
use lh_common::{BlockId, Location};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub statements: Vec<Statement>,
    /// Unconditional successors
    pub next: Vec<BlockId>,
}

impl Block {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            statements: Vec::new(),
            next: Vec::new(),
        }
    }

    /// Successors, unconditional ones first, then branch targets in
    /// statement order. Duplicates are kept.
    pub fn get_edges(&self) -> Vec<BlockId> {
        let mut edges = self.next.clone();
        for statement in &self.statements {
            edges.extend(statement.get_edges());
        }
        edges
    }

    /// Runs of consecutive statements that share a source line.
    /// A statement without a location stays in the current run.
    pub fn statements_by_line(&self) -> Vec<(Option<&Location>, Vec<&Statement>)> {
        let mut groups: Vec<(Option<&Location>, Vec<&Statement>)> = Vec::new();

        for statement in &self.statements {
            let here = statement.location.as_ref();
            let joins = match groups.last() {
                Some((current, _)) => {
                    current.is_none() || here.is_none() || here.map(|l| l.line) == current.map(|l| l.line)
                }
                None => false,
            };

            if !joins {
                groups.push((here, vec![statement]));
            } else if let Some((current, run)) = groups.last_mut() {
                if current.is_none() {
                    *current = here;
                }
                run.push(statement);
            }
        }
        groups
    }

    pub(crate) fn decode(node: &Node) -> Result<Block, DecodeError> {
        if node.tag != "block" {
            return Err(DecodeError::UnexpectedTag {
                expected: "<block>".to_string(),
                found: node.tag.clone(),
            });
        }

        let mut block = Block::new(node.required_parse("id")?);
        for child in &node.children {
            if child.tag == "next" {
                block.next.push(child.required_parse("id")?);
            } else if let Some(statement) = Statement::decode(child)? {
                block.statements.push(statement);
            }
        }
        Ok(block)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}:", self.id)?;
        for statement in &self.statements {
            for line in statement.to_string().lines() {
                write!(f, "\n  {line}")?;
            }
        }
        for next in &self.next {
            write!(f, "\n  goto bb{next}")?;
        }
        Ok(())
    }
}
