//! Function bodies and their control-flow graph
//!
//! A function owns its declaration tables and its blocks keyed by id.
//! After linking every bound reference carries its declaration and every
//! edge names an existing block.

use crate::block::Block;
use crate::decl::Decl;
use crate::error::{DecodeError, LinkError};
use crate::input::Node;
use crate::types::{AggregateTable, Type};
use lh_common::{BindingId, BlockId, Location, PLACEHOLDER_BINDING};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// Line extent of a function body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyBounds {
    /// Line of the declaration itself
    pub declared: u32,
    pub begin: u32,
    pub end: u32,
}

impl BodyBounds {
    /// Lines from the earlier of declaration and body start to body end
    pub fn span(&self) -> u32 {
        let start = self.declared.min(self.begin);
        self.end.saturating_sub(start) + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub location: Location,
    pub body_bounds: Option<BodyBounds>,
    pub returns: Type,
    pub arguments: Vec<Decl>,
    pub entry: BlockId,
    pub locals: BTreeMap<BindingId, Decl>,
    /// Declared but not defined in this unit
    pub externals: BTreeMap<BindingId, Decl>,
    pub blocks: BTreeMap<BlockId, Block>,
}

impl Function {
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn entry_block(&self) -> Option<&Block> {
        self.blocks.get(&self.entry)
    }

    /// Find a declaration: arguments, then locals, then externals
    pub fn lookup(&self, id: BindingId) -> Option<&Decl> {
        self.arguments
            .iter()
            .find(|d| d.id() == id)
            .or_else(|| self.locals.get(&id))
            .or_else(|| self.externals.get(&id))
    }

    /// Blocks in the order execution is likely to reach them
    ///
    /// Breadth first from the entry, then anything unreachable in id
    /// order. The block with the highest id (the synthetic exit) goes last.
    pub fn blocks_in_natural_order(&self) -> Vec<&Block> {
        let mut order = Vec::with_capacity(self.blocks.len());
        let mut visited = BTreeSet::new();
        let mut worklist = VecDeque::new();

        if let Some(entry) = self.entry_block() {
            visited.insert(entry.id);
            worklist.push_back(entry);
        }
        while let Some(block) = worklist.pop_front() {
            order.push(block);
            for edge in block.get_edges() {
                if let Some(next) = self.blocks.get(&edge) {
                    if visited.insert(edge) {
                        worklist.push_back(next);
                    }
                }
            }
        }

        for block in self.blocks.values() {
            if !visited.contains(&block.id) {
                order.push(block);
            }
        }

        if let Some(last) = self.blocks.keys().next_back() {
            if let Some(position) = order.iter().position(|b| b.id == *last) {
                let exit = order.remove(position);
                order.push(exit);
            }
        }
        order
    }

    pub fn count_edges(&self) -> usize {
        self.blocks.values().map(|b| b.get_edges().len()).sum()
    }

    pub fn count_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn count_statements(&self) -> usize {
        self.blocks.values().map(|b| b.statements.len()).sum()
    }

    /// Edges minus blocks plus two
    pub fn cyclomatic_complexity(&self) -> i64 {
        self.count_edges() as i64 - self.count_blocks() as i64 + 2
    }

    /// Complexity per line of the function body
    pub fn complexity_raw_lines(&self) -> Option<f64> {
        let bounds = self.body_bounds?;
        Some(self.cyclomatic_complexity() as f64 / f64::from(bounds.span()))
    }

    /// Complexity per source line that produced at least one statement
    pub fn complexity_source_lines(&self) -> Option<f64> {
        let lines: BTreeSet<u32> = self
            .blocks
            .values()
            .flat_map(|b| b.statements_by_line())
            .filter_map(|(location, _)| location.map(|l| l.line))
            .collect();
        if lines.is_empty() {
            return None;
        }
        Some(self.cyclomatic_complexity() as f64 / lines.len() as f64)
    }

    /// `returns name(arguments)`
    pub fn declaration(&self) -> String {
        let arguments: Vec<String> = self.arguments.iter().map(ToString::to_string).collect();
        format!("{} {}({})", self.returns, self.name, arguments.join(", "))
    }

    pub(crate) fn decode(node: &Node) -> Result<Function, DecodeError> {
        if node.tag != "function" {
            return Err(DecodeError::UnexpectedTag {
                expected: "<function>".to_string(),
                found: node.tag.clone(),
            });
        }

        let name = node.required_attr("name")?.to_string();
        let location: Location = node.required_attr("location")?.parse()?;
        let body_bounds = match (node.parse_attr("body-begin")?, node.parse_attr("body-end")?) {
            (Some(begin), Some(end)) => Some(BodyBounds {
                declared: location.line,
                begin,
                end,
            }),
            _ => None,
        };
        let returns = Type::decode(node.child("returns")?.descend_one()?)?;

        let arguments: Vec<Decl> = match node.find("args") {
            Some(args) => args.children.iter().map(Decl::decode).collect::<Result<_, _>>()?,
            None => Vec::new(),
        };

        let body = node.child("body")?;
        let entry: BlockId = body.required_parse("entrypoint")?;

        let mut locals = BTreeMap::new();
        if let Some(list) = body.find("locals") {
            decode_decls(list, "local", &mut locals)?;
        }

        let mut externals = BTreeMap::new();
        for list in node.find_all("externals").chain(body.find_all("externals")) {
            decode_decls(list, "external", &mut externals)?;
        }

        let mut blocks = BTreeMap::new();
        for child in body.find_all("block") {
            let block = Block::decode(child)?;
            if blocks.contains_key(&block.id) {
                return Err(DecodeError::DuplicateId { what: "block", id: block.id });
            }
            blocks.insert(block.id, block);
        }

        if !blocks.contains_key(&entry) {
            return Err(DecodeError::MissingEntryBlock { function: name, entry });
        }

        trace!("decoded function {name} with {} blocks", blocks.len());
        Ok(Function {
            name,
            location,
            body_bounds,
            returns,
            arguments,
            entry,
            locals,
            externals,
            blocks,
        })
    }

    /// Resolve declaration and statement types, and attach structure
    /// member declarations to member references
    pub(crate) fn resolve_aggregates(
        &mut self,
        table: &AggregateTable,
        members: &BTreeMap<BindingId, Decl>,
    ) -> Result<(), LinkError> {
        self.returns.resolve_aggregates(table)?;
        for decl in self
            .arguments
            .iter_mut()
            .chain(self.locals.values_mut())
            .chain(self.externals.values_mut())
        {
            decl.ty.resolve_aggregates(table)?;
        }

        for block in self.blocks.values_mut() {
            for statement in &mut block.statements {
                statement.for_each_bound_mut(&mut |bound| {
                    if bound.decl.is_none() {
                        bound.decl = members.get(&bound.id).cloned();
                    }
                });
                statement.resolve_aggregates(table)?;
            }
        }
        Ok(())
    }

    /// Attach declarations to every bound reference, then fold temporaries
    pub(crate) fn resolve_bindings(&mut self) -> Result<(), LinkError> {
        let mut scope: BTreeMap<BindingId, Decl> = BTreeMap::new();
        for decl in self
            .arguments
            .iter()
            .chain(self.locals.values())
            .chain(self.externals.values())
        {
            scope.entry(decl.id()).or_insert_with(|| decl.clone());
        }

        let mut unresolved = None;
        for block in self.blocks.values_mut() {
            for statement in &mut block.statements {
                statement.for_each_bound_mut(&mut |bound| {
                    if bound.decl.is_none() {
                        bound.decl = scope.get(&bound.id).cloned();
                    }
                    if bound.decl.is_none() && bound.hint.is_none() && bound.id != PLACEHOLDER_BINDING {
                        unresolved.get_or_insert(bound.id);
                    }
                });
            }
        }
        if let Some(id) = unresolved {
            return Err(LinkError::UnresolvedBinding {
                function: self.name.clone(),
                id,
            });
        }

        self.fold_temporaries();
        Ok(())
    }

    fn fold_temporaries(&mut self) {
        let ids: Vec<BlockId> = self.blocks.keys().copied().collect();
        let mut folded = 0;

        for block_id in ids {
            let mut index = 0;
            loop {
                let fold = match self.blocks.get(&block_id).and_then(|b| b.statements.get(index)) {
                    Some(statement) => statement.temporary_fold(),
                    None => break,
                };
                match fold {
                    Some((id, text)) => {
                        self.apply_fold(id, &text);
                        if let Some(block) = self.blocks.get_mut(&block_id) {
                            block.statements.remove(index);
                        }
                        folded += 1;
                    }
                    None => index += 1,
                }
            }
        }
        debug!("{}: folded {folded} temporaries", self.name);
    }

    /// Record a folded value on the declaration and on every reference to it
    fn apply_fold(&mut self, id: BindingId, text: &str) {
        for decl in self
            .arguments
            .iter_mut()
            .chain(self.locals.values_mut())
            .chain(self.externals.values_mut())
            .filter(|d| d.id() == id)
        {
            decl.binding.folded = Some(text.to_string());
        }
        for block in self.blocks.values_mut() {
            for statement in &mut block.statements {
                statement.for_each_bound_mut(&mut |bound| {
                    if bound.id == id {
                        if let Some(decl) = bound.decl.as_mut() {
                            decl.binding.folded = Some(text.to_string());
                        }
                    }
                });
            }
        }
    }

    /// Every edge must name a block of this function
    pub(crate) fn check_edges(&self) -> Result<(), LinkError> {
        for block in self.blocks.values() {
            if let Some(to) = block.get_edges().into_iter().find(|e| !self.blocks.contains_key(e)) {
                return Err(LinkError::DanglingEdge {
                    function: self.name.clone(),
                    from: block.id,
                    to,
                });
            }
        }
        Ok(())
    }
}

fn decode_decls(list: &Node, what: &'static str, into: &mut BTreeMap<BindingId, Decl>) -> Result<(), DecodeError> {
    for child in &list.children {
        let decl = Decl::decode(child)?;
        if into.contains_key(&decl.id()) {
            return Err(DecodeError::DuplicateId { what, id: decl.id() });
        }
        into.insert(decl.id(), decl);
    }
    Ok(())
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.declaration())?;
        writeln!(f, "{{")?;
        for local in self.locals.values() {
            writeln!(f, "{local};")?;
        }
        writeln!(f, "goto bb{};", self.entry)?;
        for block in self.blocks.values() {
            writeln!(f)?;
            writeln!(f, "{block}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
#[path = "function_tests.rs"]
mod tests;
