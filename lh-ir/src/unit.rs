//! Translation units
//!
//! A [`Unit`] is only ever produced fully linked: decoding and both
//! finalization passes run inside [`Unit::from_document`].

use crate::decl::Decl;
use crate::error::{DecodeError, IrError, LinkError};
use crate::function::Function;
use crate::input::Node;
use crate::types::{Aggregate, AggregateTable, Type};
use lh_common::{BindingId, TypeId};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    C,
    Cxx,
}

impl FromStr for Language {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(Language::C),
            "C++" => Ok(Language::Cxx),
            other => Err(DecodeError::InvalidLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::C => write!(f, "C"),
            Language::Cxx => write!(f, "C++"),
        }
    }
}

/// One translation unit: its source, its aggregate types and its functions
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    source: String,
    language: Language,
    filename: String,
    aggregates: AggregateTable,
    functions: Vec<Function>,
}

impl Unit {
    /// Decode and link a document
    pub fn from_document(root: &Node) -> Result<Unit, IrError> {
        let mut unit = Unit::decode(root)?;
        unit.finalise()?;
        Ok(unit)
    }

    pub fn from_json(text: &str) -> Result<Unit, IrError> {
        Unit::from_document(&Node::from_json(text)?)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn aggregates(&self) -> &AggregateTable {
        &self.aggregates
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn aggregate(&self, id: TypeId) -> Option<&Aggregate> {
        self.aggregates.get(&id)
    }

    /// Member declarations of a structure or union
    pub fn members_of(&self, ty: &Type) -> Option<&[Decl]> {
        match ty {
            Type::Structure(record) | Type::Union(record) => self.aggregate(record.id).map(Aggregate::members),
            _ => None,
        }
    }

    pub fn resolve_member(&self, ty: &Type, name: &str) -> Option<&Decl> {
        self.members_of(ty)?
            .iter()
            .find(|m| m.binding.name.as_deref() == Some(name))
    }

    pub(crate) fn decode(root: &Node) -> Result<Unit, DecodeError> {
        let language = root.required_attr("language")?.parse()?;
        let filename = root.required_attr("filename")?.to_string();
        let source = root.child("raw-source")?.text().to_string();

        let mut aggregates = AggregateTable::new();
        for node in &root.child("referenced-types")?.children {
            let aggregate = Aggregate::decode(node)?;
            let id = aggregate.id();
            if aggregates.insert(id, aggregate).is_some() {
                return Err(DecodeError::DuplicateId { what: "aggregate", id });
            }
        }

        let functions = root
            .child("function-bodies")?
            .children
            .iter()
            .map(Function::decode)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "decoded {filename}: {} aggregates, {} functions",
            aggregates.len(),
            functions.len()
        );
        Ok(Unit {
            source,
            language,
            filename,
            aggregates,
            functions,
        })
    }

    pub(crate) fn finalise(&mut self) -> Result<(), LinkError> {
        self.resolve_aggregates()?;

        let members: BTreeMap<BindingId, Decl> = self
            .aggregates
            .values()
            .flat_map(Aggregate::members)
            .map(|m| (m.id(), m.clone()))
            .collect();

        for function in &mut self.functions {
            function.resolve_aggregates(&self.aggregates, &members)?;
            function.resolve_bindings()?;
            function.check_edges()?;
        }
        debug!("linked {}", self.filename);
        Ok(())
    }

    /// Resolve the arena against itself. A no-op once resolved.
    pub(crate) fn resolve_aggregates(&mut self) -> Result<(), LinkError> {
        let snapshot = self.aggregates.clone();
        for aggregate in self.aggregates.values_mut() {
            aggregate.resolve_interior(&snapshot)?;
        }
        Ok(())
    }
}
