//! Declarations and the bindings they introduce

use crate::error::DecodeError;
use crate::input::Node;
use crate::types::Type;
use lh_common::source_loc::HasLocation;
use lh_common::{BindingId, Location};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A declared name. Compiler temporaries have no name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub id: BindingId,
    pub name: Option<String>,
    /// Rendered value of a folded temporary
    pub folded: Option<String>,
}

impl Binding {
    pub fn new(id: BindingId, name: Option<&str>) -> Self {
        Self {
            id,
            name: name.map(str::to_string),
            folded: None,
        }
    }

    fn decode(node: &Node) -> Result<Binding, DecodeError> {
        Ok(Binding::new(node.required_parse("id")?, node.attr("name")))
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.folded) {
            (Some(name), _) => write!(f, "{name}"),
            (None, Some(folded)) => write!(f, "{folded}"),
            (None, None) => write!(f, "__tmp_{}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub location: Option<Location>,
    pub binding: Binding,
    pub ty: Type,
}

impl Decl {
    pub fn new(binding: Binding, ty: Type) -> Self {
        Self {
            location: None,
            binding,
            ty,
        }
    }

    pub fn id(&self) -> BindingId {
        self.binding.id
    }

    pub fn is_temporary(&self) -> bool {
        self.binding.name.is_none()
    }

    pub(crate) fn decode(node: &Node) -> Result<Decl, DecodeError> {
        let location = match node.attr("location") {
            Some(text) => Some(text.parse()?),
            None => None,
        };
        Ok(Decl {
            location,
            binding: Binding::decode(node.child("binding")?)?,
            ty: Type::decode(node.child("type")?.descend_one()?)?,
        })
    }
}

impl HasLocation for Decl {
    fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.binding)
    }
}
