//! The tree document contract
//!
//! The upstream producer hands us one already-parsed translation unit as a
//! tree of tagged nodes with string attributes, optional text and ordered
//! children. Everything in this crate decodes from [`Node`]; documents are
//! exchanged as JSON.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One element of the tree document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// Parse a JSON-encoded document
    pub fn from_json(text: &str) -> Result<Node, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn required_attr(&self, name: &str) -> Result<&str, DecodeError> {
        self.attr(name).ok_or_else(|| DecodeError::MissingAttribute {
            tag: self.tag.clone(),
            attribute: name.to_string(),
        })
    }

    /// Parse an optional attribute
    pub fn parse_attr<T: FromStr>(&self, name: &str) -> Result<Option<T>, DecodeError> {
        match self.attr(name) {
            None => Ok(None),
            Some(value) => value.trim().parse().map(Some).map_err(|_| self.invalid(name, value)),
        }
    }

    /// Parse a required attribute
    pub fn required_parse<T: FromStr>(&self, name: &str) -> Result<T, DecodeError> {
        let value = self.required_attr(name)?;
        value.trim().parse().map_err(|_| self.invalid(name, value))
    }

    /// Boolean attributes are written as `'1'` when set and omitted otherwise
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.attr(name), Some(v) if !v.is_empty() && v != "0" && v != "false")
    }

    pub fn find(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// The first child with `tag`, which must exist
    pub fn child(&self, tag: &str) -> Result<&Node, DecodeError> {
        self.find(tag).ok_or_else(|| DecodeError::MissingChild {
            parent: self.tag.clone(),
            child: tag.to_string(),
        })
    }

    /// Descend into this node's single child
    pub fn descend_one(&self) -> Result<&Node, DecodeError> {
        match self.children.as_slice() {
            [only] => Ok(only),
            other => Err(DecodeError::ExpectedOneChild {
                tag: self.tag.clone(),
                found: other.len(),
            }),
        }
    }

    /// Text content, empty when absent
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    fn invalid(&self, name: &str, value: &str) -> DecodeError {
        DecodeError::InvalidAttribute {
            tag: self.tag.clone(),
            attribute: name.to_string(),
            value: value.to_string(),
        }
    }
}
