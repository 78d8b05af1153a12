//! The checker interface
//!
//! A checker is a named set of handlers, each bound to the exact name of a
//! called function. The dispatcher hands every matching call to the handler
//! as a [`CallSite`] together with a [`Reporter`].

use crate::error::HandlerError;
use crate::report::Reporter;
use lh_common::Location;
use lh_ir::{Expression, Function, Statement, StatementKind, Unit};
use std::collections::BTreeMap;

/// One call statement and everything around it
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    pub unit: &'a Unit,
    pub function: &'a Function,
    pub statement: &'a Statement,
    /// Rendered call target
    pub callee: &'a str,
    /// Where the call's value goes
    pub lhs: &'a Expression,
    pub args: &'a [Expression],
}

impl<'a> CallSite<'a> {
    /// `None` unless `statement` is a call
    pub fn new(unit: &'a Unit, function: &'a Function, statement: &'a Statement, callee: &'a str) -> Option<Self> {
        match &statement.kind {
            StatementKind::Call { lhs, args, .. } => Some(CallSite {
                unit,
                function,
                statement,
                callee,
                lhs,
                args,
            }),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&'a Location> {
        self.statement.location.as_ref()
    }
}

pub type Handler = Box<dyn Fn(&CallSite<'_>, &mut Reporter<'_>) -> Result<(), HandlerError>>;

/// Callee name to handler
#[derive(Default)]
pub struct HandlerTable {
    handlers: BTreeMap<String, Handler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to calls of `callee`, replacing any earlier binding
    pub fn register(&mut self, callee: &str, handler: Handler) {
        self.handlers.insert(callee.to_string(), handler);
    }

    pub fn with(mut self, callee: &str, handler: Handler) -> Self {
        self.register(callee, handler);
        self
    }

    pub fn get(&self, callee: &str) -> Option<&Handler> {
        self.handlers.get(callee)
    }

    pub fn callees(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

pub trait Checker {
    fn name(&self) -> &str;

    fn handlers(&self) -> &HandlerTable;
}
