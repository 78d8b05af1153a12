//! C type model
//!
//! Types are decoded from the tree document and answer one question for the
//! checkers: how does a value of type A behave when used where type B is
//! expected ([`Type::compare`]).
//!
//! Structures and unions may point to themselves, so outside the unit's
//! aggregate arena they are represented by a [`RecordType`] handle (identity,
//! name, constness). Their member declarations stay in the arena and are
//! reached through [`crate::Unit`]. Arrays cannot contain themselves and are
//! resolved in place.

use crate::decl::Decl;
use crate::error::{DecodeError, LinkError};
use crate::input::Node;
use lh_common::TypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The unit's aggregate arena
pub type AggregateTable = BTreeMap<TypeId, Aggregate>;

/// How a value of one type relates to another type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCompareResult {
    /// Types are equal modulo constness
    Equal,
    /// Compatible unsigned integers, through zero extension
    ZeroExtend,
    /// Compatible integers, through sign extension
    SignExtend,
    /// Compatible integers, through truncation
    Truncate,
    /// Compatible through floating point conversion
    FloatResize,
    Incompatible,
}

impl TypeCompareResult {
    pub fn has_same_memory_layout(self) -> bool {
        matches!(self, TypeCompareResult::Equal)
    }
}

impl fmt::Display for TypeCompareResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TypeCompareResult::Equal => "equal",
            TypeCompareResult::ZeroExtend => "zero-extend",
            TypeCompareResult::SignExtend => "sign-extend",
            TypeCompareResult::Truncate => "truncate",
            TypeCompareResult::FloatResize => "float-resize",
            TypeCompareResult::Incompatible => "incompatible",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerType {
    pub id: TypeId,
    pub constant: bool,
    pub name: Option<String>,
    pub precision: u32,
    pub unsigned: bool,
    pub min: Option<i128>,
    pub max: Option<i128>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatType {
    pub id: TypeId,
    pub constant: bool,
    pub name: Option<String>,
    pub precision: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanType {
    pub id: TypeId,
    pub constant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerType {
    pub id: TypeId,
    pub constant: bool,
    pub of: Box<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayType {
    pub id: TypeId,
    pub constant: bool,
    pub name: Option<String>,
    pub of: Box<Type>,
    /// Highest valid index, when the domain is known
    pub bound: Option<i128>,
}

impl ArrayType {
    /// The pointer an array decays to
    pub fn decompose_to_pointer(&self) -> Type {
        Type::pointer_to((*self.of).clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionType {
    pub id: TypeId,
    pub constant: bool,
    pub name: Option<String>,
    pub returns: Box<Type>,
    pub arguments: Vec<Type>,
    pub varargs: bool,
}

/// Identity handle for a structure or union
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordType {
    pub id: TypeId,
    pub constant: bool,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub id: TypeId,
    pub constant: bool,
    pub name: Option<String>,
}

/// C types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Integer(IntegerType),
    Float(FloatType),
    Boolean(BooleanType),
    Void,
    Pointer(PointerType),
    Array(ArrayType),
    Function(FunctionType),
    Structure(RecordType),
    Union(RecordType),
    Enum(EnumType),
    /// Forward reference into the aggregate arena; gone after linking
    AggregateRef(TypeId),
}

impl Type {
    /// Anonymous integer type, used for synthetic comparisons
    pub fn integer(precision: u32, unsigned: bool) -> Type {
        Type::Integer(IntegerType {
            id: 0,
            constant: false,
            name: None,
            precision,
            unsigned,
            min: None,
            max: None,
        })
    }

    pub fn float(precision: u32) -> Type {
        Type::Float(FloatType {
            id: 0,
            constant: false,
            name: None,
            precision,
        })
    }

    pub fn boolean() -> Type {
        Type::Boolean(BooleanType { id: 0, constant: false })
    }

    pub fn pointer_to(of: Type) -> Type {
        Type::Pointer(PointerType {
            id: 0,
            constant: false,
            of: Box::new(of),
        })
    }

    /// `(id, constant)` for kinds that carry an identity
    pub fn identity(&self) -> Option<(TypeId, bool)> {
        match self {
            Type::Integer(t) => Some((t.id, t.constant)),
            Type::Float(t) => Some((t.id, t.constant)),
            Type::Boolean(t) => Some((t.id, t.constant)),
            Type::Pointer(t) => Some((t.id, t.constant)),
            Type::Array(t) => Some((t.id, t.constant)),
            Type::Function(t) => Some((t.id, t.constant)),
            Type::Structure(t) | Type::Union(t) => Some((t.id, t.constant)),
            Type::Enum(t) => Some((t.id, t.constant)),
            Type::Void | Type::AggregateRef(_) => None,
        }
    }

    /// Identity equality: both ids nonzero and equal, constness equal
    pub fn same_identity(&self, other: &Type) -> bool {
        match (self.identity(), other.identity()) {
            (Some((a, ca)), Some((b, cb))) => a != 0 && a == b && ca == cb,
            _ => false,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.identity().is_some_and(|(_, constant)| constant)
    }

    /// The type pointed to, or the element type of an array
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(p) => Some(&p.of),
            Type::Array(a) => Some(&a.of),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            Type::AggregateRef(_) => false,
            Type::Pointer(p) => p.of.is_resolved(),
            Type::Array(a) => a.of.is_resolved(),
            Type::Function(f) => f.returns.is_resolved() && f.arguments.iter().all(Type::is_resolved),
            _ => true,
        }
    }

    /// Compare `self`, used where a value of `other` is expected
    pub fn compare(&self, other: &Type) -> TypeCompareResult {
        use TypeCompareResult::*;

        match self {
            Type::Integer(int) => match other {
                // Bools are effectively zero extended
                Type::Boolean(_) => ZeroExtend,
                Type::Float(_) => FloatResize,
                Type::Integer(theirs) => {
                    if int.precision == theirs.precision && int.unsigned == theirs.unsigned {
                        Equal
                    } else if int.precision > theirs.precision {
                        Truncate
                    } else if int.unsigned {
                        ZeroExtend
                    } else {
                        SignExtend
                    }
                }
                _ => Incompatible,
            },
            Type::Float(float) => match other {
                Type::Integer(_) => FloatResize,
                Type::Float(theirs) if theirs.precision == float.precision => Equal,
                Type::Float(_) => FloatResize,
                _ => Incompatible,
            },
            Type::Boolean(_) => match other {
                Type::Boolean(_) => Equal,
                Type::Integer(_) | Type::Float(_) => Type::integer(8, true).compare(other),
                _ => Incompatible,
            },
            Type::Void => match other {
                Type::Void => Equal,
                _ => Incompatible,
            },
            Type::Pointer(pointer) => match other {
                Type::Pointer(theirs) => pointer.of.compare(&theirs.of),
                _ => Incompatible,
            },
            // TODO: compare function return and argument types member-wise
            // instead of by identity alone
            Type::Structure(_) | Type::Union(_) | Type::Enum(_) | Type::Array(_) | Type::Function(_) => {
                if self.same_identity(other) {
                    Equal
                } else {
                    Incompatible
                }
            }
            Type::AggregateRef(_) => Incompatible,
        }
    }

    pub fn has_same_memory_layout(&self, other: &Type) -> bool {
        self.compare(other).has_same_memory_layout()
    }

    /// Replace every aggregate reference with its arena entry
    pub fn resolve_aggregates(&mut self, table: &AggregateTable) -> Result<(), LinkError> {
        self.resolve_within(table, &mut Vec::new())
    }

    fn resolve_within(&mut self, table: &AggregateTable, arrays: &mut Vec<TypeId>) -> Result<(), LinkError> {
        match self {
            Type::AggregateRef(id) => {
                *self = resolve_reference(*id, table, arrays)?;
                Ok(())
            }
            Type::Pointer(p) => p.of.resolve_within(table, arrays),
            Type::Array(a) => a.of.resolve_within(table, arrays),
            Type::Function(f) => {
                f.returns.resolve_within(table, arrays)?;
                for argument in &mut f.arguments {
                    argument.resolve_within(table, arrays)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Decode a type in value position. Aggregates become forward references.
    pub(crate) fn decode(node: &Node) -> Result<Type, DecodeError> {
        let id = node.parse_attr::<TypeId>("id")?.unwrap_or(0);
        let constant = node.flag("constant");
        let name = node.attr("name").map(str::to_string);

        let ty = match node.tag.as_str() {
            "integer" => Type::Integer(IntegerType {
                id,
                constant,
                name,
                precision: node.required_parse("precision")?,
                unsigned: node.flag("unsigned"),
                min: node.parse_attr("min")?,
                max: node.parse_attr("max")?,
            }),
            "float" => Type::Float(FloatType {
                id,
                constant,
                name,
                precision: node.required_parse("precision")?,
            }),
            "boolean" => Type::Boolean(BooleanType { id, constant }),
            "void" => Type::Void,
            "addr-of" => Type::Pointer(PointerType {
                id,
                constant,
                of: Box::new(Type::decode(node.descend_one()?)?),
            }),
            "enum" => Type::Enum(EnumType { id, constant, name }),
            "function" => {
                let returns = Type::decode(node.child("return")?.descend_one()?)?;
                let arguments = node.child("arguments")?;
                Type::Function(FunctionType {
                    id,
                    constant,
                    name,
                    returns: Box::new(returns),
                    arguments: arguments.children.iter().map(Type::decode).collect::<Result<_, _>>()?,
                    varargs: arguments.flag("varargs"),
                })
            }
            "structure" | "union" | "array" => Type::AggregateRef(node.required_parse("id")?),
            other => return Err(DecodeError::UnknownType(other.to_string())),
        };
        Ok(ty)
    }
}

fn resolve_reference(id: TypeId, table: &AggregateTable, arrays: &mut Vec<TypeId>) -> Result<Type, LinkError> {
    match table.get(&id) {
        None => Err(LinkError::UnresolvedAggregate { id }),
        Some(Aggregate::Structure(record)) => Ok(Type::Structure(record.ty.clone())),
        Some(Aggregate::Union(record)) => Ok(Type::Union(record.ty.clone())),
        Some(Aggregate::Array(array)) => {
            if arrays.contains(&id) {
                return Err(LinkError::CyclicArray { id });
            }
            arrays.push(id);
            let mut resolved = array.clone();
            resolved.of.resolve_within(table, arrays)?;
            arrays.pop();
            Ok(Type::Array(resolved))
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer(int) => {
                if int.constant {
                    write!(f, "const ")?;
                }
                match &int.name {
                    Some(name) => write!(f, "{name}"),
                    None if int.unsigned => write!(f, "uint{}", int.precision),
                    None => write!(f, "int{}", int.precision),
                }
            }
            Type::Float(float) => match &float.name {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "float{}", float.precision),
            },
            Type::Boolean(_) => write!(f, "bool"),
            Type::Void => write!(f, "void"),
            Type::Pointer(p) => write!(f, "{}*", p.of),
            Type::Array(a) => match a.bound {
                Some(bound) => write!(f, "{}[{bound}]", a.of),
                None => write!(f, "{}[]", a.of),
            },
            Type::Function(func) => {
                write!(f, "{} {}(", func.returns, func.name.as_deref().unwrap_or(""))?;
                for (i, argument) in func.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
            Type::Structure(RecordType { name: Some(name), .. }) => write!(f, "struct {name}"),
            Type::Structure(RecordType { name: None, .. }) => write!(f, "struct <anonymous>"),
            Type::Union(RecordType { name: Some(name), .. }) => write!(f, "union {name}"),
            Type::Union(RecordType { name: None, .. }) => write!(f, "union <anonymous>"),
            Type::Enum(EnumType { name: Some(name), .. }) => write!(f, "enum {name}"),
            Type::Enum(EnumType { name: None, .. }) => write!(f, "<anonymous enum>"),
            Type::AggregateRef(id) => write!(f, "{{type {id}}}"),
        }
    }
}

/// Structure or union definition as stored in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub ty: RecordType,
    pub members: Vec<Decl>,
}

impl Record {
    pub fn resolve_member(&self, name: &str) -> Option<&Decl> {
        self.members.iter().find(|m| m.binding.name.as_deref() == Some(name))
    }
}

/// An entry of the unit's aggregate arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Aggregate {
    Structure(Record),
    Union(Record),
    Array(ArrayType),
}

impl Aggregate {
    pub fn id(&self) -> TypeId {
        match self {
            Aggregate::Structure(r) | Aggregate::Union(r) => r.ty.id,
            Aggregate::Array(a) => a.id,
        }
    }

    /// Member declarations; arrays have none
    pub fn members(&self) -> &[Decl] {
        match self {
            Aggregate::Structure(r) | Aggregate::Union(r) => &r.members,
            Aggregate::Array(_) => &[],
        }
    }

    /// The value-position type for this aggregate
    pub fn as_type(&self) -> Type {
        match self {
            Aggregate::Structure(r) => Type::Structure(r.ty.clone()),
            Aggregate::Union(r) => Type::Union(r.ty.clone()),
            Aggregate::Array(a) => Type::Array(a.clone()),
        }
    }

    /// Resolve the types inside this entry against the whole arena
    pub(crate) fn resolve_interior(&mut self, table: &AggregateTable) -> Result<(), LinkError> {
        match self {
            Aggregate::Structure(r) | Aggregate::Union(r) => {
                for member in &mut r.members {
                    member.ty.resolve_aggregates(table)?;
                }
                Ok(())
            }
            Aggregate::Array(a) => {
                let mut arrays = vec![a.id];
                a.of.resolve_within(table, &mut arrays)
            }
        }
    }

    pub(crate) fn decode(node: &Node) -> Result<Aggregate, DecodeError> {
        match node.tag.as_str() {
            "structure" | "union" => {
                let ty = RecordType {
                    id: node.required_parse("id")?,
                    constant: node.flag("constant"),
                    name: node.attr("name").map(str::to_string),
                };
                let members = node
                    .children
                    .iter()
                    .map(|member| {
                        if member.tag != "member" {
                            return Err(DecodeError::UnexpectedTag {
                                expected: "<member>".to_string(),
                                found: member.tag.clone(),
                            });
                        }
                        Decl::decode(member)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let record = Record { ty, members };
                Ok(if node.tag == "union" {
                    Aggregate::Union(record)
                } else {
                    Aggregate::Structure(record)
                })
            }
            "array" => Ok(Aggregate::Array(decode_array(node)?)),
            other => Err(DecodeError::UnexpectedTag {
                expected: "an aggregate type".to_string(),
                found: other.to_string(),
            }),
        }
    }
}

/// Decode a full array definition (arena entries and string literal types)
pub(crate) fn decode_array(node: &Node) -> Result<ArrayType, DecodeError> {
    if node.tag != "array" {
        return Err(DecodeError::UnexpectedTag {
            expected: "<array>".to_string(),
            found: node.tag.clone(),
        });
    }

    let of = Type::decode(node.child("type")?.descend_one()?)?;
    let bound = match node.find("domain") {
        Some(domain) => match Type::decode(domain.descend_one()?)? {
            Type::Integer(IntegerType { min: Some(_), max: Some(max), .. }) => Some(max),
            _ => None,
        },
        None => None,
    };

    Ok(ArrayType {
        id: node.parse_attr("id")?.unwrap_or(0),
        constant: node.flag("constant"),
        name: node.attr("name").map(str::to_string),
        of: Box::new(of),
        bound,
    })
}
