//! Literal constants

use crate::error::DecodeError;
use crate::input::Node;
use crate::types::{decode_array, ArrayType, Type};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub ty: ArrayType,
    /// Unescaped contents, including any trailing NULs
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    String(StringLiteral),
    Integer { ty: Type, value: i128 },
    Float { ty: Type, text: String, value: f64 },
}

impl Constant {
    /// Strings decay to a pointer to their element type
    pub fn get_type(&self) -> Type {
        match self {
            Constant::String(s) => s.ty.decompose_to_pointer(),
            Constant::Integer { ty, .. } | Constant::Float { ty, .. } => ty.clone(),
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Constant::Integer { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(s) => Some(&s.value),
            _ => None,
        }
    }

    pub(crate) fn decode(node: &Node) -> Result<Constant, DecodeError> {
        if node.tag != "constant" {
            return Err(DecodeError::UnexpectedTag {
                expected: "<constant>".to_string(),
                found: node.tag.clone(),
            });
        }
        let (ty, value) = match node.children.as_slice() {
            [ty, value] => (ty, value),
            other => {
                return Err(DecodeError::UnexpectedTag {
                    expected: "a type and a value".to_string(),
                    found: format!("{} children", other.len()),
                })
            }
        };

        match value.tag.as_str() {
            "string-literal" => Ok(Constant::String(StringLiteral {
                ty: decode_array(ty)?,
                value: unescape(value.text())?,
            })),
            "integer-literal" => Ok(Constant::Integer {
                ty: Type::decode(ty)?,
                value: value.required_parse("value")?,
            }),
            "float-literal" => {
                let text = match value.attr("special") {
                    Some(special) => special,
                    None => value.required_attr("value")?,
                };
                let parsed = text.trim().parse().map_err(|_| DecodeError::InvalidAttribute {
                    tag: value.tag.clone(),
                    attribute: "value".to_string(),
                    value: text.to_string(),
                })?;
                Ok(Constant::Float {
                    ty: Type::decode(ty)?,
                    text: text.to_string(),
                    value: parsed,
                })
            }
            other => Err(DecodeError::UnknownConstant(other.to_string())),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::String(s) => write!(f, "{}", escape(&s.value)),
            Constant::Integer { value, .. } => write!(f, "{value}"),
            Constant::Float { text, .. } => write!(f, "{text}"),
        }
    }
}

/// Undo C string escapes. Bytes above 0x7f map to the matching code point.
fn unescape(text: &str) -> Result<String, DecodeError> {
    let bad = || DecodeError::BadEscape(text.to_string());
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or_else(bad)?;
        let value = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            'e' => '\x1b',
            '\\' | '\'' | '"' | '?' => escaped,
            'x' => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_hexdigit) {
                    digits.push(d);
                    chars.next();
                }
                let byte = u8::from_str_radix(&digits, 16).map_err(|_| bad())?;
                char::from(byte)
            }
            '0'..='7' => {
                let mut digits = escaped.to_string();
                while digits.len() < 3 {
                    match chars.peek().copied().filter(|d| ('0'..='7').contains(d)) {
                        Some(d) => {
                            digits.push(d);
                            chars.next();
                        }
                        None => break,
                    }
                }
                let byte = u8::from_str_radix(&digits, 8).map_err(|_| bad())?;
                char::from(byte)
            }
            _ => return Err(bad()),
        };
        out.push(value);
    }
    Ok(out)
}

/// Render as a C string literal
fn escape(value: &str) -> String {
    let mut out = String::from("\"");
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            ' '..='~' => out.push(c),
            // Octal escapes cannot swallow a following digit the way \x does
            c if (c as u32) < 0x100 => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
