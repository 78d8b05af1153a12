//! Format string checking for the DS serialisation calls
//!
//! `dsUnpackMap(..., "i(32)s", &a, &b)` and friends take a format string
//! describing the types of their trailing arguments. Unpack calls take
//! pointers to storage, pack calls take values. Map calls take a symbol
//! before every item.
//!
//! Expected types are written as C spellings and built into [`Type`]s
//! against the unit, so typedef names with the same layout match.

use crate::checker::{CallSite, Checker, HandlerTable};
use crate::error::HandlerError;
use crate::report::Reporter;
use lh_ir::{Aggregate, Expression, Type, Unit};
use thiserror::Error;

pub const NAME: &str = "format-args";

/// Required type of the symbol in front of every map item
pub const SENTINEL_TYPE: &str = "struct DSSymbolNode*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Unpack,
    Pack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: &'static str,
    pub family: Family,
    /// Position of the format string in the argument list
    pub format_index: usize,
    pub map: bool,
}

pub const ENTRY_POINTS: [EntryPoint; 6] = [
    EntryPoint { name: "dsUnpackMap", family: Family::Unpack, format_index: 3, map: true },
    EntryPoint { name: "dsUnpackList", family: Family::Unpack, format_index: 3, map: false },
    EntryPoint { name: "dsPackListB", family: Family::Pack, format_index: 2, map: false },
    EntryPoint { name: "dsPackMapB", family: Family::Pack, format_index: 2, map: true },
    EntryPoint { name: "dsMakeListB", family: Family::Pack, format_index: 1, map: false },
    EntryPoint { name: "dsMakeMapB", family: Family::Pack, format_index: 1, map: true },
];

const UNPACK: &[(&str, &str)] = &[
    ("i(8)", "int8_t*"),
    ("i(16)", "int16_t*"),
    ("i(32)", "int32_t*"),
    ("i(64)", "int64_t*"),
    ("v(8)", "uint8_t*"),
    ("v(16)", "uint16_t*"),
    ("v(32)", "uint32_t*"),
    ("v(64)", "uint64_t*"),
    ("i(s)", "short int*"),
    ("i(l)", "long int*"),
    ("i(max)", "intmax_t*"),
    ("v(s)", "short unsigned int*"),
    ("v(l)", "long unsigned int*"),
    ("v(max)", "uintmax_t*"),
    ("i", "int*"),
    ("v", "unsigned int*"),
    ("j", "size_t*"),
    ("n", "struct NFast_Bignum**"),
    ("s", "char**"),
    ("h", "struct DSSymbolNode**"),
    ("b", "struct DSByteBlock*"),
    ("m", "struct DSMessage**"),
    ("l", "struct DSMessage**"),
    ("e", "struct DSMessage**"),
    ("d", "struct DSMessage**"),
];

const PACK: &[(&str, &str)] = &[
    ("i(8)", "int8_t"),
    ("i(16)", "int16_t"),
    ("i(32)", "int32_t"),
    ("i(64)", "int64_t"),
    ("v(8)", "uint8_t"),
    ("v(16)", "uint16_t"),
    ("v(32)", "uint32_t"),
    ("v(64)", "uint64_t"),
    ("i(s)", "short int"),
    ("i(l)", "long int"),
    ("i(max)", "intmax_t"),
    ("v(s)", "short unsigned int"),
    ("v(l)", "long unsigned int"),
    ("v(max)", "uintmax_t"),
    ("i", "int"),
    ("v", "unsigned int"),
    ("j", "size_t"),
    ("n", "struct NFast_Bignum*"),
    ("s", "const char*"),
    ("h", "struct DSSymbolNode*"),
    ("b", "struct DSByteBlock*"),
    ("m", "struct DSMessage*"),
    ("r", "struct DSMessage*"),
    ("e", "struct DSMessage**"),
];

impl Family {
    fn alphabet(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Family::Unpack => UNPACK,
            Family::Pack => PACK,
        }
    }
}

/// One decomposed item of a format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// An argument of this spelling
    Expect(&'static str),
    /// An argument that is consumed but not checked
    Skip,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown format string {remaining:?}")]
pub struct UnknownToken {
    /// The undecodable tail of the format string
    pub remaining: String,
}

/// Split a format string into descriptors, longest token first
pub fn decompose(format: &str, family: Family) -> Result<Vec<Descriptor>, UnknownToken> {
    let mut descriptors = Vec::new();
    let mut rest = format;

    while let Some(first) = rest.chars().next() {
        if first == '|' {
            rest = &rest[1..];
            continue;
        }
        if first == '-' || (family == Family::Unpack && first.is_ascii_uppercase()) {
            descriptors.push(Descriptor::Skip);
            rest = &rest[1..];
            continue;
        }

        let token = family
            .alphabet()
            .iter()
            .filter(|(token, _)| rest.starts_with(token))
            .max_by_key(|(token, _)| token.len());
        match token {
            Some((token, expected)) => {
                descriptors.push(Descriptor::Expect(expected));
                rest = &rest[token.len()..];
            }
            None => {
                return Err(UnknownToken {
                    remaining: rest.to_string(),
                })
            }
        }
    }
    Ok(descriptors)
}

/// Checks the trailing arguments of every entry point against its format
pub struct FormatArgsChecker {
    handlers: HandlerTable,
}

impl FormatArgsChecker {
    pub fn new() -> Self {
        let mut handlers = HandlerTable::new();
        for entry in ENTRY_POINTS {
            handlers.register(
                entry.name,
                Box::new(move |site: &CallSite<'_>, reporter: &mut Reporter<'_>| check_call(entry, site, reporter)),
            );
        }
        Self { handlers }
    }
}

impl Default for FormatArgsChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker for FormatArgsChecker {
    fn name(&self) -> &str {
        NAME
    }

    fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }
}

/// Check one call of `entry`
pub fn check_call(entry: EntryPoint, site: &CallSite<'_>, reporter: &mut Reporter<'_>) -> Result<(), HandlerError> {
    let name = entry.name;

    let Some(format) = site.args.get(entry.format_index) else {
        return Err(reporter.error(
            format!(
                "Not enough arguments to {name}: expected a format string as argument {}.",
                entry.format_index + 1
            ),
            site,
        ));
    };
    let Some(format) = format.string_literal() else {
        reporter.warning(
            format!(
                "Call to {name} has variable format string. Verify it will always correspond with the passed in types."
            ),
            site,
        );
        return Ok(());
    };

    let descriptors = decompose(&format, entry.family).map_err(|e| reporter.error(e.to_string(), site))?;

    let mut varargs = site.args[entry.format_index + 1..].iter();

    for (index, descriptor) in descriptors.iter().enumerate() {
        if entry.map {
            let symbol = next_argument(&mut varargs, site, reporter)?;
            if !matches_spelling(symbol, SENTINEL_TYPE, site.unit) {
                let actual = symbol.type_spelling();
                return Err(reporter.error(
                    format!("Symbol argument (index {index}) to {name} is not a DSSymbol, but a \"{actual}\"."),
                    site,
                ));
            }
        }

        let item = next_argument(&mut varargs, site, reporter)?;
        if let Descriptor::Expect(expected) = descriptor {
            if !matches_spelling(item, expected, site.unit) {
                let actual = item.type_spelling();
                return Err(reporter.error(
                    format!(
                        "Value argument (index {index}) to {name} is not a \"{expected}\" as specified, but a \"{actual}\"."
                    ),
                    site,
                ));
            }
        }
    }
    Ok(())
}

/// Integer spellings of the format alphabet as `(precision, unsigned)`
fn integer_layout(name: &str) -> Option<(u32, bool)> {
    let layout = match name {
        "char" | "int8_t" => (8, false),
        "uint8_t" => (8, true),
        "short int" | "int16_t" => (16, false),
        "short unsigned int" | "uint16_t" => (16, true),
        "int" | "int32_t" => (32, false),
        "unsigned int" | "uint32_t" => (32, true),
        "long int" | "intmax_t" | "int64_t" => (64, false),
        "long unsigned int" | "uintmax_t" | "uint64_t" | "size_t" => (64, true),
        _ => return None,
    };
    Some(layout)
}

/// Build the type a spelling such as `struct DSMessage**` names in `unit`
///
/// `None` when the spelling names a structure the unit never declares.
pub fn expected_type(spelling: &str, unit: &Unit) -> Option<Type> {
    let base = spelling.trim_end_matches('*');
    let depth = spelling.len() - base.len();
    let base = base.trim_end().trim_start_matches("const ");

    let mut ty = match base.strip_prefix("struct ") {
        Some(name) => unit.aggregates().values().find_map(|aggregate| match aggregate {
            Aggregate::Structure(record) if record.ty.name.as_deref() == Some(name) => Some(aggregate.as_type()),
            _ => None,
        })?,
        None => {
            let (precision, unsigned) = integer_layout(base)?;
            Type::integer(precision, unsigned)
        }
    };
    for _ in 0..depth {
        ty = Type::pointer_to(ty);
    }
    Some(ty)
}

fn matches_spelling(argument: &Expression, spelling: &str, unit: &Unit) -> bool {
    match (argument.get_type(), expected_type(spelling, unit)) {
        (Some(actual), Some(expected)) => actual.has_same_memory_layout(&expected),
        _ => false,
    }
}

fn next_argument<'a>(
    varargs: &mut std::slice::Iter<'a, Expression>,
    site: &CallSite<'_>,
    reporter: &mut Reporter<'_>,
) -> Result<&'a Expression, HandlerError> {
    varargs
        .next()
        .ok_or_else(|| reporter.error("Not enough arguments to varargs function.", site))
}
