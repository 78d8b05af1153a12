//! Whole-unit decode and link tests

use super::*;
use indoc::indoc;
use pretty_assertions::assert_eq;

const POINT_UNIT: &str = indoc! {r#"
    {
      "tag": "unit",
      "attributes": {"language": "C", "filename": "point.c"},
      "children": [
        {"tag": "raw-source", "text": "struct point { int x; struct point *next; };\nint main(void)\n{\n  struct point p;\n  return p.x;\n}\n"},
        {"tag": "referenced-types", "children": [
          {"tag": "structure", "attributes": {"id": "2", "name": "point"}, "children": [
            {"tag": "member", "children": [
              {"tag": "binding", "attributes": {"id": "100", "name": "x"}},
              {"tag": "type", "children": [{"tag": "integer", "attributes": {"name": "int", "precision": "32"}}]}
            ]},
            {"tag": "member", "children": [
              {"tag": "binding", "attributes": {"id": "101", "name": "next"}},
              {"tag": "type", "children": [{"tag": "addr-of", "children": [{"tag": "structure", "attributes": {"id": "2"}}]}]}
            ]}
          ]},
          {"tag": "array", "attributes": {"id": "3"}, "children": [
            {"tag": "type", "children": [{"tag": "structure", "attributes": {"id": "2"}}]},
            {"tag": "domain", "children": [{"tag": "integer", "attributes": {"precision": "64", "min": "0", "max": "3"}}]}
          ]}
        ]},
        {"tag": "function-bodies", "children": [
          {"tag": "function", "attributes": {"name": "main", "location": "point.c:2", "body-begin": "3", "body-end": "6"}, "children": [
            {"tag": "returns", "children": [{"tag": "integer", "attributes": {"name": "int", "precision": "32"}}]},
            {"tag": "args"},
            {"tag": "body", "attributes": {"entrypoint": "0"}, "children": [
              {"tag": "locals", "children": [
                {"tag": "decl", "attributes": {"location": "point.c:4:16"}, "children": [
                  {"tag": "binding", "attributes": {"id": "10", "name": "p"}},
                  {"tag": "type", "children": [{"tag": "structure", "attributes": {"id": "2"}}]}
                ]},
                {"tag": "decl", "children": [
                  {"tag": "binding", "attributes": {"id": "11"}},
                  {"tag": "type", "children": [{"tag": "integer", "attributes": {"name": "int", "precision": "32"}}]}
                ]},
                {"tag": "decl", "children": [
                  {"tag": "binding", "attributes": {"id": "12", "name": "ring"}},
                  {"tag": "type", "children": [{"tag": "array", "attributes": {"id": "3"}}]}
                ]}
              ]},
              {"tag": "block", "attributes": {"id": "0"}, "children": [
                {"tag": "assign", "attributes": {"location": "point.c:5:3"}, "children": [
                  {"tag": "lhs", "children": [{"tag": "bound", "attributes": {"id": "11"}}]},
                  {"tag": "rhs", "children": [
                    {"tag": "member-ref", "children": [
                      {"tag": "structure", "children": [{"tag": "bound", "attributes": {"id": "10"}}]},
                      {"tag": "member", "children": [{"tag": "bound", "attributes": {"id": "100"}}]}
                    ]}
                  ]}
                ]},
                {"tag": "return", "attributes": {"location": "point.c:5:3"}, "children": [{"tag": "bound", "attributes": {"id": "11"}}]},
                {"tag": "next", "attributes": {"id": "1"}}
              ]},
              {"tag": "block", "attributes": {"id": "1"}, "children": [{"tag": "return"}]}
            ]},
            {"tag": "externals"}
          ]}
        ]}
      ]
    }
"#};

fn point_unit() -> Unit {
    Unit::from_json(POINT_UNIT).unwrap()
}

#[test]
fn test_unit_header() {
    let unit = point_unit();
    assert_eq!(unit.language(), Language::C);
    assert_eq!(unit.filename(), "point.c");
    assert_eq!(unit.source().lines().count(), 6);
    assert_eq!(unit.functions().len(), 1);
    assert!(unit.function("main").is_some());
    assert!(unit.function("helper").is_none());
}

#[test]
fn test_aggregates_resolved() {
    let unit = point_unit();
    let main = unit.function("main").unwrap();

    let point = &main.locals[&10].ty;
    assert_eq!(point.to_string(), "struct point");
    assert_eq!(main.locals[&12].ty.to_string(), "struct point[3]");

    let members = unit.members_of(point).unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1].to_string(), "struct point* next");
    assert!(members.iter().all(|m| m.ty.is_resolved()));

    let next = unit.resolve_member(point, "next").unwrap();
    assert_eq!(next.ty.pointee(), Some(point));
    assert!(unit.resolve_member(point, "prev").is_none());
    assert!(unit.members_of(&main.locals[&11].ty).is_none());
}

#[test]
fn test_member_reference_and_folding() {
    let unit = point_unit();
    let main = unit.function("main").unwrap();

    let entry = main.entry_block().unwrap();
    assert_eq!(entry.statements.len(), 1);
    assert_eq!(entry.statements[0].to_string(), "return p.x");
    assert_eq!(main.locals[&11].binding.to_string(), "p.x");
    assert_eq!(main.cyclomatic_complexity(), 1);
}

#[test]
fn test_member_reference_types() {
    let unit = point_unit();
    let main = unit.function("main").unwrap();
    let block = main.block(0).unwrap();

    let StatementKind::Return(Some(Expression::Bound(bound))) = &block.statements[0].kind else {
        panic!("expected a return of a bound value");
    };
    assert_eq!(bound.decl.as_ref().map(|d| d.ty.to_string()), Some("int".to_string()));
}

#[test]
fn test_resolution_is_idempotent() {
    let mut unit = point_unit();
    let before = unit.clone();
    unit.resolve_aggregates().unwrap();
    assert_eq!(unit, before);
}

#[test]
fn test_invalid_language() {
    let text = POINT_UNIT.replace(r#""language": "C""#, r#""language": "Fortran""#);
    assert_eq!(
        Unit::from_json(&text),
        Err(IrError::Decode(DecodeError::InvalidLanguage("Fortran".to_string())))
    );

    let cxx = POINT_UNIT.replace(r#""language": "C""#, r#""language": "C++""#);
    assert_eq!(Unit::from_json(&cxx).unwrap().language(), Language::Cxx);
}

#[test]
fn test_unresolved_aggregate_is_fatal() {
    // the array element type points at a structure that was never emitted
    let text = POINT_UNIT.replace(r#"{"id": "2"}}]},"#, r#"{"id": "9"}}]},"#);
    assert_ne!(text, POINT_UNIT);
    assert_eq!(
        Unit::from_json(&text),
        Err(IrError::Link(LinkError::UnresolvedAggregate { id: 9 }))
    );
}

#[test]
fn test_duplicate_aggregate() {
    let text = POINT_UNIT.replace(r#""tag": "array", "attributes": {"id": "3"}, "children""#, r#""tag": "array", "attributes": {"id": "2"}, "children""#);
    assert_eq!(
        Unit::from_json(&text),
        Err(IrError::Decode(DecodeError::DuplicateId { what: "aggregate", id: 2 }))
    );
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        Unit::from_json("{\"tag\": "),
        Err(IrError::Decode(DecodeError::Document(_)))
    ));
}
