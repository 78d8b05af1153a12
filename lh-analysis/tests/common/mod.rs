//! Builders for small units made of call statements
#![allow(dead_code)]

use lh_ir::{Node, Unit};

pub const SOURCE_FILE: &str = "pack.c";

/// Locals every fixture function declares
pub const SYMBOL: u32 = 10;
pub const COUNT: u32 = 11;
pub const LENGTH: u32 = 12;
pub const FORMAT: u32 = 13;
pub const VALUE: u32 = 14;
pub const MESSAGE: u32 = 15;
pub const WIDTH: u32 = 16;
pub const DICT: u32 = 17;
/// `ds_int*`, a typedef name for a 32 bit signed integer
pub const ALIAS: u32 = 18;

const SYMBOL_NODE: u32 = 1;
const MESSAGE_NODE: u32 = 2;

pub fn integer(name: &str, precision: u32) -> Node {
    Node::new("integer").with_attr("name", name).with_attr("precision", precision)
}

pub fn pointer(to: Node) -> Node {
    Node::new("addr-of").with_child(to)
}

pub fn structure(id: u32) -> Node {
    Node::new("structure").with_attr("id", id)
}

pub fn decl(id: u32, name: &str, ty: Node) -> Node {
    Node::new("decl").with_children([
        Node::new("binding").with_attr("id", id).with_attr("name", name),
        Node::new("type").with_child(ty),
    ])
}

pub fn bound(id: u32) -> Node {
    Node::new("bound").with_attr("id", id)
}

fn int_constant(value: i64) -> Node {
    Node::new("constant").with_children([
        integer("int", 32),
        Node::new("integer-literal").with_attr("value", value),
    ])
}

/// `&"text"[0]`, the shape string literal arguments arrive in
pub fn literal(text: &str) -> Node {
    let ty = Node::new("array").with_children([
        Node::new("type").with_child(integer("char", 8)),
        Node::new("domain").with_child(
            Node::new("integer")
                .with_attr("precision", 64)
                .with_attr("min", 0)
                .with_attr("max", text.len() + 1),
        ),
    ]);
    let string = Node::new("constant").with_children([ty, Node::new("string-literal").with_text(text)]);
    pointer(Node::new("item-ref").with_children([
        Node::new("array").with_child(string),
        Node::new("index").with_child(int_constant(0)),
    ]))
}

/// A call to `callee` on source line `line`
pub fn call(callee: &str, line: u32, args: Vec<Node>) -> Node {
    Node::new("call")
        .with_attr("location", format!("{SOURCE_FILE}:{line}:5"))
        .with_children([
            Node::new("function").with_attr("id", 900).with_attr("name", callee),
            Node::new("args").with_children(args),
        ])
}

/// Leading arguments up to the format position, all `dict`
pub fn leading(count: usize) -> Vec<Node> {
    (0..count).map(|_| bound(DICT)).collect()
}

/// A function whose blocks hold `blocks` in order, chained by fall-through
pub fn function(name: &str, blocks: Vec<Vec<Node>>) -> Node {
    let locals = Node::new("locals").with_children([
        decl(SYMBOL, "sym", pointer(structure(SYMBOL_NODE))),
        decl(COUNT, "count", pointer(integer("int", 32))),
        decl(LENGTH, "length", pointer(integer("long int", 64))),
        decl(FORMAT, "fmt", pointer(integer("char", 8))),
        decl(VALUE, "value", integer("int", 32)),
        decl(MESSAGE, "msg", pointer(structure(MESSAGE_NODE))),
        decl(WIDTH, "width", pointer(integer("int32_t", 32))),
        decl(DICT, "dict", pointer(structure(MESSAGE_NODE))),
        decl(ALIAS, "alias", pointer(integer("ds_int", 32))),
    ]);

    let last = blocks.len();
    let mut body = Node::new("body").with_attr("entrypoint", 0).with_child(locals);
    for (id, statements) in blocks.into_iter().enumerate() {
        let block = Node::new("block")
            .with_attr("id", id)
            .with_children(statements)
            .with_child(Node::new("next").with_attr("id", id + 1));
        body = body.with_child(block);
    }
    body = body.with_child(Node::new("block").with_attr("id", last).with_child(Node::new("return")));

    Node::new("function")
        .with_attr("name", name)
        .with_attr("location", format!("{SOURCE_FILE}:1"))
        .with_children([
            Node::new("returns").with_child(Node::new("void")),
            Node::new("args"),
            body,
        ])
}

pub fn unit(functions: Vec<Node>) -> Unit {
    let source: String = (1..=40).map(|line| format!("    line_{line}();\n")).collect();
    let aggregates = Node::new("referenced-types").with_children([
        Node::new("structure").with_attr("id", SYMBOL_NODE).with_attr("name", "DSSymbolNode"),
        Node::new("structure").with_attr("id", MESSAGE_NODE).with_attr("name", "DSMessage"),
    ]);
    let root = Node::new("unit")
        .with_attr("language", "C")
        .with_attr("filename", SOURCE_FILE)
        .with_children([
            Node::new("raw-source").with_text(&source),
            aggregates,
            Node::new("function-bodies").with_children(functions),
        ]);
    match Unit::from_document(&root) {
        Ok(unit) => unit,
        Err(e) => panic!("fixture unit failed to load: {e}"),
    }
}

/// A unit with one function holding `calls` in a single block
pub fn unit_with_calls(calls: Vec<Node>) -> Unit {
    unit(vec![function("main", vec![calls])])
}
