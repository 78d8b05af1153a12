use super::*;
use crate::decl::Binding;
use pretty_assertions::assert_eq;

fn char_array(max: i64) -> Node {
    Node::new("array")
        .with_child(
            Node::new("type").with_child(Node::new("integer").with_attr("name", "char").with_attr("precision", "8")),
        )
        .with_child(
            Node::new("domain").with_child(
                Node::new("integer")
                    .with_attr("precision", "64")
                    .with_attr("min", "0")
                    .with_attr("max", max),
            ),
        )
}

fn string_node(text: &str) -> Node {
    Node::new("constant")
        .with_child(char_array(text.len() as i64))
        .with_child(Node::new("string-literal").with_text(text))
}

fn int_node(value: i64) -> Node {
    Node::new("constant")
        .with_child(Node::new("integer").with_attr("name", "int").with_attr("precision", "32"))
        .with_child(Node::new("integer-literal").with_attr("value", value))
}

fn address_of_item(text: &str, offset: i64) -> Node {
    Node::new("addr-of").with_child(
        Node::new("item-ref")
            .with_child(Node::new("array").with_child(string_node(text)))
            .with_child(Node::new("index").with_child(int_node(offset))),
    )
}

fn attached(id: BindingId, name: Option<&str>, ty: Type) -> Expression {
    Expression::Bound(Bound {
        id,
        hint: None,
        decl: Some(Decl::new(Binding::new(id, name), ty)),
    })
}

#[test]
fn test_string_literal_through_address_of() {
    let expression = Expression::decode(&address_of_item("ii\\0", 0)).unwrap();
    assert_eq!(expression.string_literal(), Some("ii".to_string()));
    assert_eq!(expression.type_spelling(), "char*");
    assert_eq!(expression.to_string(), "&\"ii\\000\"[0]");

    let offset = Expression::decode(&address_of_item("abcd", 2)).unwrap();
    assert_eq!(offset.string_literal(), Some("cd".to_string()));

    let negative = Expression::decode(&address_of_item("abcd", -1)).unwrap();
    assert_eq!(negative.string_literal(), None);
}

#[test]
fn test_bare_string_literal() {
    let expression = Expression::decode(&string_node("hello\\0\\0")).unwrap();
    assert_eq!(expression.string_literal(), Some("hello".to_string()));
    assert_eq!(expression.type_spelling(), "char*");
}

#[test]
fn test_not_a_literal() {
    let variable = Expression::decode(&Node::new("bound").with_attr("id", "4")).unwrap();
    assert_eq!(variable.string_literal(), None);
    assert_eq!(variable.get_type(), None);
    assert_eq!(variable.type_spelling(), "<unknown>");
    assert_eq!(variable.to_string(), "U.4");

    let address = Expression::AddrOf(Box::new(variable));
    assert_eq!(address.string_literal(), None);
}

#[test]
fn test_typing() {
    let int = Type::integer(32, false);
    let pointer = attached(1, Some("p"), Type::pointer_to(int.clone()));

    assert_eq!(Expression::Indirect(Box::new(pointer.clone())).get_type(), Some(int.clone()));
    assert_eq!(
        Expression::AddrOf(Box::new(pointer.clone())).type_spelling(),
        "int32**"
    );
    let item = Expression::ItemRef {
        array: Box::new(pointer),
        index: Box::new(Expression::decode(&int_node(3)).unwrap()),
    };
    assert_eq!(item.get_type(), Some(int.clone()));
    assert_eq!(item.to_string(), "p[3]");

    let member = Expression::MemberRef {
        structure: Box::new(attached(2, Some("s"), Type::Void)),
        member: Box::new(attached(3, Some("len"), int.clone())),
    };
    assert_eq!(member.get_type(), Some(int));
    assert_eq!(member.to_string(), "s.len");

    assert_eq!(Expression::Void.get_type(), Some(Type::Void));
    assert_eq!(Expression::Result.get_type(), None);
}

#[test]
fn test_operators() {
    let plus = Expression::decode(&Node::new("plus")).unwrap();
    assert!(plus.is_operator());
    assert_eq!(plus.get_type(), None);
    assert_eq!(plus.to_string(), "+");

    let not = Expression::decode(&Node::new("logical-not")).unwrap();
    assert_eq!(not.to_string(), "!");
    assert_eq!(Expression::decode(&Node::new("division-floor")).unwrap().to_string(), "//");
    assert_eq!(unary_operator("bitwise-not"), Some("~"));
    assert_eq!(binary_operator("rotate-right"), Some(">>"));
    assert_eq!(binary_operator("spaceship"), None);
}

#[test]
fn test_unknown_expression_is_placeholder() {
    let expression = Expression::decode(&Node::new("vector-cst")).unwrap();
    assert_eq!(expression, Expression::Bound(Bound::new(lh_common::PLACEHOLDER_BINDING)));
}

#[test]
fn test_function_wrapper_is_transparent() {
    let node = Node::new("function").with_child(Node::new("bound").with_attr("id", "9").with_attr("name", "f"));
    let expression = Expression::decode(&node).unwrap();
    assert_eq!(expression.to_string(), "f");
}

#[test]
fn test_lvalue_rules() {
    let indirect = Node::new("indirection").with_child(Node::new("bound").with_attr("id", "2"));
    assert_eq!(Expression::decode_lvalue(&indirect).unwrap().to_string(), "*U.2");
    assert_eq!(Expression::decode_lvalue(&Node::new("result")).unwrap(), Expression::Result);

    assert_eq!(
        Expression::decode_lvalue(&int_node(1)),
        Err(DecodeError::InvalidLvalue { found: "constant".to_string() })
    );
}

#[test]
fn test_bound_visitors() {
    let mut expression = Expression::decode_lvalue(
        &Node::new("member-ref")
            .with_child(Node::new("structure").with_child(Node::new("bound").with_attr("id", "5")))
            .with_child(Node::new("member").with_child(Node::new("bound").with_attr("id", "6"))),
    )
    .unwrap();

    let mut ids = Vec::new();
    expression.for_each_bound(&mut |b| ids.push(b.id));
    assert_eq!(ids, vec![5, 6]);

    expression.for_each_bound_mut(&mut |b| b.hint = Some(format!("v{}", b.id)));
    assert_eq!(expression.to_string(), "v5.v6");
}
