use super::{expect_failure, expect_success};
use crate::symbol::{digit, letter};
use crate::{EbnfCore, Symbol, Value};

fn make_grammar() -> EbnfCore {
    let grammar = EbnfCore::new();
    let rule = grammar.optional(
        Some("optional"),
        grammar
            .sequence(Some("seq"), vec![digit().unnamed(), letter().unnamed()])
            .with_name("seq"),
    );
    grammar.compile(&Symbol::NonTerminal(rule.tgt().clone()));
    grammar
}

#[test]
fn absent_child_parses_to_an_empty_node() {
    let grammar = make_grammar();
    let tree = expect_success(&grammar, "");
    let parsed = tree.root().child(0).unwrap();
    assert_eq!(0, parsed.num_children());
    // optional evaluates its first child, of which there is none
    assert_eq!(Value::None, parsed.evaluate_self().unwrap());
}

#[test]
fn present_child_is_named_and_evaluated() {
    let grammar = make_grammar();
    let tree = expect_success(&grammar, "1a");
    let parsed = tree.root().child(0).unwrap();
    assert_eq!(1, parsed.num_children());

    let child = parsed.child(0).unwrap();
    assert_eq!("1a", child.parsed_text());
    assert_eq!(2, child.num_children());
    assert_eq!("seq", child.name());

    let evaluated = parsed.evaluate_self().unwrap();
    assert_eq!(
        Value::List(vec![Value::Str("1".into()), Value::Str("a".into())]),
        evaluated
    );
}

#[test]
fn more_than_one_occurrence_fails() {
    expect_failure(&make_grammar(), "123");
    expect_failure(&make_grammar(), "1a2b");
}

#[test]
fn unknown_input_fails() {
    expect_failure(&make_grammar(), "s");
}
