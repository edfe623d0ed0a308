use super::{expect_failure, expect_success};
use crate::symbol::digit;
use crate::{literal, EbnfCore, Symbol, Value};

fn make_grammar() -> EbnfCore {
    let grammar = EbnfCore::new();
    let rule = grammar.or_rule(
        Some("or"),
        vec![
            grammar
                .sequence(
                    Some("seq1"),
                    vec![literal("y").unnamed(), digit().unnamed()],
                )
                .with_name("seq"),
            grammar
                .sequence(
                    Some("seq2"),
                    vec![literal("n").unnamed(), digit().unnamed()],
                )
                .with_name("seq"),
        ],
    );
    grammar.compile(&Symbol::NonTerminal(rule.tgt().clone()));
    grammar
}

fn expect_alternative(input: &str, nth: usize) {
    let grammar = make_grammar();
    let tree = expect_success(&grammar, input);
    let parsed = tree.root().child(0).unwrap();
    assert_eq!(1, parsed.num_children());

    let child = parsed.child(0).unwrap();
    assert_eq!(input, child.parsed_text());
    assert_eq!(2, child.num_children());
    assert_eq!("seq", child.name());
    assert_eq!(nth, child.nth_entry_in_parent());

    // or evaluates its first (only) child; a sequence collects its children
    let evaluated = parsed.evaluate_self().unwrap();
    let expected: Vec<Value> = input
        .chars()
        .map(|c| Value::Str(c.to_string()))
        .collect();
    assert_eq!(Value::List(expected), evaluated);
}

#[test]
fn first_alternative_parses() {
    expect_alternative("y1", 0);
}

#[test]
fn second_alternative_parses() {
    expect_alternative("n3", 1);
}

#[test]
fn empty_input_is_not_an_alternative() {
    expect_failure(&make_grammar(), "");
}

#[test]
fn unknown_input_fails() {
    expect_failure(&make_grammar(), "s");
}
