use super::{expect_failure, expect_success};
use crate::symbol::{digit, letter};
use crate::{EbnfCore, Symbol};

fn make_grammar() -> EbnfCore {
    let grammar = EbnfCore::new();
    let rule = grammar.star(
        Some("star"),
        grammar
            .sequence(Some("seq"), vec![digit().unnamed(), letter().unnamed()])
            .with_name("seq"),
    );
    grammar.compile(&Symbol::NonTerminal(rule.tgt().clone()));
    grammar
}

fn expect_repetitions(input: &str, repetitions: usize) {
    let grammar = make_grammar();
    let tree = expect_success(&grammar, input);
    let parsed = tree.root().child(0).unwrap();
    assert_eq!(repetitions, parsed.num_children());
    assert_eq!(input, parsed.parsed_text());

    for (idx, child) in parsed.children().into_iter().enumerate() {
        assert_eq!(&input[2 * idx..2 * idx + 2], child.parsed_text());
        assert_eq!("seq", child.name());
        assert_eq!(idx, child.nth_entry_in_parent());
        assert_eq!(2, child.num_children());
    }

    let evaluated = parsed.evaluate_self().unwrap();
    assert_eq!(repetitions, evaluated.as_list().unwrap().len());
}

#[test]
fn zero_repetitions_parse() {
    expect_repetitions("", 0);
}

#[test]
fn one_repetition_parses() {
    expect_repetitions("1a", 1);
}

#[test]
fn expansions_are_flattened_into_numbered_siblings() {
    expect_repetitions("1a2b3c", 3);
}

#[test]
fn a_trailing_partial_repetition_fails() {
    expect_failure(&make_grammar(), "1a2");
}
