use super::{expect_failure, expect_success};
use crate::symbol::digit;
use crate::{EbnfCore, Symbol};

fn make_grammar() -> EbnfCore {
    let grammar = EbnfCore::new();
    let rule = grammar.repeat(Some("repeat"), digit().with_name("d"), 2, 4);
    grammar.compile(&Symbol::NonTerminal(rule.tgt().clone()));
    grammar
}

fn expect_repetitions(input: &str) {
    let grammar = make_grammar();
    let tree = expect_success(&grammar, input);
    let parsed = tree.root().child(0).unwrap();
    assert_eq!(input.len(), parsed.num_children());
    for (idx, child) in parsed.children().into_iter().enumerate() {
        assert_eq!(&input[idx..idx + 1], child.parsed_text());
        assert_eq!("d", child.name());
        assert_eq!(idx, child.nth_entry_in_parent());
    }
}

#[test]
fn lengths_within_the_bounds_parse() {
    expect_repetitions("12");
    expect_repetitions("123");
    expect_repetitions("1234");
}

#[test]
fn lengths_outside_the_bounds_fail() {
    expect_failure(&make_grammar(), "");
    expect_failure(&make_grammar(), "1");
    expect_failure(&make_grammar(), "12345");
}

#[test]
fn named_entries_are_assigned_in_order() {
    let grammar = EbnfCore::new();
    let rule = grammar.repeat_with_names(Some("pair"), digit().unnamed(), &["ha", "ho"]);
    grammar.compile(&Symbol::NonTerminal(rule.tgt().clone()));

    let tree = expect_success(&grammar, "12");
    let parsed = tree.root().child(0).unwrap();
    let names: Vec<&str> = parsed.children().iter().map(|c| c.name()).collect();
    assert_eq!(vec!["ha", "ho"], names);
}
