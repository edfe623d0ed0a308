use crate::{
    DefinitionError, Evaluator, NamedRule, ParseError, Parser, ParsingState, RuleKind, Value,
};

/// The wrapper rule generated for a quantified variable: the defined type is a
/// sequence with one child, whose target non-terminal carries the wrapper.
fn wrapper_of(parser: &Parser, rule: &NamedRule) -> Vec<crate::Rule> {
    let sequence = rule.get();
    assert_eq!(1, sequence.children().len());
    let target = sequence.children()[0]
        .as_non_terminal()
        .expect("quantified variables wrap a non-terminal")
        .clone();
    parser.target_grammar().get_rules(&target)
}

#[test]
fn a_bounded_quantifier_becomes_a_repeat_rule() {
    let mut parser = Parser::new();
    let rule = parser.define_type("t", "{bla:int:3-5}", None, None).unwrap();
    assert_eq!(Some("bla".to_string()), rule.get().name_for_child(0));

    let rules = wrapper_of(&parser, &rule);
    assert_eq!(1, rules.len());
    assert!(matches!(rules[0].kind(), RuleKind::Repeat { from: 3, to: 5 }));
    assert_eq!("int", rules[0].entry().name());
}

#[test]
fn a_star_quantifier_becomes_a_star_rule() {
    let mut parser = Parser::new();
    let rule = parser
        .define_type("t", "{blubb:int:*}", None, None)
        .unwrap();
    let rules = wrapper_of(&parser, &rule);
    assert_eq!(1, rules.len());
    assert!(matches!(rules[0].kind(), RuleKind::Star));
    assert_eq!("int", rules[0].entry().name());
}

#[test]
fn a_plus_quantifier_over_a_character_class_becomes_a_plus_rule() {
    let mut parser = Parser::new();
    let rule = parser
        .define_type("t", "{blubb:[A-Z]:+}", None, None)
        .unwrap();
    let rules = wrapper_of(&parser, &rule);
    assert_eq!(1, rules.len());
    assert!(matches!(rules[0].kind(), RuleKind::Plus { .. }));
    assert_eq!("[A-Z]", rules[0].entry().name());
}

#[test]
fn a_type_reference_resolves_to_the_defined_symbol() {
    let mut parser = Parser::new();
    let rule = parser.define_type("t", "{blubb:digit}", None, None).unwrap();
    let sequence = rule.get();
    assert_eq!(1, sequence.children().len());
    assert_eq!("digit", sequence.children()[0].name());
    assert_eq!(Some("blubb".to_string()), sequence.name_for_child(0));
}

#[test]
fn an_untyped_variable_becomes_a_literal_of_its_name() {
    let mut parser = Parser::new();
    for name in ["heinz", "blubb , alkjad asd 4. <>l", ", ", ",\n "] {
        let pattern = format!("{{{}}}", name);
        let rule = parser.define_type("t", &pattern, None, None).unwrap();
        let sequence = rule.get();
        assert_eq!(1, sequence.children().len());
        assert!(sequence.children()[0].is_terminal());
        assert_eq!(name, sequence.children()[0].name());
        assert_eq!(Some(name.to_string()), sequence.name_for_child(0));
    }
}

#[test]
fn an_untyped_variable_with_a_quantifier_wraps_its_literal() {
    let mut parser = Parser::new();
    let rule = parser.define_type("t", "{heinz:+}", None, None).unwrap();
    let rules = wrapper_of(&parser, &rule);
    assert!(matches!(rules[0].kind(), RuleKind::Plus { .. }));
    assert_eq!("heinz", rules[0].entry().name());

    let rule = parser.define_type("u", "{heinz:3-5}", None, None).unwrap();
    let rules = wrapper_of(&parser, &rule);
    assert!(matches!(rules[0].kind(), RuleKind::Repeat { from: 3, to: 5 }));
}

#[test]
fn unknown_types_are_rejected() {
    let mut parser = Parser::new();
    match parser.define_sentence("Use {x:nope}.", None, None) {
        Err(DefinitionError::UnknownType { type_name }) => assert_eq!("nope", type_name),
        other => panic!("expected an unknown-type error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn malformed_patterns_are_rejected() {
    let mut parser = Parser::new();
    assert!(matches!(
        parser.define_sentence("lj{l", None, None),
        Err(DefinitionError::PatternSyntax { .. })
    ));
}

#[test]
fn literals_and_variables_interleave_with_whitespace() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "Today, let's wait for {waittime:int} minutes.",
            Some(Evaluator::new(|pn| pn.evaluate(&["waittime"]))),
            None,
        )
        .unwrap();

    let tree = parser
        .parse("Today, let's wait for 5 minutes.", None)
        .unwrap();
    assert_eq!(ParsingState::Successful, tree.root().matcher().state);
    assert_eq!(
        Value::List(vec![Value::Int(5)]),
        tree.root().evaluate(&[]).unwrap()
    );
}

#[test]
fn defined_types_nest_inside_sentences() {
    let mut parser = Parser::new();
    parser
        .define_type(
            "percentage",
            "{p:int} %",
            Some(Evaluator::new(|pn| pn.evaluate(&["p"]))),
            None,
        )
        .unwrap();
    parser
        .define_sentence(
            "There is still {p:percentage} left.",
            Some(Evaluator::new(|pn| pn.evaluate(&["p"]))),
            None,
        )
        .unwrap();
    parser
        .define_sentence(
            "Now it is only {p:percentage}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["p"]))),
            None,
        )
        .unwrap();

    let tree = parser
        .parse("There is still 38 % left.\nNow it is only 5 %.", None)
        .unwrap();
    assert_eq!(ParsingState::Successful, tree.root().matcher().state);
    assert_eq!(
        Value::List(vec![Value::Int(38), Value::Int(5)]),
        tree.root().evaluate(&[]).unwrap()
    );
}

#[test]
fn list_types_parse_comma_separated_entries() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "Average the frames {l:list<int>}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["l"]))),
            None,
        )
        .unwrap();

    let tree = parser.parse("Average the frames 1, 2, 3.", None).unwrap();
    assert_eq!(ParsingState::Successful, tree.root().matcher().state);
    assert_eq!(
        Value::List(vec![Value::List(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3)
        ])]),
        tree.root().evaluate(&[]).unwrap()
    );
}

#[test]
fn tuple_types_parse_parenthesized_named_entries() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "Move to {p:tuple<int,x,y>}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["p"]))),
            None,
        )
        .unwrap();

    let tree = parser.parse("Move to (3, 4).", None).unwrap();
    assert_eq!(ParsingState::Successful, tree.root().matcher().state);
    assert_eq!(
        Value::List(vec![Value::List(vec![Value::Int(3), Value::Int(4)])]),
        tree.root().evaluate(&[]).unwrap()
    );
}

#[test]
fn parse_failures_carry_the_offending_span() {
    let mut parser = Parser::new();
    parser.define_sentence("Hello world.", None, None).unwrap();

    let failure = match parser.parse("Goodbye.", None) {
        Err(ParseError::Failure(failure)) => failure,
        other => panic!("expected a parse failure, got {:?}", other.map(|_| ())),
    };
    let ancestor = failure.first_autocompleting_ancestor_that_failed();
    let matcher = ancestor.matcher();
    assert_eq!(0, matcher.pos);
    assert!(!matcher.parsed.is_empty());
}

#[test]
fn repeated_parses_yield_structurally_equal_trees() {
    fn shape(node: crate::ParsedNode) -> Vec<(String, ParsingState, String, usize)> {
        let mut out = vec![(
            node.name().to_string(),
            node.matcher().state,
            node.matcher().parsed.clone(),
            node.num_children(),
        )];
        for child in node.children() {
            out.extend(shape(child));
        }
        out
    }

    let mut parser = Parser::new();
    parser
        .define_sentence("Define channel {name:[A-Za-z0-9]:+}.", None, None)
        .unwrap();

    let first = parser.parse("Define channel DAPI.", None).unwrap();
    let second = parser.parse("Define channel DAPI.", None).unwrap();
    assert_eq!(shape(first.root()), shape(second.root()));
}
