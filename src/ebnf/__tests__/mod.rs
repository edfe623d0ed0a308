mod optional_test;
mod or_test;
mod repeat_test;
mod star_test;

use crate::{EbnfCore, Lexer, ParseError, ParseTree, ParsingState, RdParser};

pub(crate) fn parse_with(grammar: &EbnfCore, input: &str) -> Result<ParseTree, ParseError> {
    let bnf = grammar.bnf();
    let mut parser = RdParser::new(&bnf, Lexer::new(input));
    parser.parse(None)
}

pub(crate) fn expect_success(grammar: &EbnfCore, input: &str) -> ParseTree {
    match parse_with(grammar, input) {
        Ok(tree) => {
            assert_eq!(
                ParsingState::Successful,
                tree.root().matcher().state,
                "expected a successful parse of {:?}",
                input
            );
            tree
        }
        Err(err) => panic!("parsing {:?} failed: {}", input, err),
    }
}

pub(crate) fn expect_failure(grammar: &EbnfCore, input: &str) {
    if let Ok(tree) = parse_with(grammar, input) {
        assert_ne!(
            ParsingState::Successful,
            tree.root().matcher().state,
            "expected {:?} not to parse",
            input
        );
    }
}
