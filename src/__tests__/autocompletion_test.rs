use crate::autocomplete::{Autocompleter, Autocompletion};
use crate::symbol::character_class;
use crate::{
    literal, whitespace, AutocompletePolicy, EbnfCore, Lexer, NonTerminal, Parser, ParsingState,
    RdParser, Symbol,
};
use std::cell::RefCell;
use std::rc::Rc;

/// `expr -> "one" ("two"|"three"|"four")* "five"`, with a completer on the inner
/// alternation that vetoes once text has been entered.
fn make_grammar() -> EbnfCore {
    let grammar = EbnfCore::new();
    let or = grammar.or_rule(
        None,
        vec![
            literal("two").with_name("two"),
            literal("three").with_name("three"),
            literal("four").with_name("four"),
        ],
    );
    or.set_autocompleter(Autocompleter::custom(|pn, _just_check| {
        if !pn.parsed_text().is_empty() {
            return Ok(Some(vec![Autocompletion::veto()]));
        }
        Ok(Some(vec![Autocompletion::parameterized(pn.name())]))
    }));
    let expr = grammar.sequence(
        Some("expr"),
        vec![
            literal("one").unnamed(),
            grammar.star(None, or.with_name("or")).with_name("star"),
            literal("five").with_name("five"),
        ],
    );
    grammar.compile(&Symbol::NonTerminal(expr.tgt().clone()));
    grammar
}

fn completions_for(input: &str) -> Vec<String> {
    let grammar = make_grammar();
    let bnf = grammar.bnf();
    let mut parser = RdParser::new(&bnf, Lexer::new(input));
    let mut completions = Vec::new();
    let tree = parser.parse(Some(&mut completions)).unwrap();
    assert_eq!(ParsingState::EndOfInput, tree.root().matcher().state);
    completions
        .iter()
        .map(|c| format!("{} ({})", c.completion(), c.already_entered_text()))
        .collect()
}

#[test]
fn empty_input_completes_the_first_literal() {
    assert_eq!(vec!["one ()".to_string()], completions_for(""));
}

#[test]
fn a_partial_literal_keeps_the_already_entered_text() {
    assert_eq!(vec!["one (o)".to_string()], completions_for("o"));
}

#[test]
fn parameter_and_literal_continuations_are_both_offered() {
    assert_eq!(
        vec!["${or} ()".to_string(), "five ()".to_string()],
        completions_for("one")
    );
}

#[test]
fn veto_blocks_later_completions() {
    // "t" already entered into the alternation: the completer vetoes, and the
    // sentinel suppresses everything discovered afterwards
    assert_eq!(Vec::<String>::new(), completions_for("onet"));
}

#[test]
fn terminal_types_complete_as_parameters() {
    let mut parser = Parser::new();
    parser
        .define_sentence("The first digit of the number is {first:digit}.", None, None)
        .unwrap();

    let mut completions = Vec::new();
    parser
        .parse("The first digit of the number is ", Some(&mut completions))
        .unwrap();
    assert_eq!(1, completions.len());
    assert_eq!("${first}", completions[0].completion());
    assert_eq!("", completions[0].already_entered_text());
}

#[test]
fn empty_input_offers_the_sentence_starts() {
    let mut parser = Parser::new();
    parser
        .define_sentence("Define the output path {p:path}.", None, None)
        .unwrap();

    let mut completions = Vec::new();
    parser.parse("", Some(&mut completions)).unwrap();
    assert_eq!(2, completions.len());
    assert_eq!("\n", completions[0].completion());
    assert_eq!("Define the output path", completions[1].completion());
}

#[test]
fn listeners_observe_every_parsed_sentence() {
    let sentences: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let mut parser = Parser::new();
    let cleared = sentences.clone();
    parser.add_parse_start_listener(Rc::new(move || cleared.borrow_mut().clear()));
    let collected = sentences.clone();
    parser
        .define_sentence("{d:digit:+}.", None, None)
        .unwrap()
        .on_successful_parsed(Rc::new(move |pn| {
            collected.borrow_mut().push(pn.parsed_text().to_string());
        }));

    let mut completions = Vec::new();
    parser.parse("1.22.333.", Some(&mut completions)).unwrap();

    assert_eq!(
        vec!["1.".to_string(), "22.".to_string(), "333.".to_string()],
        *sentences.borrow()
    );
}

#[test]
fn custom_completers_see_listener_collected_state() {
    let channels: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let mut parser = Parser::new();
    let cleared = channels.clone();
    parser.add_parse_start_listener(Rc::new(move || cleared.borrow_mut().clear()));

    let collected = channels.clone();
    parser
        .define_sentence("Define channel {channel-name:[A-Za-z0-9]:+}.", None, None)
        .unwrap()
        .on_successful_parsed(Rc::new(move |pn| {
            collected
                .borrow_mut()
                .push(pn.parsed_string(&["channel-name"]));
        }));

    let defined = channels.clone();
    parser
        .define_type(
            "defined-channels",
            "'{channel:[A-Za-z0-9]:+}'",
            None,
            Some(AutocompletePolicy::Completer(Autocompleter::custom(
                move |_pn, _just_check| {
                    Ok(Some(
                        defined
                            .borrow()
                            .iter()
                            .map(|channel| Autocompletion::literal(channel.as_str()))
                            .collect(),
                    ))
                },
            ))),
        )
        .unwrap();
    parser
        .define_sentence("Use channel {channel:defined-channels}.", None, None)
        .unwrap();

    let mut completions = Vec::new();
    let tree = parser
        .parse(
            "Define channel DAPI.\n\
             Define channel A488.\n\
             Use channel 'DAPI'.\n\
             Use channel 'A488'.\n\
             Use channel ",
            Some(&mut completions),
        )
        .unwrap();
    assert_eq!(ParsingState::EndOfInput, tree.root().matcher().state);

    assert_eq!(2, completions.len());
    assert_eq!("DAPI", completions[0].completion());
    assert_eq!("A488", completions[1].completion());
}

#[test]
fn a_partially_entered_word_is_completed_to_the_full_literal() {
    let grammar = EbnfCore::new();
    grammar.sequence(
        Some("sentence"),
        vec![
            literal("Define channel").unnamed(),
            whitespace().with_name("ws"),
            grammar
                .plus(
                    Some("name"),
                    character_class("[A-Za-z]").unwrap().unnamed(),
                )
                .with_name("name"),
            literal(".").unnamed(),
        ],
    );
    let program = grammar.star(
        Some("program"),
        Symbol::NonTerminal(NonTerminal::new("sentence")).with_name("sentence"),
    );
    grammar.compile(&Symbol::NonTerminal(program.tgt().clone()));

    let bnf = grammar.bnf();
    let mut parser = RdParser::new(&bnf, Lexer::new("Define channel DA.D"));
    let mut completions = Vec::new();
    let tree = parser.parse(Some(&mut completions)).unwrap();

    assert_eq!(ParsingState::EndOfInput, tree.root().matcher().state);
    assert_eq!(1, completions.len());
    assert_eq!("Define channel", completions[0].completion());
    assert_eq!("D", completions[0].already_entered_text());
}

#[test]
fn sub_grammars_are_probed_recursively() {
    let mut parser = Parser::new();
    for led in ["385nm", "470nm", "567nm", "625nm"] {
        parser
            .define_type(
                "led",
                led,
                None,
                Some(AutocompletePolicy::Completer(Autocompleter::custom(
                    move |_pn, _just_check| Ok(Some(vec![Autocompletion::literal(led)])),
                ))),
            )
            .unwrap();
    }
    parser
        .define_type(
            "led-power",
            "{<led-power>:int}%",
            None,
            Some(AutocompletePolicy::EntireSequence),
        )
        .unwrap();
    parser
        .define_type(
            "led-setting",
            "{led-power:led-power} at {wavelength:led}",
            None,
            Some(AutocompletePolicy::EntireSequence),
        )
        .unwrap();
    parser
        .define_sentence("Excite with {led-setting:led-setting}.", None, None)
        .unwrap();

    let mut completions = Vec::new();
    let tree = parser
        .parse("Excite with 10% at 3", Some(&mut completions))
        .unwrap();
    assert_eq!(ParsingState::EndOfInput, tree.root().matcher().state);
    assert_eq!(1, completions.len());
    assert_eq!("385nm", completions[0].completion());
    assert_eq!("3", completions[0].already_entered_text());
}

#[test]
fn literal_and_entire_sequence_completions_are_ordered_by_discovery() {
    let mut parser = Parser::new();
    parser.define_type("my-color", "blue", None, None).unwrap();
    parser.define_type("my-color", "green", None, None).unwrap();
    parser
        .define_type(
            "my-color",
            "({r:int}, {g:int}, {b:int})",
            None,
            Some(AutocompletePolicy::EntireSequence),
        )
        .unwrap();
    parser
        .define_sentence("My favorite color is {color:my-color}.", None, None)
        .unwrap();

    let mut completions = Vec::new();
    let tree = parser
        .parse("My favorite color is ", Some(&mut completions))
        .unwrap();
    assert_eq!(ParsingState::EndOfInput, tree.root().matcher().state);

    let rendered: Vec<String> = completions.iter().map(|c| c.completion()).collect();
    assert_eq!(
        vec![
            "blue".to_string(),
            "green".to_string(),
            "(${r}, ${g}, ${b})".to_string()
        ],
        rendered
    );
}

#[test]
fn entire_sequence_probes_nullable_trailing_children() {
    let mut parser = Parser::new();
    parser
        .define_type(
            "tag-list",
            "tags {t:[a-z]:*}",
            None,
            Some(AutocompletePolicy::EntireSequence),
        )
        .unwrap();
    parser
        .define_sentence("Label with {l:tag-list}.", None, None)
        .unwrap();

    let mut completions = Vec::new();
    let tree = parser.parse("Label with ", Some(&mut completions)).unwrap();
    assert_eq!(ParsingState::EndOfInput, tree.root().matcher().state);
    assert_eq!(1, completions.len());
    assert_eq!("tags ${t}", completions[0].completion());
}

#[test]
fn successful_parses_yield_no_completions() {
    let mut parser = Parser::new();
    parser
        .define_sentence("My favorite number is {n:int}.", None, None)
        .unwrap();

    let mut completions = Vec::new();
    let tree = parser
        .parse("My favorite number is 5.", Some(&mut completions))
        .unwrap();
    assert_eq!(ParsingState::Successful, tree.root().matcher().state);
    assert!(completions.is_empty());
}

#[test]
fn repeated_parses_return_identical_completions() {
    let mut parser = Parser::new();
    parser.define_type("my-color", "blue", None, None).unwrap();
    parser.define_type("my-color", "green", None, None).unwrap();
    parser
        .define_sentence("My favorite color is {color:my-color}.", None, None)
        .unwrap();

    let mut first = Vec::new();
    parser
        .parse("My favorite color is ", Some(&mut first))
        .unwrap();
    let mut second = Vec::new();
    parser
        .parse("My favorite color is ", Some(&mut second))
        .unwrap();
    assert_eq!(first, second);
}
