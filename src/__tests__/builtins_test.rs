use crate::{Evaluator, Parser, ParsingState, Value};
use chrono::{NaiveDate, NaiveTime};

fn single_sentence_value(parser: &mut Parser, input: &str) -> Value {
    let tree = parser.parse(input, None).unwrap();
    assert_eq!(ParsingState::Successful, tree.root().matcher().state);
    let values = match tree.root().evaluate(&[]).unwrap() {
        Value::List(values) => values,
        other => panic!("expected the program to evaluate to a list, got {:?}", other),
    };
    assert_eq!(1, values.len());
    values.into_iter().next().unwrap()
}

#[test]
fn named_colors_evaluate_to_packed_argb() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "My favorite color is {c:color}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["c"]))),
            None,
        )
        .unwrap();

    let color = single_sentence_value(&mut parser, "My favorite color is lawn green.");
    assert_eq!(Value::Int(0xff80ff00u32 as i64), color);
}

#[test]
fn rgb_tuples_evaluate_to_packed_argb() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "My favorite color is {c:color}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["c"]))),
            None,
        )
        .unwrap();

    let color = single_sentence_value(&mut parser, "My favorite color is (128, 255, 0).");
    assert_eq!(Value::Int(0xff80ff00u32 as i64), color);
}

#[test]
fn color_completions_offer_the_tuple_and_every_name() {
    let mut parser = Parser::new();
    parser
        .define_sentence("My favorite color is {c:color}.", None, None)
        .unwrap();

    let mut completions = Vec::new();
    parser
        .parse("My favorite color is ", Some(&mut completions))
        .unwrap();
    let rendered: Vec<String> = completions.iter().map(|c| c.completion()).collect();
    assert_eq!(
        vec![
            "(${red}, ${green}, ${blue})",
            "black",
            "white",
            "red",
            "orange",
            "yellow",
            "lawn green",
            "green",
            "spring green",
            "cyan",
            "azure",
            "blue",
            "violet",
            "magenta",
            "pink",
            "gray",
        ],
        rendered
    );
}

#[test]
fn digit_and_letter_evaluate_to_characters() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "Drive {d:digit} km to the {l:letter} building.",
            Some(Evaluator::new(|pn| {
                Ok(Value::List(vec![
                    pn.evaluate(&["d"])?,
                    pn.evaluate(&["l"])?,
                ]))
            })),
            None,
        )
        .unwrap();

    let value = single_sentence_value(&mut parser, "Drive 7 km to the C building.");
    assert_eq!(Value::List(vec![Value::Char('7'), Value::Char('C')]), value);
}

#[test]
fn int_evaluates_and_vetoes_mid_number_completion() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "Now there are only {p:int}% left.",
            Some(Evaluator::new(|pn| pn.evaluate(&["p"]))),
            None,
        )
        .unwrap();

    let mut completions = Vec::new();
    let tree = parser
        .parse("Now there are only 5", Some(&mut completions))
        .unwrap();
    assert_eq!(ParsingState::EndOfInput, tree.root().matcher().state);
    assert_eq!(0, completions.len());

    let value = single_sentence_value(&mut parser, "Now there are only 35% left.");
    assert_eq!(Value::Int(35), value);
}

#[test]
fn int_overflow_is_an_evaluation_error() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "The count is {n:int}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["n"]))),
            None,
        )
        .unwrap();

    let tree = parser
        .parse("The count is 99999999999999999999.", None)
        .unwrap();
    assert_eq!(ParsingState::Successful, tree.root().matcher().state);
    assert!(tree.root().evaluate(&[]).is_err());
}

#[test]
fn float_evaluates_with_a_fractional_part() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "Pi is roughly {x:float}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["x"]))),
            None,
        )
        .unwrap();

    let value = single_sentence_value(&mut parser, "Pi is roughly 3.14.");
    assert_eq!(Value::Float(3.14), value);
}

#[test]
fn sign_is_accepted_by_int_and_float() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "Move by {d:int}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["d"]))),
            None,
        )
        .unwrap();

    let value = single_sentence_value(&mut parser, "Move by -17.");
    assert_eq!(Value::Int(-17), value);
}

#[test]
fn time_evaluates_with_and_without_a_leading_zero() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "The pizza comes at {t:time}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["t"]))),
            None,
        )
        .unwrap();

    let value = single_sentence_value(&mut parser, "The pizza comes at 9:30.");
    assert_eq!(Value::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()), value);
}

#[test]
fn month_evaluates_to_its_index() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "My birthday is in {m:month}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["m"]))),
            None,
        )
        .unwrap();

    assert_eq!(
        Value::Int(11),
        single_sentence_value(&mut parser, "My birthday is in December.")
    );
    assert_eq!(
        Value::Int(4),
        single_sentence_value(&mut parser, "My birthday is in May.")
    );
}

#[test]
fn weekday_evaluates_to_its_index() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "The lab meeting is on {w:weekday}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["w"]))),
            None,
        )
        .unwrap();

    assert_eq!(
        Value::Int(4),
        single_sentence_value(&mut parser, "The lab meeting is on Friday.")
    );
}

#[test]
fn date_evaluates_to_a_calendar_day() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "My cat was born on {d:date}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["d"]))),
            None,
        )
        .unwrap();

    let value = single_sentence_value(&mut parser, "My cat was born on 03 October 2020.");
    assert_eq!(
        Value::Date(NaiveDate::from_ymd_opt(2020, 10, 3).unwrap()),
        value
    );
}

#[test]
fn date_time_combines_date_and_time() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "The experiment starts at {t:date-time}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["t"]))),
            None,
        )
        .unwrap();

    let value = single_sentence_value(
        &mut parser,
        "The experiment starts at 03 October 2020 18:30.",
    );
    let expected = NaiveDate::from_ymd_opt(2020, 10, 3)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap();
    assert_eq!(Value::DateTime(expected), value);
}

#[test]
fn path_evaluates_to_the_quoted_text() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "My home folder is {d:path}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["d"]))),
            None,
        )
        .unwrap();

    let value = single_sentence_value(&mut parser, "My home folder is '/home/someone'.");
    assert_eq!(Value::Str("/home/someone".to_string()), value);
}

#[test]
fn integer_range_evaluates_to_an_inclusive_pair() {
    let mut parser = Parser::new();
    parser
        .define_sentence(
            "Process frames {r:integer-range}.",
            Some(Evaluator::new(|pn| pn.evaluate(&["r"]))),
            None,
        )
        .unwrap();

    let value = single_sentence_value(&mut parser, "Process frames 3 - 17.");
    assert_eq!(Value::Range(3, 17), value);
}
