use crate::{Matcher, ParsingState};

#[test]
fn state_order_runs_from_worst_to_best() {
    assert!(ParsingState::Failed.is_better_than(ParsingState::NotParsed));
    assert!(ParsingState::EndOfInput.is_better_than(ParsingState::Failed));
    assert!(ParsingState::Successful.is_better_than(ParsingState::EndOfInput));
    assert!(!ParsingState::Failed.is_better_than(ParsingState::Failed));
}

#[test]
fn deeper_attempt_wins_ties() {
    let shallow = Matcher::new(ParsingState::Failed, 0, "ab");
    let deep = Matcher::new(ParsingState::Failed, 0, "abcd");
    assert!(deep.is_better_than(&shallow));
    assert!(!shallow.is_better_than(&deep));

    let eoi = Matcher::new(ParsingState::EndOfInput, 4, "");
    assert!(eoi.is_better_than(&deep));
}
