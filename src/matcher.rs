use crate::{Matcher, ParsingState};
use std::fmt::{Display, Formatter};

impl ParsingState {
    pub fn is_better_than(&self, other: ParsingState) -> bool {
        *self > other
    }
}

impl Matcher {
    pub fn new(state: ParsingState, pos: usize, parsed: impl Into<String>) -> Self {
        Self {
            state,
            pos,
            parsed: parsed.into(),
        }
    }

    pub(crate) fn not_parsed() -> Self {
        Matcher::new(ParsingState::NotParsed, 0, "")
    }

    /// Total order used to pick the best attempt among failed alternatives: a better
    /// state wins, equal states prefer the attempt that reached deeper into the input.
    pub fn is_better_than(&self, other: &Matcher) -> bool {
        if self.state != other.state {
            return self.state > other.state;
        }
        self.pos + self.parsed.len() > other.pos + other.parsed.len()
    }
}

impl Display for Matcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} at {}: {:?}", self.state, self.pos, self.parsed)
    }
}
