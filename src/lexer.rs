use std::fmt::{Display, Formatter};

/// A linear character cursor over the input text.
///
/// The position is the only mutable field; the recursive descent driver snapshots and
/// restores it while backtracking between alternatives.
pub struct Lexer<'t> {
    input: &'t str,
    pos: usize,
}

impl<'t> Lexer<'t> {
    pub fn new(input: &'t str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Advance the cursor by `n` bytes.
    pub fn fwd(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The unconsumed remainder of the input.
    pub fn rest(&self) -> &'t str {
        &self.input[self.pos.min(self.input.len())..]
    }

    /// The input from `from` to the end, independent of the current position.
    pub fn substring_from(&self, from: usize) -> &'t str {
        &self.input[from.min(self.input.len())..]
    }
}

impl Display for Lexer<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", &self.input[..self.pos.min(self.input.len())], self.rest())
    }
}
