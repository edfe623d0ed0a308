use crate::{
    AutocompleterError, DefinitionError, EvaluationError, ParseError, ParseFailure, ParsingState,
};
use std::fmt::{Debug, Display, Formatter};

impl DefinitionError {
    pub fn pattern_syntax(pattern: &str, message: impl Into<String>) -> Self {
        DefinitionError::PatternSyntax {
            pattern: pattern.to_string(),
            message: message.into(),
        }
    }

    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        DefinitionError::UnknownType {
            type_name: type_name.into(),
        }
    }
}

impl Display for DefinitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionError::PatternSyntax { pattern, message } => {
                write!(f, "PatternSyntaxError: {} in pattern {:?}", message, pattern)
            }
            DefinitionError::UnknownType { type_name } => {
                write!(f, "UnknownTypeError: unknown type '{}'", type_name)
            }
        }
    }
}

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EvaluationError: {}", self.message)
    }
}

impl AutocompleterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for AutocompleterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "AutocompleterError: {}", self.message)
    }
}

impl ParseFailure {
    pub(crate) fn new(tree: crate::ParseTree, frontier: Option<crate::tree::NodeId>) -> Self {
        Self { tree, frontier }
    }

    /// The root of the failed parse tree.
    pub fn root(&self) -> crate::ParsedNode<'_> {
        self.tree.root()
    }

    /// The deepest node at which parsing stopped.
    pub fn frontier(&self) -> crate::ParsedNode<'_> {
        match self.frontier {
            Some(id) => self.tree.handle(id),
            None => self.tree.root(),
        }
    }

    /// Walks from the frontier towards the root and returns the first node whose rule
    /// provides autocompletion. Its matcher position and parsed length delimit the
    /// offending span for editor highlighting.
    pub fn first_autocompleting_ancestor_that_failed(&self) -> crate::ParsedNode<'_> {
        let mut node = self.frontier();
        loop {
            if node.does_autocomplete().unwrap_or(false) {
                return node;
            }
            match node.parent() {
                Some(parent) => node = parent,
                None => return node,
            }
        }
    }
}

impl Display for ParseFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let frontier = self.frontier();
        let matcher = frontier.matcher();
        write!(
            f,
            "ParseFailure: could not parse '{}' at position {}",
            matcher.parsed, matcher.pos
        )
    }
}

impl Debug for ParseFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseFailure")
            .field("state", &ParsingState::Failed)
            .field("pos", &self.frontier().matcher().pos)
            .field("parsed", &self.frontier().matcher().parsed)
            .finish()
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Failure(failure) => Display::fmt(failure, f),
            ParseError::Autocomplete(err) => Display::fmt(err, f),
        }
    }
}

impl Debug for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Failure(failure) => Debug::fmt(failure, f),
            ParseError::Autocomplete(err) => Debug::fmt(err, f),
        }
    }
}

impl From<ParseFailure> for ParseError {
    fn from(failure: ParseFailure) -> Self {
        ParseError::Failure(Box::new(failure))
    }
}

impl From<AutocompleterError> for ParseError {
    fn from(err: AutocompleterError) -> Self {
        ParseError::Autocomplete(err)
    }
}
