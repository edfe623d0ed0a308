//! Natural language parsing tool (nl_pt) is a library to define sentence based scripting
//! languages and to parse, evaluate and autocomplete scripts written in them.
//!
//! # Overview
//! Scripting interfaces for end users are often easier to adopt when a script reads like
//! plain English instead of a general purpose programming language.
//! With this library, a language is declared as a set of sentence templates like
//! `"Define channel {name:[A-Za-z0-9]:+}."`.
//! The library then provides three services on input text:
//!
//! 1. **Parsing**: an annotated syntax tree is built against the declared grammar.
//! 2. **Evaluation**: the tree is walked, invoking evaluators attached to the rules.
//! 3. **Autocompletion**: for a partial input, every textual continuation (literal or
//!    parameter placeholder) which could legally extend it is enumerated, so that an
//!    editor can offer context sensitive completions on each keystroke.
//!
//! # Design
//!
//! Sentence templates are compiled by a built-in meta grammar into EBNF rules
//! ([Rule]) of a target grammar. On [compile](Parser::compile), the rules emit plain BNF
//! productions ([Production]) which a backtracking recursive descent driver
//! ([RdParser]) interprets. While parsing, the driver records every state in which a
//! terminal ran out of input; these end-of-input frontiers seed the autocompletion
//! engine ([Autocompletion]). Rules can carry an [Evaluator], an [Autocompleter] and a
//! parse listener, so that a host application can attach behavior to individual
//! sentences.
//!
//! # Example
//!
//! ```
//! use nl_pt::{Parser, Value};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let volumes: Rc<RefCell<Vec<i64>>> = Rc::new(RefCell::new(Vec::new()));
//! let collected = volumes.clone();
//!
//! let mut parser = Parser::new();
//! parser
//!     .define_sentence("Set the volume to {v:int}.", None, None)
//!     .unwrap()
//!     .on_successful_parsed(Rc::new(move |pn| {
//!         if let Ok(Value::Int(v)) = pn.evaluate(&["v"]) {
//!             collected.borrow_mut().push(v);
//!         }
//!     }));
//!
//! // parsing notifies the sentence listener
//! parser.parse("Set the volume to 7.", None).unwrap();
//! assert_eq!(*volumes.borrow(), vec![7]);
//!
//! // a partial input yields completions instead; the whole sentence start is one
//! // literal token, so it is completed as a whole
//! let mut completions = Vec::new();
//! parser.parse("Set the volume ", Some(&mut completions)).unwrap();
//! assert_eq!(completions[0].completion(), "Set the volume to");
//! assert_eq!(completions[0].already_entered_text(), "Set the volume ");
//! ```
mod bnf;
mod complete_path;
mod error;
mod evaluate;
mod lexer;
mod matcher;
mod parser;
mod rd_parser;
mod symbol;
mod tree;
mod util;
pub mod autocomplete;
pub mod ebnf;

#[cfg(test)]
mod __tests__;

use tree::NodeId;

pub use autocomplete::{Autocompleter, Autocompletion};
pub use bnf::{Bnf, Production};
pub use complete_path::{CompletePath, FilesystemPathCompleter};
pub use ebnf::{Ebnf, EbnfCore, NamedRule, Rule, RuleKind};
pub use evaluate::{Evaluator, Value};
pub use lexer::Lexer;
pub use parser::{AutocompletePolicy, Parser};
pub use rd_parser::RdParser;
pub use symbol::{
    character_class, digit, epsilon, letter, literal, whitespace, Named, NonTerminal, Symbol,
    Terminal,
};
pub use tree::{ParseTree, ParsedNode};
pub use util::Log;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Outcome of attempting one terminal against the input, ordered from worst to best.
///
/// [EndOfInput](ParsingState::EndOfInput) is the axis on which autocompletion pivots:
/// a terminal which still expected characters when the input ended is a completion
/// opportunity, not a hard failure.
pub enum ParsingState {
    NotParsed,
    Failed,
    EndOfInput,
    Successful,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The result of matching one terminal: the state, the position at which matching
/// began and the consumed text (or the longest attempted prefix on non-success).
pub struct Matcher {
    pub state: ParsingState,
    pub pos: usize,
    pub parsed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The number of repetitions a quantified rule admits; `upper == None` is unbounded.
pub struct Cardinality {
    pub lower: usize,
    pub upper: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An error raised from [define_type](Parser::define_type) and
/// [define_sentence](Parser::define_sentence) when a sentence pattern is rejected.
pub enum DefinitionError {
    /// The meta grammar rejected the pattern string.
    PatternSyntax { pattern: String, message: String },
    /// The pattern referenced a type name which has not been defined.
    UnknownType { type_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An error raised by an [Evaluator], either user supplied or built-in (e.g. integer
/// overflow in the `int` type).
pub struct EvaluationError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An error raised by a user supplied [Autocompleter]. Completions gathered before the
/// error stay in the caller's list.
pub struct AutocompleterError {
    pub message: String,
}

/// Returned when the root matcher of a parse is [Failed](ParsingState::Failed).
///
/// The failure keeps the reconstructed parse tree alive so that editors can highlight
/// the offending span via
/// [first_autocompleting_ancestor_that_failed](ParseFailure::first_autocompleting_ancestor_that_failed).
pub struct ParseFailure {
    tree: ParseTree,
    frontier: Option<NodeId>,
}

/// The error surface of [parse](Parser::parse).
pub enum ParseError {
    Failure(Box<ParseFailure>),
    Autocomplete(AutocompleterError),
}
