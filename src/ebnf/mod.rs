//! The EBNF layer: high-level rule constructors (sequence, alternation, optional,
//! star/plus, bounded repetition, delimited join) which expand into plain BNF
//! productions with attached naming, AST and listener metadata.

mod builtins;
mod core;
mod rule;

#[cfg(test)]
mod __tests__;

use crate::autocomplete::Autocompleter;
use crate::complete_path::FilesystemPathCompleter;
use crate::evaluate::Evaluator;
use crate::symbol::{Named, NonTerminal, Symbol};
use crate::tree::ParsedNode;
use crate::{Bnf, Cardinality};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Listener invoked for every successfully parsed node of a rule.
pub type ParseListener = Rc<dyn Fn(ParsedNode)>;

/// A rule decorated with the name its parse nodes carry inside their parent; what
/// [define_type](crate::Parser::define_type) returns.
pub type NamedRule = Named<Rule>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The closed set of EBNF rule constructors.
pub enum RuleKind {
    /// `T -> C0 C1 ... Cn-1`
    Sequence,
    /// One production `T -> Ci` per option, tried in declaration order.
    Or,
    /// `T -> C | ε`
    Optional,
    /// `T -> C T | ε`, flattened after parsing.
    Star,
    /// Compiled as `T -> C star` with an internal star target, flattened.
    Plus { star_tgt: NonTerminal },
    /// One production per admissible length, longest first.
    Repeat { from: usize, to: usize },
    /// A delimited list of entries between optional open/close symbols.
    Join {
        open: Option<Symbol>,
        close: Option<Symbol>,
        delimiter: Option<Symbol>,
        cardinality: Cardinality,
        /// When set, open/close/delimiter nodes are dropped from the parsed
        /// children, leaving only the entries.
        only_keep_entries: bool,
        next_tgt: NonTerminal,
    },
}

/// A handle onto one EBNF rule of a grammar. Cloning shares the rule; rule identity
/// is handle identity.
#[derive(Clone)]
pub struct Rule {
    data: Rc<RuleData>,
}

pub(crate) struct RuleData {
    kind: RuleKind,
    tgt: NonTerminal,
    children: Vec<Symbol>,
    parsed_child_names: RefCell<Option<Vec<Option<String>>>>,
    evaluator: RefCell<Option<Evaluator>>,
    autocompleter: RefCell<Option<Autocompleter>>,
    on_successful_parsed: RefCell<Option<ParseListener>>,
}

/// The rule container of one grammar: a symbol table, the ordered rule list and the
/// BNF the rules compile into. Cloning shares the grammar.
#[derive(Clone)]
pub struct EbnfCore {
    state: Rc<CoreState>,
}

pub(crate) struct CoreState {
    symbols: RefCell<HashMap<String, Symbol>>,
    rules: RefCell<Vec<Rule>>,
    bnf: RefCell<Bnf>,
    compiled: Cell<bool>,
    anonymous_ids: Cell<usize>,
}

/// An [EbnfCore] pre-populated with the built-in types: sign, int, float, letter,
/// digit, whitespace, integer-range, color, time, date, date-time, month, weekday
/// and path, each a rule plus an evaluator.
pub struct Ebnf {
    core: EbnfCore,
    digit: Rule,
    letter: Rule,
    sign: Rule,
    integer: Rule,
    float: Rule,
    month: Rule,
    weekday: Rule,
    whitespace_star: Rule,
    whitespace_plus: Rule,
    integer_range: Rule,
    path: Rule,
    time: Rule,
    date: Rule,
    date_time: Rule,
    color: Rule,
    path_completer: Rc<FilesystemPathCompleter>,
}

impl Cardinality {
    pub const STAR: Cardinality = Cardinality {
        lower: 0,
        upper: None,
    };
    pub const PLUS: Cardinality = Cardinality {
        lower: 1,
        upper: None,
    };
    pub const OPTIONAL: Cardinality = Cardinality {
        lower: 0,
        upper: Some(1),
    };

    pub fn new(lower: usize, upper: usize) -> Self {
        Cardinality {
            lower,
            upper: Some(upper),
        }
    }

    pub fn fixed(n: usize) -> Self {
        Cardinality::new(n, n)
    }
}
