use crate::{Lexer, Matcher, ParsingState};
use regex::Regex;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

/// A grammar symbol. Identity is the symbol name string; two symbols are equal when
/// their kind and name agree.
#[derive(Clone, PartialEq, Eq)]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

/// A terminal symbol carrying a match function against the cursor.
#[derive(Clone)]
pub struct Terminal {
    data: Rc<TerminalData>,
}

struct TerminalData {
    symbol: String,
    kind: TerminalKind,
}

enum TerminalKind {
    Literal(String),
    CharacterClass(Regex),
    Epsilon,
    EndOfInput,
}

/// An identity-only symbol, expanded through the productions of the grammar.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NonTerminal {
    symbol: Rc<str>,
}

/// A symbol or rule decorated with the name its parse node will carry in its parent.
#[derive(Clone)]
pub struct Named<T> {
    obj: T,
    name: Option<String>,
}

/// A terminal matching the exact string `text`.
pub fn literal(text: &str) -> Symbol {
    Symbol::Terminal(Terminal::new(
        text.to_string(),
        TerminalKind::Literal(text.to_string()),
    ))
}

/// A terminal matching one character against a regex character class like `"[A-Z]"`.
pub fn character_class(pattern: &str) -> Result<Symbol, regex::Error> {
    let regex = Regex::new(pattern)?;
    Ok(Symbol::Terminal(Terminal::new(
        pattern.to_string(),
        TerminalKind::CharacterClass(regex),
    )))
}

pub(crate) fn built_in_class(symbol: &str, pattern: &str) -> Symbol {
    match Regex::new(pattern) {
        Ok(regex) => Symbol::Terminal(Terminal::new(
            symbol.to_string(),
            TerminalKind::CharacterClass(regex),
        )),
        Err(err) => panic!("Internal error: invalid built-in character class: {}", err),
    }
}

pub fn digit() -> Symbol {
    built_in_class("digit", "[0-9]")
}

pub fn letter() -> Symbol {
    built_in_class("letter", "[A-Za-z]")
}

/// Blank or tab; line breaks are reserved for the sentence separator.
pub fn whitespace() -> Symbol {
    built_in_class("whitespace", "[ \t]")
}

/// The distinguished terminal that always matches the empty string.
pub fn epsilon() -> Symbol {
    Symbol::Terminal(Terminal::new("ε".to_string(), TerminalKind::Epsilon))
}

/// The artificial stop terminal; succeeds exactly at the end of the input.
pub(crate) fn end_of_input() -> Symbol {
    Symbol::Terminal(Terminal::new("EOI".to_string(), TerminalKind::EndOfInput))
}

impl Terminal {
    fn new(symbol: String, kind: TerminalKind) -> Self {
        Self {
            data: Rc::new(TerminalData { symbol, kind }),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.data.symbol
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self.data.kind, TerminalKind::Epsilon)
    }

    pub(crate) fn is_literal(&self) -> bool {
        matches!(self.data.kind, TerminalKind::Literal(_))
    }

    /// Match this terminal at the current cursor position.
    ///
    /// Running out of input while characters were still expected yields
    /// [EndOfInput](ParsingState::EndOfInput) instead of a failure; that state is what
    /// the autocompletion engine later picks up. A failed match keeps the attempted
    /// prefix plus the mismatching character, so that highlights cover it.
    pub fn matches(&self, lexer: &Lexer) -> Matcher {
        let pos = lexer.pos();
        let rest = lexer.rest();
        match &self.data.kind {
            TerminalKind::Literal(text) => {
                if rest.starts_with(text.as_str()) {
                    return Matcher::new(ParsingState::Successful, pos, text.clone());
                }
                let mut consumed = String::new();
                for (expected, found) in text.chars().zip(rest.chars()) {
                    if expected != found {
                        consumed.push(found);
                        return Matcher::new(ParsingState::Failed, pos, consumed);
                    }
                    consumed.push(found);
                }
                // the rest is a proper prefix of the literal
                Matcher::new(ParsingState::EndOfInput, pos, consumed)
            }
            TerminalKind::CharacterClass(regex) => match rest.chars().next() {
                None => Matcher::new(ParsingState::EndOfInput, pos, ""),
                Some(c) => {
                    let s = c.to_string();
                    if regex.is_match(&s) {
                        Matcher::new(ParsingState::Successful, pos, s)
                    } else {
                        Matcher::new(ParsingState::Failed, pos, s)
                    }
                }
            },
            TerminalKind::Epsilon => Matcher::new(ParsingState::Successful, pos, ""),
            TerminalKind::EndOfInput => {
                if lexer.is_done() {
                    Matcher::new(ParsingState::Successful, pos, "")
                } else {
                    Matcher::new(ParsingState::Failed, pos, "")
                }
            }
        }
    }
}

impl PartialEq for Terminal {
    fn eq(&self, other: &Self) -> bool {
        self.data.symbol == other.data.symbol
    }
}

impl Eq for Terminal {}

impl Debug for Terminal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.data.symbol)
    }
}

impl NonTerminal {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: Rc::from(symbol),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Debug for NonTerminal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.symbol)
    }
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(t) => t.symbol(),
            Symbol::NonTerminal(nt) => nt.symbol(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_epsilon(&self) -> bool {
        match self {
            Symbol::Terminal(t) => t.is_epsilon(),
            Symbol::NonTerminal(_) => false,
        }
    }

    pub fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Symbol::Terminal(t) => Some(t),
            Symbol::NonTerminal(_) => None,
        }
    }

    pub fn as_non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::Terminal(_) => None,
            Symbol::NonTerminal(nt) => Some(nt),
        }
    }

    pub fn with_name(&self, name: impl Into<String>) -> Named<Symbol> {
        Named::new(self.clone(), Some(name.into()))
    }

    pub fn unnamed(&self) -> Named<Symbol> {
        Named::new(self.clone(), None)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(t) => Debug::fmt(t, f),
            Symbol::NonTerminal(nt) => Debug::fmt(nt, f),
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl<T> Named<T> {
    pub fn new(obj: T, name: Option<String>) -> Self {
        Self { obj, name }
    }

    pub fn get(&self) -> &T {
        &self.obj
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn name_cloned(&self) -> Option<String> {
        self.name.clone()
    }
}

impl Named<Symbol> {
    pub fn symbol(&self) -> &Symbol {
        &self.obj
    }
}
