//! Autocompletion values and the completers that produce them.
//!
//! A parse with a completion accumulator records every end-of-input frontier; the
//! engine walks each frontier tree towards the root, finds the autocompleting
//! ancestor and asks it for completions. A completion is one of a closed set of
//! variants; its [completion](Autocompletion::completion) string is what an editor
//! inserts, with `${name}` markers standing for editable parameters.

use crate::bnf::Production;
use crate::complete_path::CompletePath;
use crate::ebnf::{EbnfCore, Rule};
use crate::lexer::Lexer;
use crate::rd_parser::RdParser;
use crate::symbol::Symbol;
use crate::tree::ParsedNode;
use crate::{AutocompleterError, Bnf, ParseError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Rendering of a [Veto](Autocompletion::is_veto) completion.
pub const VETO: &str = "VETO";

#[derive(Clone)]
enum AutocompletionKind {
    /// Insert the text verbatim.
    Literal(String),
    /// Insert an editable `${name}` parameter.
    Parameterized(String),
    /// Suppress all completions collected later during this call.
    Veto,
    /// Probe answer of `just_check` calls; carries no insertable text.
    DoesAutocomplete,
    /// Ordered per-child completion lists of a sequence rule; renders as the
    /// concatenation, with `${childName}` where a child has several options.
    EntireSequence {
        rule: Rule,
        completions: Vec<Vec<Autocompletion>>,
    },
}

/// One possible continuation of a partial input.
#[derive(Clone)]
pub struct Autocompletion {
    kind: AutocompletionKind,
    already_entered: String,
}

impl Autocompletion {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: AutocompletionKind::Literal(text.into()),
            already_entered: String::new(),
        }
    }

    pub fn parameterized(name: impl Into<String>) -> Self {
        Self {
            kind: AutocompletionKind::Parameterized(name.into()),
            already_entered: String::new(),
        }
    }

    pub fn veto() -> Self {
        Self {
            kind: AutocompletionKind::Veto,
            already_entered: String::new(),
        }
    }

    pub fn does_autocomplete() -> Self {
        Self {
            kind: AutocompletionKind::DoesAutocomplete,
            already_entered: String::new(),
        }
    }

    pub fn entire_sequence(rule: Rule) -> Self {
        Self {
            kind: AutocompletionKind::EntireSequence {
                rule,
                completions: Vec::new(),
            },
            already_entered: String::new(),
        }
    }

    fn sequence_completions(&mut self) -> &mut Vec<Vec<Autocompletion>> {
        match &mut self.kind {
            AutocompletionKind::EntireSequence { completions, .. } => completions,
            _ => panic!("not an entire-sequence completion"),
        }
    }

    /// Append the completion list of the next child.
    pub fn add_child_completions(&mut self, completions: Vec<Autocompletion>) {
        self.sequence_completions().push(completions);
    }

    pub fn add_child_literal(&mut self, text: &str) {
        self.add_child_completions(vec![Autocompletion::literal(text)]);
    }

    pub fn add_child_parameterized(&mut self, name: &str) {
        self.add_child_completions(vec![Autocompletion::parameterized(name)]);
    }

    pub fn is_veto(&self) -> bool {
        matches!(self.kind, AutocompletionKind::Veto)
    }

    /// The text an editor would insert for this completion.
    pub fn completion(&self) -> String {
        match &self.kind {
            AutocompletionKind::Literal(text) => text.clone(),
            AutocompletionKind::Parameterized(name) => format!("${{{}}}", name),
            AutocompletionKind::Veto => VETO.to_string(),
            AutocompletionKind::DoesAutocomplete => "Something".to_string(),
            AutocompletionKind::EntireSequence { rule, completions } => {
                let mut rendered = String::new();
                for (idx, child_completions) in completions.iter().enumerate() {
                    match child_completions.len() {
                        0 => {}
                        1 => rendered.push_str(&child_completions[0].completion()),
                        _ => {
                            let name = rule.name_for_child(idx).unwrap_or_else(|| {
                                rule.children()[idx].name().to_string()
                            });
                            rendered.push_str("${");
                            rendered.push_str(&name);
                            rendered.push('}');
                        }
                    }
                }
                rendered
            }
        }
    }

    /// The substring from the start of the autocompleting ancestor to the cursor.
    pub fn already_entered_text(&self) -> &str {
        &self.already_entered
    }

    pub(crate) fn set_already_entered_text(&mut self, text: &str) {
        self.already_entered = text.to_string();
    }
}

impl PartialEq for Autocompletion {
    fn eq(&self, other: &Self) -> bool {
        self.completion() == other.completion() && self.already_entered == other.already_entered
    }
}

impl Debug for Autocompletion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({:?})", self.completion(), self.already_entered)
    }
}

/// Cache of child completion lists keyed by `childSymbol:childName`, shared by the
/// entire-sequence completers of one [Parser](crate::Parser) and cleared at the start
/// of every top-level parse.
pub type CompletionCache = Rc<RefCell<HashMap<String, Vec<Autocompletion>>>>;

type CustomCompleter =
    Rc<dyn Fn(ParsedNode, bool) -> Result<Option<Vec<Autocompletion>>, AutocompleterError>>;

/// A capability attached to a rule producing the completions of its nodes.
///
/// `None` means "this node does not take part in autocompletion here"; an empty list
/// means "it does, but offers nothing" (which shields deeper nodes).
#[derive(Clone)]
pub enum Autocompleter {
    /// Veto once text has been entered, else complete to a `${name}` parameter.
    Inline,
    /// Offer the given literal while nothing has been entered yet.
    IfNothingYetEntered(String),
    /// Compose the completions of every child of the sequence rule by probing each
    /// child's sub-grammar on empty input.
    EntireSequence {
        grammar: EbnfCore,
        cache: CompletionCache,
    },
    /// Defer to an external path enumerator.
    Path(Rc<dyn CompletePath>),
    /// A user supplied completer.
    Custom(CustomCompleter),
}

impl Autocompleter {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(ParsedNode, bool) -> Result<Option<Vec<Autocompletion>>, AutocompleterError>
            + 'static,
    {
        Autocompleter::Custom(Rc::new(f))
    }

    pub fn complete(
        &self,
        pn: ParsedNode,
        just_check: bool,
    ) -> Result<Option<Vec<Autocompletion>>, AutocompleterError> {
        match self {
            Autocompleter::Inline => {
                if !pn.parsed_text().is_empty() {
                    return Ok(Some(vec![Autocompletion::veto()]));
                }
                Ok(Some(vec![Autocompletion::parameterized(pn.name())]))
            }
            Autocompleter::IfNothingYetEntered(text) => {
                if pn.parsed_text().is_empty() {
                    Ok(Some(vec![Autocompletion::literal(text.as_str())]))
                } else {
                    Ok(Some(Vec::new()))
                }
            }
            Autocompleter::EntireSequence { grammar, cache } => {
                entire_sequence_completion(grammar, cache, pn)
            }
            Autocompleter::Path(completer) => {
                if just_check {
                    return Ok(Some(vec![Autocompletion::does_autocomplete()]));
                }
                let completions = completer
                    .complete_path(pn.parsed_text())
                    .into_iter()
                    .map(Autocompletion::literal)
                    .collect();
                Ok(Some(completions))
            }
            Autocompleter::Custom(f) => (**f)(pn, just_check),
        }
    }
}

impl Debug for Autocompleter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Autocompleter::Inline => "Inline",
            Autocompleter::IfNothingYetEntered(_) => "IfNothingYetEntered",
            Autocompleter::EntireSequence { .. } => "EntireSequence",
            Autocompleter::Path(_) => "Path",
            Autocompleter::Custom(_) => "Custom",
        };
        write!(f, "Autocompleter::{}", label)
    }
}

/// For each child of the autocompleting sequence rule, parse empty input against a
/// sub-grammar whose start expands to just that child, and collect what it would
/// complete to. Results are cached per `childSymbol:childName`.
fn entire_sequence_completion(
    grammar: &EbnfCore,
    cache: &CompletionCache,
    pn: ParsedNode,
) -> Result<Option<Vec<Autocompletion>>, AutocompleterError> {
    let already_entered = pn.parsed_text().to_string();
    let sequence = match pn.rule() {
        Some(rule) => rule,
        None => return Ok(None),
    };

    let mut entire = Autocompletion::entire_sequence(sequence.clone());
    for (idx, child) in sequence.children().iter().enumerate() {
        let child_name = sequence.name_for_child(idx);
        let key = format!(
            "{}:{}",
            child.name(),
            child_name.as_deref().unwrap_or_default()
        );
        if let Some(cached) = cache.borrow().get(&key) {
            entire.add_child_completions(cached.clone());
            continue;
        }

        let mut bnf = grammar.copy_bnf();
        let probe = Rule::probe_sequence(child.clone(), child_name);
        probe.create_bnf(&mut bnf);
        bnf.remove_start_production();
        bnf.add_production(Production::new(
            Bnf::artificial_start(),
            vec![Symbol::NonTerminal(probe.tgt().clone())],
        ));

        let mut completions_for_child: Vec<Autocompletion> = Vec::new();
        let mut parser = RdParser::new(&bnf, Lexer::new(""));
        match parser.parse(Some(&mut completions_for_child)) {
            Ok(_) | Err(ParseError::Failure(_)) => {}
            Err(ParseError::Autocomplete(err)) => return Err(err),
        }

        cache
            .borrow_mut()
            .insert(key, completions_for_child.clone());
        entire.add_child_completions(completions_for_child);
    }

    // avoid offering the sequence when the cursor already sits inside its first
    // parameter
    if already_entered.is_empty() {
        return Ok(Some(vec![entire]));
    }
    match entire.completion().find("${") {
        Some(idx) if already_entered.len() > idx => Ok(None),
        _ => Ok(Some(vec![entire])),
    }
}
