use crate::autocomplete::Autocompletion;
use crate::bnf::{Bnf, Production};
use crate::lexer::Lexer;
use crate::symbol::{Symbol, Terminal};
use crate::tree::{NodeId, ParseTree};
use crate::util::Log;
use crate::{AutocompleterError, Matcher, ParseError, ParseFailure, ParsingState};
use once_cell::unsync::OnceCell;
use std::collections::HashSet;
use std::rc::Rc;

const DEFAULT_MAX_RECURSION_DEPTH: usize = 10_000;

/// Working state of one derivation attempt: the current symbol sequence, the position
/// of the symbol being expanded, a back-pointer to the sequence it was derived from,
/// the production applied for the derivation, and the matchers of the terminals
/// consumed so far. Lives for the duration of one `parse` call.
#[derive(Clone)]
pub(crate) struct SymbolSequence {
    sequence: Vec<Symbol>,
    pos: usize,
    parent: Option<Rc<SymbolSequence>>,
    production: Option<Production>,
    matchers: Vec<Matcher>,
}

impl SymbolSequence {
    fn start(symbol: Symbol) -> Self {
        Self {
            sequence: vec![symbol],
            pos: 0,
            parent: None,
            production: None,
            matchers: Vec::new(),
        }
    }

    fn current_symbol(&self) -> Option<&Symbol> {
        self.sequence.get(self.pos)
    }

    fn last_matcher(&self) -> Option<&Matcher> {
        self.matchers.last()
    }

    /// Derive a child sequence by splicing the production's right-hand side over the
    /// current symbol; the parent link and the applied production are recorded for
    /// tree reconstruction.
    fn replace_current(parent: &Rc<SymbolSequence>, production: Production) -> SymbolSequence {
        let mut sequence = parent.sequence.clone();
        sequence.splice(
            parent.pos..parent.pos + 1,
            production.right().iter().cloned(),
        );
        SymbolSequence {
            sequence,
            pos: parent.pos,
            parent: Some(parent.clone()),
            production: Some(production),
            matchers: parent.matchers.clone(),
        }
    }
}

/// Depth-first, alternative-ordered recursive descent driver over a [Bnf].
///
/// Produces both a best parse tree and, when a completion accumulator is supplied,
/// the completions derived from every end-of-input frontier encountered on the way.
pub struct RdParser<'g, 't> {
    grammar: &'g Bnf,
    lexer: Lexer<'t>,
    parse_start_listeners: Vec<Rc<dyn Fn()>>,
    max_recursion_depth: usize,
    debugger: OnceCell<Log<&'static str>>,
}

impl<'g, 't> RdParser<'g, 't> {
    pub fn new(grammar: &'g Bnf, lexer: Lexer<'t>) -> Self {
        Self {
            grammar,
            lexer,
            parse_start_listeners: Vec::new(),
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            debugger: OnceCell::new(),
        }
    }

    /// Bound on derivation nesting; at the limit the pending non-terminal fails
    /// instead of being expanded.
    pub fn set_max_recursion_depth(&mut self, depth: usize) {
        self.max_recursion_depth = depth;
    }

    /// Set a log label to trace the driver based on the level of [Log].
    pub fn set_log(&self, debugger: Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this parser.", err))
    }

    pub fn add_parse_start_listener(&mut self, listener: Rc<dyn Fn()>) {
        self.parse_start_listeners.push(listener);
    }

    pub fn lexer(&self) -> &Lexer<'t> {
        &self.lexer
    }

    /// Run the parse. With a completion accumulator, end-of-input frontiers are
    /// turned into [Autocompletion]s before the main tree is reconstructed.
    ///
    /// Returns the parse tree; its root matcher is
    /// [Successful](ParsingState::Successful) only if the whole input was consumed.
    /// A [Failed](ParsingState::Failed) root is returned as [ParseError::Failure].
    pub fn parse(
        &mut self,
        completions: Option<&mut Vec<Autocompletion>>,
    ) -> Result<ParseTree, ParseError> {
        let seq = SymbolSequence::start(Symbol::NonTerminal(Bnf::artificial_start()));
        let mut end_of_input: Vec<SymbolSequence> = Vec::new();
        let parsed_sequence = self.parse_recursive(seq, &mut end_of_input, 0);

        if let Some(completions) = completions {
            self.collect_autocompletions(&end_of_input, completions)?;
            // strip the veto sentinel; completions collected before it remain
            if completions.last().map_or(false, |c| c.is_veto()) {
                completions.pop();
            }
        }

        let (mut tree, root, last) = self.create_parsed_tree(&parsed_sequence);
        build_ast(&mut tree, root);
        notify_successful_parse_listeners(&tree, root);

        if tree.root().matcher().state == ParsingState::Failed {
            return Err(ParseError::Failure(Box::new(ParseFailure::new(tree, last))));
        }
        Ok(tree)
    }

    fn fire_parsing_started(&self) {
        for listener in &self.parse_start_listeners {
            (**listener)();
        }
    }

    /// One step of the recursion: consume terminals until a non-terminal is reached,
    /// then try its productions in declaration order. The first successful
    /// alternative wins; otherwise the attempt whose matcher is best is kept and the
    /// lexer restored to its end position.
    fn parse_recursive(
        &mut self,
        mut seq: SymbolSequence,
        end_of_input: &mut Vec<SymbolSequence>,
        depth: usize,
    ) -> SymbolSequence {
        let next = loop {
            let symbol = match seq.current_symbol() {
                Some(symbol) => symbol.clone(),
                None => {
                    // a fully-epsilon derivation exhausted the sequence; without a
                    // matcher of its own it records a zero-width success, so the
                    // alternatives loop below can still pick it
                    if seq.matchers.is_empty() {
                        seq.matchers.push(Matcher::new(
                            ParsingState::Successful,
                            self.lexer.pos(),
                            "",
                        ));
                    }
                    return seq;
                }
            };
            match symbol {
                Symbol::NonTerminal(nt) => break nt,
                Symbol::Terminal(terminal) => {
                    let matcher = terminal.matches(&self.lexer);
                    self.log_terminal(&terminal, &matcher);
                    let state = matcher.state;
                    let consumed = matcher.parsed.len();
                    seq.matchers.push(matcher);
                    if state == ParsingState::EndOfInput {
                        end_of_input.push(seq.clone());
                    }
                    if state != ParsingState::Successful {
                        return seq;
                    }
                    seq.pos += 1;
                    self.lexer.fwd(consumed);
                    if self.lexer.is_done() {
                        return seq;
                    }
                }
            }
        };

        if depth >= self.max_recursion_depth {
            seq.matchers
                .push(Matcher::new(ParsingState::Failed, self.lexer.pos(), ""));
            return seq;
        }

        let alternatives: Vec<Production> = self.grammar.productions_of(&next).to_vec();
        let parent = Rc::new(seq);
        let mut best: Option<SymbolSequence> = None;
        let mut lexer_pos_of_best = self.lexer.pos();

        for alternative in alternatives {
            let lexer_pos = self.lexer.pos();
            self.log_alternative(&alternative);
            let next_sequence = SymbolSequence::replace_current(&parent, alternative);
            let parsed_sequence = self.parse_recursive(next_sequence, end_of_input, depth + 1);
            if parsed_sequence.last_matcher().is_some() {
                if parsed_sequence.last_matcher().map(|m| m.state)
                    == Some(ParsingState::Successful)
                {
                    return parsed_sequence;
                }
                let better = match best.as_ref().and_then(|b| b.last_matcher()) {
                    Some(best_matcher) => parsed_sequence
                        .last_matcher()
                        .map_or(false, |m| m.is_better_than(best_matcher)),
                    None => true,
                };
                if better {
                    lexer_pos_of_best = self.lexer.pos();
                    best = Some(parsed_sequence);
                }
            }
            self.lexer.set_pos(lexer_pos);
        }

        match best {
            Some(best) => {
                self.lexer.set_pos(lexer_pos_of_best);
                best
            }
            None => match Rc::try_unwrap(parent) {
                Ok(seq) => seq,
                Err(rc) => (*rc).clone(),
            },
        }
    }

    /// Reconstruct the parse tree of a (leaf) symbol sequence by folding it into its
    /// ancestors, then notify the extension listeners top-down. Returns the tree,
    /// its root and the frontier node (the one carrying the last matcher).
    fn create_parsed_tree(
        &self,
        leaf: &SymbolSequence,
    ) -> (ParseTree, NodeId, Option<NodeId>) {
        self.fire_parsing_started();

        let mut tree = ParseTree::new();
        let n_matchers = leaf.matchers.len();
        let mut node_sequence: Vec<NodeId> = leaf
            .sequence
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                let matcher = if i < n_matchers {
                    leaf.matchers[i].clone()
                } else {
                    Matcher::not_parsed()
                };
                tree.alloc(matcher, symbol.clone(), None)
            })
            .collect();

        let last = if n_matchers == 0 {
            node_sequence.last().copied()
        } else {
            node_sequence.get(n_matchers - 1).copied()
        };

        let mut child_sequence = leaf;
        while let Some(parent_sequence) = child_sequence.parent.as_deref() {
            let production = match child_sequence.production.clone() {
                Some(production) => production,
                None => panic!("Internal error: derived sequence without a production"),
            };
            let pos = parent_sequence.pos;
            let rhs_len = production.right().len();
            let child_list: Vec<NodeId> = node_sequence[pos..pos + rhs_len].to_vec();

            let matcher = matcher_from_child_sequence(&tree, &child_list);
            let new_parent = tree.alloc(
                matcher,
                Symbol::NonTerminal(production.left().clone()),
                Some(production),
            );
            tree.add_children(new_parent, &child_list);
            node_sequence.splice(pos..pos + rhs_len, [new_parent]);

            child_sequence = parent_sequence;
        }

        let root = node_sequence[0];
        tree.set_root(root);
        notify_extension_listeners(&mut tree, root);
        (tree, root, last)
    }

    /// For every end-of-input frontier, reconstruct its tree, find the root-closest
    /// ancestor which provides autocompletion, deduplicate those ancestors by
    /// production shape and collect their completions.
    fn collect_autocompletions(
        &self,
        end_of_input: &[SymbolSequence],
        completions: &mut Vec<Autocompletion>,
    ) -> Result<(), AutocompleterError> {
        let mut autocompleting_parents: Vec<(ParseTree, NodeId)> = Vec::new();
        for seq in end_of_input {
            let (tree, root, last) = self.create_parsed_tree(seq);
            // custom completers may read state maintained by parse listeners, so the
            // frontier tree notifies them before completions are computed
            notify_successful_parse_listeners(&tree, root);
            let last = match last {
                Some(last) => last,
                None => continue,
            };

            let mut path_to_root = vec![last];
            let mut node = tree.handle(last);
            while let Some(parent) = node.parent() {
                path_to_root.push(parent.id);
                node = parent;
            }
            path_to_root.reverse();

            let mut autocompleting_parent = None;
            for id in path_to_root {
                if tree.handle(id).does_autocomplete()? {
                    autocompleting_parent = Some(id);
                    break;
                }
            }
            if let Some(id) = autocompleting_parent {
                autocompleting_parents.push((tree, id));
            }
        }

        let mut done: HashSet<String> = HashSet::new();
        for (tree, parent) in &autocompleting_parents {
            let handle = tree.handle(*parent);
            let key = match handle.production() {
                Some(production) => production.key(),
                None => handle.symbol().name().to_string(),
            };
            if done.insert(key) {
                self.add_autocompletions(handle, completions)?;
            }
        }
        Ok(())
    }

    fn add_autocompletions(
        &self,
        parent: crate::ParsedNode,
        completions: &mut Vec<Autocompletion>,
    ) -> Result<(), AutocompleterError> {
        if completions.last().map_or(false, |c| c.is_veto()) {
            return Ok(());
        }
        let parent_start = parent.matcher().pos;
        let already_entered = self.lexer.substring_from(parent_start);

        if let Some(list) = parent.get_autocompletion(false)? {
            for mut completion in list {
                if completion.completion().is_empty() {
                    continue;
                }
                if completion.is_veto() {
                    // sentinel preventing further autocompletion
                    completions.push(Autocompletion::veto());
                    return Ok(());
                }
                completion.set_already_entered_text(already_entered);
                let rendered = completion.completion();
                if !completions.iter().any(|c| c.completion() == rendered) {
                    completions.push(completion);
                }
            }
        }
        Ok(())
    }

    fn log_terminal(&self, _terminal: &Terminal, _matcher: &Matcher) {
        #[cfg(debug_assertions)]
        if let Some(debugger) = self.debugger.get() {
            let (terminal, matcher) = (_terminal, _matcher);
            if matcher.state == ParsingState::Successful {
                if debugger.order() >= Log::Success(()).order() {
                    println!(
                        "[{}; TerminalSuccess]: {:?} at {}",
                        debugger,
                        terminal.symbol(),
                        matcher.pos
                    );
                }
            } else if debugger.order() >= Log::Result(()).order() {
                println!(
                    "[{}; TerminalResult]: {:?} {:?} at {}",
                    debugger,
                    terminal.symbol(),
                    matcher.state,
                    matcher.pos
                );
            }
        }
    }

    fn log_alternative(&self, _production: &Production) {
        #[cfg(debug_assertions)]
        if let Some(debugger) = self.debugger.get() {
            if debugger.order() >= Log::Verbose(()).order() {
                println!(
                    "[{}; Alternative]: {} at {}",
                    debugger,
                    _production,
                    self.lexer.pos()
                );
            }
        }
    }
}

/// Combine the matchers of a freshly folded child row: the position of the first
/// child that was parsed at all, the state of the weakest meaningful child (stopping
/// at the first end-of-input or failure), and the concatenated parsed text.
fn matcher_from_child_sequence(tree: &ParseTree, children: &[NodeId]) -> Matcher {
    let mut pos: Option<usize> = None;
    let mut state = ParsingState::NotParsed;
    let mut parsed = String::new();
    for &child in children {
        if state == ParsingState::EndOfInput || state == ParsingState::Failed {
            break;
        }
        let matcher = tree.handle(child).matcher();
        let child_state = matcher.state;
        if child_state != ParsingState::NotParsed {
            if pos.is_none() {
                pos = Some(matcher.pos);
            }
            if state == ParsingState::NotParsed || !child_state.is_better_than(state) {
                state = child_state;
            }
        }
        parsed.push_str(&matcher.parsed);
    }
    Matcher::new(state, pos.unwrap_or(0), parsed)
}

fn notify_extension_listeners(tree: &mut ParseTree, node: NodeId) {
    if let Some(production) = tree.production(node).cloned() {
        if let Some(listener) = production.extension() {
            let children = tree.children(node).to_vec();
            (**listener)(tree, node, &children);
        }
    }
    let children = tree.children(node).to_vec();
    for child in children {
        notify_extension_listeners(tree, child);
    }
}

/// Depth-first AST build: children are rebuilt first, then the production's builder
/// re-attaches them to the parent (flattening for Star/Plus/Join); without a builder
/// the children are re-attached unchanged.
fn build_ast(tree: &mut ParseTree, node: NodeId) {
    let children = tree.children(node).to_vec();
    for &child in &children {
        build_ast(tree, child);
    }
    tree.remove_all_children(node);
    if let Some(production) = tree.production(node).cloned() {
        match production.ast_builder() {
            Some(builder) => (**builder)(tree, node, &children),
            None => tree.add_children(node, &children),
        }
    }
}

/// Post-order notification of `on_successful_parsed` listeners, skipping nodes whose
/// parent shares the same rule (avoids duplicate notifications from recursive
/// Star/Plus/Join expansions).
fn notify_successful_parse_listeners(tree: &ParseTree, node: NodeId) {
    for &child in tree.children(node) {
        notify_successful_parse_listeners(tree, child);
    }
    let handle = tree.handle(node);
    let state = handle.matcher().state;
    if state != ParsingState::Successful && state != ParsingState::EndOfInput {
        return;
    }
    if let Some(rule) = handle.rule() {
        if !handle.parent_has_same_rule() {
            if let Some(listener) = rule.on_successful_parsed_listener() {
                (*listener)(handle);
            }
        }
    }
}
