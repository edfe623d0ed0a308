use super::{Named, NamedRule, ParseListener, Rule, RuleData, RuleKind};
use crate::autocomplete::Autocompleter;
use crate::bnf::{Bnf, Production};
use crate::evaluate::Evaluator;
use crate::symbol::{NonTerminal, Symbol};
use crate::tree::{NodeId, ParseTree};
use crate::Cardinality;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

impl Rule {
    pub(crate) fn new(kind: RuleKind, tgt: NonTerminal, children: Vec<Symbol>) -> Self {
        Self {
            data: Rc::new(RuleData {
                kind,
                tgt,
                children,
                parsed_child_names: RefCell::new(None),
                evaluator: RefCell::new(None),
                autocompleter: RefCell::new(None),
                on_successful_parsed: RefCell::new(None),
            }),
        }
    }

    /// Anonymous single-child sequence used to probe the sub-grammar of one child
    /// during entire-sequence autocompletion.
    pub(crate) fn probe_sequence(child: Symbol, name: Option<String>) -> Rule {
        let rule = Rule::new(
            RuleKind::Sequence,
            NonTerminal::new("autocomplete-probe"),
            vec![child],
        );
        rule.set_parsed_child_names(vec![name]);
        rule
    }

    pub fn kind(&self) -> &RuleKind {
        &self.data.kind
    }

    /// The non-terminal this rule's productions expand.
    pub fn tgt(&self) -> &NonTerminal {
        &self.data.tgt
    }

    pub fn children(&self) -> &[Symbol] {
        &self.data.children
    }

    /// The single entry symbol of a quantified rule.
    pub fn entry(&self) -> &Symbol {
        &self.data.children[0]
    }

    pub(crate) fn set_parsed_child_names(&self, names: Vec<Option<String>>) {
        *self.data.parsed_child_names.borrow_mut() = Some(names);
    }

    /// The user-visible name assigned to the `idx`-th parsed child. A single
    /// declared name applies to every repetition.
    pub fn name_for_child(&self, idx: usize) -> Option<String> {
        let names = self.data.parsed_child_names.borrow();
        let names = names.as_ref()?;
        if names.len() == 1 {
            return names[0].clone();
        }
        if idx >= names.len() {
            return Some("no name".to_string());
        }
        names[idx].clone()
    }

    pub fn set_evaluator(&self, evaluator: Evaluator) -> Rule {
        *self.data.evaluator.borrow_mut() = Some(evaluator);
        self.clone()
    }

    pub fn evaluator(&self) -> Option<Evaluator> {
        self.data.evaluator.borrow().clone()
    }

    pub fn set_autocompleter(&self, autocompleter: Autocompleter) -> Rule {
        *self.data.autocompleter.borrow_mut() = Some(autocompleter);
        self.clone()
    }

    pub fn autocompleter(&self) -> Option<Autocompleter> {
        self.data.autocompleter.borrow().clone()
    }

    pub fn on_successful_parsed(&self, listener: ParseListener) -> Rule {
        *self.data.on_successful_parsed.borrow_mut() = Some(listener);
        self.clone()
    }

    pub(crate) fn on_successful_parsed_listener(&self) -> Option<ParseListener> {
        self.data.on_successful_parsed.borrow().clone()
    }

    /// Decorate the rule's target symbol with the name its parse node will carry.
    pub fn with_name(&self, name: impl Into<String>) -> Named<Symbol> {
        Named::new(Symbol::NonTerminal(self.tgt().clone()), Some(name.into()))
    }

    pub fn unnamed(&self) -> Named<Symbol> {
        Named::new(Symbol::NonTerminal(self.tgt().clone()), None)
    }

    fn production(&self, left: NonTerminal, right: Vec<Symbol>) -> Production {
        Production::new(left, right).with_rule(self.clone())
    }

    /// Extension listener assigning index-based names, shared by Sequence and Repeat.
    fn indexed_extension(&self) -> Rc<dyn Fn(&mut ParseTree, NodeId, &[NodeId])> {
        let rule = self.clone();
        Rc::new(move |tree, _parent, children| {
            for (idx, &child) in children.iter().enumerate() {
                tree.set_nth_entry(child, idx);
                tree.set_name(child, rule.name_for_child(idx));
            }
        })
    }

    /// Extension listener of the recursive list shape `X -> entry X'`: the entry
    /// continues the repetition count of the parent, the tail inherits name and
    /// count + 1, so that flattened entries end up numbered 0, 1, 2, ...
    fn chained_extension(
        &self,
        entry_index: usize,
    ) -> Rc<dyn Fn(&mut ParseTree, NodeId, &[NodeId])> {
        let rule = self.clone();
        Rc::new(move |tree, parent, children| {
            let nth = tree.nth_entry(parent);
            tree.set_nth_entry(children[entry_index], nth);
            tree.set_name(children[entry_index], rule.name_for_child(nth));
            tree.set_nth_entry(children[entry_index + 1], nth + 1);
            let parent_name = tree.handle(parent).name().to_string();
            tree.set_name(children[entry_index + 1], Some(parent_name));
        })
    }

    /// AST builder of the recursive list shape: keep the entry, splice in the
    /// (already flattened) children of the tail.
    fn flattening_ast_builder(
        entry_index: usize,
        keep_head: bool,
    ) -> Rc<dyn Fn(&mut ParseTree, NodeId, &[NodeId])> {
        Rc::new(move |tree, parent, children| {
            if keep_head && entry_index > 0 {
                tree.add_children(parent, &children[0..entry_index]);
            }
            tree.add_children(parent, &children[entry_index..entry_index + 1]);
            let grandchildren = tree.children(children[entry_index + 1]).to_vec();
            tree.add_children(parent, &grandchildren);
        })
    }

    /// Emit the BNF productions of this rule, with the extension listeners that
    /// rename/renumber children after tree reconstruction and the AST builders that
    /// flatten recursive expansions.
    pub(crate) fn create_bnf(&self, bnf: &mut Bnf) {
        let tgt = self.tgt().clone();
        match self.kind().clone() {
            RuleKind::Sequence => {
                bnf.add_production(
                    self.production(tgt, self.children().to_vec())
                        .with_extension(self.indexed_extension()),
                );
            }
            RuleKind::Or => {
                for (idx, option) in self.children().iter().enumerate() {
                    let rule = self.clone();
                    bnf.add_production(
                        self.production(tgt.clone(), vec![option.clone()])
                            .with_extension(Rc::new(move |tree, _parent, children| {
                                tree.set_nth_entry(children[0], idx);
                                tree.set_name(children[0], rule.name_for_child(idx));
                            })),
                    );
                }
            }
            RuleKind::Optional => {
                let rule = self.clone();
                bnf.add_production(
                    self.production(tgt.clone(), vec![self.entry().clone()])
                        .with_extension(Rc::new(move |tree, _parent, children| {
                            tree.set_nth_entry(children[0], 0);
                            tree.set_name(children[0], rule.name_for_child(0));
                        })),
                );
                bnf.add_production(self.production(tgt, Vec::new()));
            }
            RuleKind::Star => {
                bnf.add_production(
                    self.production(
                        tgt.clone(),
                        vec![self.entry().clone(), Symbol::NonTerminal(tgt.clone())],
                    )
                    .with_extension(self.chained_extension(0))
                    .with_ast_builder(Rule::flattening_ast_builder(0, false)),
                );
                bnf.add_production(self.production(tgt, Vec::new()));
            }
            RuleKind::Plus { star_tgt } => {
                // plus compiles as entry followed by an internal star
                bnf.add_production(
                    self.production(
                        tgt,
                        vec![self.entry().clone(), Symbol::NonTerminal(star_tgt.clone())],
                    )
                    .with_extension(self.chained_extension(0))
                    .with_ast_builder(Rule::flattening_ast_builder(0, false)),
                );
                bnf.add_production(
                    self.production(
                        star_tgt.clone(),
                        vec![self.entry().clone(), Symbol::NonTerminal(star_tgt.clone())],
                    )
                    .with_extension(self.chained_extension(0))
                    .with_ast_builder(Rule::flattening_ast_builder(0, false)),
                );
                bnf.add_production(self.production(star_tgt, Vec::new()));
            }
            RuleKind::Repeat { from, to } => {
                // longest alternatives first, so that the parser tries the longest
                // fit before the shortest
                for seq_len in (from..=to).rev() {
                    bnf.add_production(
                        self.production(tgt.clone(), vec![self.entry().clone(); seq_len])
                            .with_extension(self.indexed_extension()),
                    );
                }
            }
            RuleKind::Join {
                open,
                close,
                delimiter,
                cardinality,
                only_keep_entries,
                next_tgt,
            } => {
                self.create_join_bnf(
                    bnf,
                    open,
                    close,
                    delimiter,
                    cardinality,
                    only_keep_entries,
                    next_tgt,
                );
            }
        }
    }

    fn create_join_bnf(
        &self,
        bnf: &mut Bnf,
        open: Option<Symbol>,
        close: Option<Symbol>,
        delimiter: Option<Symbol>,
        cardinality: Cardinality,
        only_keep_entries: bool,
        next_tgt: NonTerminal,
    ) {
        let entry = self.entry().clone();
        let open = open.filter(|s| !s.is_epsilon());
        let close = close.filter(|s| !s.is_epsilon());
        let delimiter = delimiter.filter(|s| !s.is_epsilon());
        let keep_delimiters = !only_keep_entries;

        // the unbounded tail: next -> [delimiter] entry next | ε
        if cardinality.upper.is_none() {
            let mut rhs = Vec::new();
            let entry_index = match &delimiter {
                Some(delimiter) => {
                    rhs.push(delimiter.clone());
                    1
                }
                None => 0,
            };
            rhs.push(entry.clone());
            rhs.push(Symbol::NonTerminal(next_tgt.clone()));

            let extension = self.chained_extension(entry_index);
            let with_delimiter_name: Rc<dyn Fn(&mut ParseTree, NodeId, &[NodeId])> =
                if entry_index == 1 {
                    let inner = extension;
                    Rc::new(move |tree, parent, children| {
                        tree.set_name(children[0], Some("delimiter".to_string()));
                        (*inner)(tree, parent, children);
                    })
                } else {
                    extension
                };
            bnf.add_production(
                self.production(next_tgt.clone(), rhs)
                    .with_extension(with_delimiter_name)
                    .with_ast_builder(Rule::flattening_ast_builder(
                        entry_index,
                        keep_delimiters,
                    )),
            );
            bnf.add_production(self.production(next_tgt.clone(), Vec::new()));
        }

        match cardinality.upper {
            None => {
                // tgt -> open entry (delimiter entry)^(lower-1) next close
                let guaranteed = cardinality.lower.max(1);
                let mut roles = Vec::new();
                if open.is_some() {
                    roles.push(JoinRole::Open);
                }
                roles.push(JoinRole::Entry(0));
                for i in 1..guaranteed {
                    if delimiter.is_some() {
                        roles.push(JoinRole::Delimiter);
                    }
                    roles.push(JoinRole::Entry(i));
                }
                roles.push(JoinRole::Next(guaranteed));
                if close.is_some() {
                    roles.push(JoinRole::Close);
                }
                self.add_join_tgt_production(
                    bnf,
                    roles,
                    &entry,
                    &open,
                    &close,
                    &delimiter,
                    &next_tgt,
                    keep_delimiters,
                );

                if cardinality.lower == 0 {
                    // tgt -> open close
                    let mut roles = Vec::new();
                    if open.is_some() {
                        roles.push(JoinRole::Open);
                    }
                    if close.is_some() {
                        roles.push(JoinRole::Close);
                    }
                    self.add_join_tgt_production(
                        bnf,
                        roles,
                        &entry,
                        &open,
                        &close,
                        &delimiter,
                        &next_tgt,
                        keep_delimiters,
                    );
                }
            }
            Some(upper) => {
                // one alternative per admissible length, longest first
                for k in (cardinality.lower..=upper).rev() {
                    let mut roles = Vec::new();
                    if open.is_some() {
                        roles.push(JoinRole::Open);
                    }
                    for i in 0..k {
                        if i > 0 && delimiter.is_some() {
                            roles.push(JoinRole::Delimiter);
                        }
                        roles.push(JoinRole::Entry(i));
                    }
                    if close.is_some() {
                        roles.push(JoinRole::Close);
                    }
                    self.add_join_tgt_production(
                        bnf,
                        roles,
                        &entry,
                        &open,
                        &close,
                        &delimiter,
                        &next_tgt,
                        keep_delimiters,
                    );
                }
            }
        }
    }

    fn add_join_tgt_production(
        &self,
        bnf: &mut Bnf,
        roles: Vec<JoinRole>,
        entry: &Symbol,
        open: &Option<Symbol>,
        close: &Option<Symbol>,
        delimiter: &Option<Symbol>,
        next_tgt: &NonTerminal,
        keep_delimiters: bool,
    ) {
        let rhs: Vec<Symbol> = roles
            .iter()
            .map(|role| match role {
                JoinRole::Open => open.clone().unwrap_or_else(|| entry.clone()),
                JoinRole::Close => close.clone().unwrap_or_else(|| entry.clone()),
                JoinRole::Delimiter => delimiter.clone().unwrap_or_else(|| entry.clone()),
                JoinRole::Entry(_) => entry.clone(),
                JoinRole::Next(_) => Symbol::NonTerminal(next_tgt.clone()),
            })
            .collect();

        let rule = self.clone();
        let roles_for_extension = roles.clone();
        let extension: Rc<dyn Fn(&mut ParseTree, NodeId, &[NodeId])> =
            Rc::new(move |tree, parent, children| {
                for (idx, role) in roles_for_extension.iter().enumerate() {
                    match role {
                        JoinRole::Open => tree.set_name(children[idx], Some("open".to_string())),
                        JoinRole::Close => tree.set_name(children[idx], Some("close".to_string())),
                        JoinRole::Delimiter => {
                            tree.set_name(children[idx], Some("delimiter".to_string()))
                        }
                        JoinRole::Entry(n) => {
                            tree.set_nth_entry(children[idx], *n);
                            tree.set_name(children[idx], rule.name_for_child(*n));
                        }
                        JoinRole::Next(count) => {
                            tree.set_nth_entry(children[idx], *count);
                            let parent_name = tree.handle(parent).name().to_string();
                            tree.set_name(children[idx], Some(parent_name));
                        }
                    }
                }
            });

        let ast_builder: Rc<dyn Fn(&mut ParseTree, NodeId, &[NodeId])> =
            Rc::new(move |tree, parent, children| {
                for (idx, role) in roles.iter().enumerate() {
                    match role {
                        JoinRole::Open | JoinRole::Close | JoinRole::Delimiter => {
                            if keep_delimiters {
                                tree.add_children(parent, &children[idx..idx + 1]);
                            }
                        }
                        JoinRole::Entry(_) => {
                            tree.add_children(parent, &children[idx..idx + 1]);
                        }
                        JoinRole::Next(_) => {
                            let grandchildren = tree.children(children[idx]).to_vec();
                            tree.add_children(parent, &grandchildren);
                        }
                    }
                }
            });

        bnf.add_production(
            self.production(self.tgt().clone(), rhs)
                .with_extension(extension)
                .with_ast_builder(ast_builder),
        );
    }
}

#[derive(Clone, Copy)]
enum JoinRole {
    Open,
    Entry(usize),
    Delimiter,
    Next(usize),
    Close,
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for Rule {}

impl Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {:?}", self.data.kind, self.data.tgt)
    }
}

impl NamedRule {
    pub fn tgt(&self) -> &NonTerminal {
        self.get().tgt()
    }

    pub fn on_successful_parsed(&self, listener: ParseListener) {
        self.get().on_successful_parsed(listener);
    }
}
