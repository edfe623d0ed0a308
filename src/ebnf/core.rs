use super::{CoreState, EbnfCore, Rule, RuleKind};
use crate::autocomplete::{Autocompleter, Autocompletion};
use crate::evaluate::Evaluator;
use crate::symbol::{literal, whitespace, Named, NonTerminal, Symbol};
use crate::{Bnf, Cardinality};
use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

impl Default for EbnfCore {
    fn default() -> Self {
        Self::new()
    }
}

impl EbnfCore {
    pub fn new() -> Self {
        Self {
            state: Rc::new(CoreState {
                symbols: RefCell::new(HashMap::new()),
                rules: RefCell::new(Vec::new()),
                bnf: RefCell::new(Bnf::new()),
                compiled: Cell::new(false),
                anonymous_ids: Cell::new(0),
            }),
        }
    }

    pub fn get_symbol(&self, name: &str) -> Option<Symbol> {
        self.state.symbols.borrow().get(name).cloned()
    }

    pub fn get_rules(&self, target: &NonTerminal) -> Vec<Rule> {
        self.state
            .rules
            .borrow()
            .iter()
            .filter(|rule| rule.tgt() == target)
            .cloned()
            .collect()
    }

    pub fn is_compiled(&self) -> bool {
        self.state.compiled.get()
    }

    /// The BNF of the last [compile](EbnfCore::compile).
    pub fn bnf(&self) -> Ref<'_, Bnf> {
        self.state.bnf.borrow()
    }

    pub(crate) fn copy_bnf(&self) -> Bnf {
        self.state.bnf.borrow().clone()
    }

    fn anonymous_target(&self, kind: &str) -> NonTerminal {
        let n = self.state.anonymous_ids.get();
        self.state.anonymous_ids.set(n + 1);
        NonTerminal::new(&format!("{}:{}", kind, n))
    }

    fn target(&self, typ: Option<&str>, kind: &str) -> NonTerminal {
        match typ {
            None => self.anonymous_target(kind),
            Some(name) => match self.get_symbol(name) {
                None => NonTerminal::new(name),
                Some(Symbol::NonTerminal(nt)) => nt,
                Some(Symbol::Terminal(_)) => {
                    panic!("'{}' is already defined as a terminal symbol", name)
                }
            },
        }
    }

    pub fn add_rule(&self, rule: Rule) {
        {
            let mut symbols = self.state.symbols.borrow_mut();
            let tgt = rule.tgt();
            symbols
                .entry(tgt.symbol().to_string())
                .or_insert_with(|| Symbol::NonTerminal(tgt.clone()));
            for child in rule.children() {
                if !child.is_epsilon() {
                    symbols
                        .entry(child.name().to_string())
                        .or_insert_with(|| child.clone());
                }
            }
        }
        self.state.rules.borrow_mut().push(rule);
        self.state.compiled.set(false);
    }

    pub fn remove_rules(&self, target: &NonTerminal) {
        self.state.rules.borrow_mut().retain(|rule| rule.tgt() != target);
    }

    /// Materialize the BNF: replace the start production by
    /// `S' -> topLevel EOI` and re-emit the productions of every rule.
    pub fn compile(&self, top_level: &Symbol) {
        self.state.compiled.set(false);
        self.remove_rules(&Bnf::artificial_start());
        let start = Rule::new(
            RuleKind::Sequence,
            Bnf::artificial_start(),
            vec![top_level.clone(), Bnf::artificial_stop()],
        );
        start.set_evaluator(Evaluator::first_child());
        self.add_rule(start);

        {
            let mut bnf = self.state.bnf.borrow_mut();
            bnf.reset();
            for rule in self.state.rules.borrow().iter() {
                rule.create_bnf(&mut bnf);
            }
        }
        self.state.compiled.set(true);
    }

    fn symbols_of(children: &[Named<Symbol>]) -> Vec<Symbol> {
        children.iter().map(|c| c.symbol().clone()).collect()
    }

    fn names_of(children: &[Named<Symbol>]) -> Vec<Option<String>> {
        children.iter().map(|c| c.name_cloned()).collect()
    }

    pub fn sequence(&self, typ: Option<&str>, children: Vec<Named<Symbol>>) -> Rule {
        let rule = Rule::new(
            RuleKind::Sequence,
            self.target(typ, "sequence"),
            Self::symbols_of(&children),
        );
        rule.set_parsed_child_names(Self::names_of(&children));
        self.add_rule(rule.clone());
        rule
    }

    pub fn or_rule(&self, typ: Option<&str>, options: Vec<Named<Symbol>>) -> Rule {
        let rule = Rule::new(
            RuleKind::Or,
            self.target(typ, "or"),
            Self::symbols_of(&options),
        );
        rule.set_parsed_child_names(Self::names_of(&options));
        self.add_rule(rule.clone());
        rule
    }

    pub fn optional(&self, typ: Option<&str>, child: Named<Symbol>) -> Rule {
        let rule = Rule::new(
            RuleKind::Optional,
            self.target(typ, "optional"),
            vec![child.symbol().clone()],
        );
        rule.set_parsed_child_names(vec![child.name_cloned()]);
        self.add_rule(rule.clone());
        rule
    }

    pub fn star(&self, typ: Option<&str>, child: Named<Symbol>) -> Rule {
        let rule = Rule::new(
            RuleKind::Star,
            self.target(typ, "star"),
            vec![child.symbol().clone()],
        );
        rule.set_parsed_child_names(vec![child.name_cloned()]);
        self.add_rule(rule.clone());
        rule
    }

    pub fn plus(&self, typ: Option<&str>, child: Named<Symbol>) -> Rule {
        let rule = Rule::new(
            RuleKind::Plus {
                star_tgt: self.anonymous_target("star"),
            },
            self.target(typ, "plus"),
            vec![child.symbol().clone()],
        );
        rule.set_parsed_child_names(vec![child.name_cloned()]);
        self.add_rule(rule.clone());
        rule
    }

    pub fn repeat(&self, typ: Option<&str>, child: Named<Symbol>, from: usize, to: usize) -> Rule {
        let rule = Rule::new(
            RuleKind::Repeat { from, to },
            self.target(typ, "repeat"),
            vec![child.symbol().clone()],
        );
        rule.set_parsed_child_names(vec![child.name_cloned()]);
        self.add_rule(rule.clone());
        rule
    }

    /// A fixed repetition whose entries are named individually.
    pub fn repeat_with_names(
        &self,
        typ: Option<&str>,
        child: Named<Symbol>,
        names: &[&str],
    ) -> Rule {
        let rule = Rule::new(
            RuleKind::Repeat {
                from: names.len(),
                to: names.len(),
            },
            self.target(typ, "repeat"),
            vec![child.symbol().clone()],
        );
        rule.set_parsed_child_names(names.iter().map(|n| Some(n.to_string())).collect());
        self.add_rule(rule.clone());
        rule
    }

    pub fn join(
        &self,
        typ: Option<&str>,
        child: Named<Symbol>,
        open: Option<Symbol>,
        close: Option<Symbol>,
        delimiter: Option<Symbol>,
        cardinality: Cardinality,
        only_keep_entries: bool,
    ) -> Rule {
        let rule = Rule::new(
            RuleKind::Join {
                open,
                close,
                delimiter,
                cardinality,
                only_keep_entries,
                next_tgt: self.anonymous_target("next"),
            },
            self.target(typ, "join"),
            vec![child.symbol().clone()],
        );
        rule.set_parsed_child_names(vec![child.name_cloned()]);
        self.add_rule(rule.clone());
        rule
    }

    /// A join of exactly `names.len()` entries, named individually.
    pub fn join_with_names(
        &self,
        typ: Option<&str>,
        child: Named<Symbol>,
        open: Option<Symbol>,
        close: Option<Symbol>,
        delimiter: Option<Symbol>,
        names: &[&str],
        only_keep_entries: bool,
    ) -> Rule {
        let rule = Rule::new(
            RuleKind::Join {
                open,
                close,
                delimiter,
                cardinality: Cardinality::fixed(names.len()),
                only_keep_entries,
                next_tgt: self.anonymous_target("next"),
            },
            self.target(typ, "join"),
            vec![child.symbol().clone()],
        );
        rule.set_parsed_child_names(names.iter().map(|n| Some(n.to_string())).collect());
        self.add_rule(rule.clone());
        rule
    }

    /// A comma separated list of entries, e.g. `1, 2, 3`.
    pub fn list(&self, typ: Option<&str>, child: Named<Symbol>) -> Rule {
        let ws_star = self.star(None, whitespace().unnamed());
        let ws = ws_star.with_name("ws*");
        let delimiter = self.sequence(None, vec![ws.clone(), literal(",").unnamed(), ws]);
        delimiter.set_autocompleter(Autocompleter::custom(|pn, _just_check| {
            let text = if pn.parsed_text().is_empty() { ", " } else { "" };
            Ok(Some(vec![Autocompletion::literal(text)]))
        }));
        self.join(
            typ,
            child,
            None,
            None,
            Some(Symbol::NonTerminal(delimiter.tgt().clone())),
            Cardinality::STAR,
            true,
        )
    }

    /// A parenthesized tuple of named entries, e.g. `(1, 2, 3)`; completes as the
    /// whole sequence `(${a}, ${b}, ...)`.
    pub fn tuple(&self, typ: Option<&str>, child: Named<Symbol>, names: &[&str]) -> Rule {
        let ws_star = self.star(None, whitespace().unnamed());
        ws_star.set_autocompleter(Autocompleter::custom(|_pn, _just_check| {
            Ok(Some(vec![Autocompletion::literal("")]))
        }));
        let ws = ws_star.with_name("ws*");
        let jopen = self.sequence(None, vec![literal("(").with_name("open"), ws.clone()]);
        let jclose = self.sequence(None, vec![ws.clone(), literal(")").with_name("close")]);
        let delimiter = self.sequence(
            None,
            vec![ws.clone(), literal(",").with_name("delimiter"), ws],
        );

        let rule = self.join_with_names(
            typ,
            child,
            Some(Symbol::NonTerminal(jopen.tgt().clone())),
            Some(Symbol::NonTerminal(jclose.tgt().clone())),
            Some(Symbol::NonTerminal(delimiter.tgt().clone())),
            names,
            true,
        );

        let entry_names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        rule.set_autocompleter(Autocompleter::custom(move |pn, just_check| {
            if !pn.parsed_text().is_empty() {
                return Ok(None);
            }
            if just_check {
                return Ok(Some(vec![Autocompletion::does_autocomplete()]));
            }
            let rule = match pn.rule() {
                Some(rule) => rule,
                None => return Ok(None),
            };
            let mut sequence = Autocompletion::entire_sequence(rule);
            sequence.add_child_literal("(");
            sequence.add_child_parameterized(&entry_names[0]);
            for name in &entry_names[1..] {
                sequence.add_child_literal(", ");
                sequence.add_child_parameterized(name);
            }
            sequence.add_child_literal(")");
            Ok(Some(vec![sequence]))
        }));
        rule
    }
}
