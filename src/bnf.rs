use crate::ebnf::Rule;
use crate::symbol::{end_of_input, NonTerminal, Symbol};
use crate::tree::{NodeId, ParseTree};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Callback rebuilding a parent's children after the subtrees were AST-built; the
/// default re-attaches the children unchanged, Star/Plus/Join flatten.
pub(crate) type AstBuilder = Rc<dyn Fn(&mut ParseTree, NodeId, &[NodeId])>;

/// Callback renaming/renumbering the direct children of a freshly reconstructed node.
pub(crate) type ExtensionListener = Rc<dyn Fn(&mut ParseTree, NodeId, &[NodeId])>;

/// One BNF production `lhs -> rhs`, optionally carrying the EBNF rule it was emitted
/// from plus the AST builder and extension listener of that rule.
#[derive(Clone)]
pub struct Production {
    left: NonTerminal,
    right: Vec<Symbol>,
    rule: Option<Rule>,
    extension: Option<ExtensionListener>,
    ast_builder: Option<AstBuilder>,
}

impl Production {
    pub fn new(left: NonTerminal, right: Vec<Symbol>) -> Self {
        Self {
            left,
            right,
            rule: None,
            extension: None,
            ast_builder: None,
        }
    }

    pub(crate) fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub(crate) fn with_extension(mut self, listener: ExtensionListener) -> Self {
        self.extension = Some(listener);
        self
    }

    pub(crate) fn with_ast_builder(mut self, builder: AstBuilder) -> Self {
        self.ast_builder = Some(builder);
        self
    }

    pub fn left(&self) -> &NonTerminal {
        &self.left
    }

    pub fn right(&self) -> &[Symbol] {
        &self.right
    }

    pub(crate) fn rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    pub(crate) fn extension(&self) -> Option<&ExtensionListener> {
        self.extension.as_ref()
    }

    pub(crate) fn ast_builder(&self) -> Option<&AstBuilder> {
        self.ast_builder.as_ref()
    }

    /// Key identifying the shape of this production, used to deduplicate
    /// autocompleting parents.
    pub(crate) fn key(&self) -> String {
        let mut key = format!("{}:", self.left.symbol());
        for symbol in &self.right {
            key.push_str(symbol.name());
        }
        key
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}> ->", self.left.symbol())?;
        for symbol in &self.right {
            write!(f, " {:?}", symbol)?;
        }
        if self.right.is_empty() {
            write!(f, " ε")?;
        }
        Ok(())
    }
}

/// An ordered set of productions keyed by their left-hand side non-terminal.
///
/// Every compiled grammar has exactly one start production
/// `S' -> topLevel EOI`. Cloning a [Bnf] deep-copies the production lists while the
/// symbols and callbacks stay shared.
#[derive(Clone, Default)]
pub struct Bnf {
    productions: HashMap<String, Vec<Production>>,
}

impl Bnf {
    pub fn new() -> Self {
        Self::default()
    }

    /// The artificial start symbol `S'`.
    pub fn artificial_start() -> NonTerminal {
        NonTerminal::new("S'")
    }

    /// The artificial stop terminal, succeeding exactly at the end of the input.
    pub fn artificial_stop() -> Symbol {
        end_of_input()
    }

    /// Insertion order is preserved per left-hand side; the parser tries alternatives
    /// in this order.
    pub fn add_production(&mut self, production: Production) {
        self.productions
            .entry(production.left.symbol().to_string())
            .or_default()
            .push(production);
    }

    pub fn productions_of(&self, symbol: &NonTerminal) -> &[Production] {
        self.productions
            .get(symbol.symbol())
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Removes the single `S' -> ...` production.
    pub fn remove_start_production(&mut self) {
        self.productions
            .remove(Bnf::artificial_start().symbol());
    }

    pub fn reset(&mut self) {
        self.productions.clear();
    }
}

impl Display for Bnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.productions.keys().collect();
        keys.sort();
        for key in keys {
            for production in &self.productions[key] {
                writeln!(f, "{}", production)?;
            }
        }
        Ok(())
    }
}
