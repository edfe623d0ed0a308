use crate::autocomplete::Autocompletion;
use crate::bnf::Production;
use crate::ebnf::{Rule, RuleKind};
use crate::evaluate::{Evaluator, Value};
use crate::symbol::Symbol;
use crate::{AutocompleterError, EvaluationError, Matcher};
use ptree::TreeItem;
use std::borrow::Cow;
use std::fmt::{Debug, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Index of a node in the arena of a [ParseTree].
pub(crate) struct NodeId(pub(crate) usize);

pub(crate) struct NodeData {
    matcher: Matcher,
    symbol: Symbol,
    production: Option<Production>,
    name: Option<String>,
    nth_entry_in_parent: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The annotated syntax tree of one parse, stored as a flat arena.
///
/// Nodes reference their parent and children by index; the whole tree is dropped at
/// the end of the parse (or carried inside a [ParseFailure](crate::ParseFailure)).
pub struct ParseTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl ParseTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub(crate) fn alloc(
        &mut self,
        matcher: Matcher,
        symbol: Symbol,
        production: Option<Production>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            matcher,
            symbol,
            production,
            name: None,
            nth_entry_in_parent: 0,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// The root node of the tree.
    pub fn root(&self) -> ParsedNode<'_> {
        self.handle(self.root)
    }

    pub(crate) fn handle(&self, id: NodeId) -> ParsedNode<'_> {
        ParsedNode { tree: self, id }
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub(crate) fn add_children(&mut self, id: NodeId, children: &[NodeId]) {
        for &child in children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes[id.0].children.extend_from_slice(children);
    }

    pub(crate) fn remove_all_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    pub(crate) fn set_name(&mut self, id: NodeId, name: Option<String>) {
        self.nodes[id.0].name = name;
    }

    pub(crate) fn set_nth_entry(&mut self, id: NodeId, nth: usize) {
        self.nodes[id.0].nth_entry_in_parent = nth;
    }

    pub(crate) fn nth_entry(&self, id: NodeId) -> usize {
        self.node(id).nth_entry_in_parent
    }

    pub(crate) fn production(&self, id: NodeId) -> Option<&Production> {
        self.node(id).production.as_ref()
    }
}

#[derive(Clone, Copy)]
/// A light handle onto one node of a [ParseTree]; this is the type user callbacks
/// (evaluators, autocompleters, parse listeners) receive.
pub struct ParsedNode<'t> {
    tree: &'t ParseTree,
    pub(crate) id: NodeId,
}

impl<'t> ParsedNode<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn matcher(&self) -> &'t Matcher {
        &self.data().matcher
    }

    pub fn symbol(&self) -> &'t Symbol {
        &self.data().symbol
    }

    /// The name assigned by the enclosing rule, falling back to the symbol name.
    pub fn name(&self) -> &'t str {
        match &self.data().name {
            Some(name) => name,
            None => self.data().symbol.name(),
        }
    }

    /// Which repetition of a Star/Plus/Repeat/Join expansion (or which Or branch)
    /// this node is.
    pub fn nth_entry_in_parent(&self) -> usize {
        self.data().nth_entry_in_parent
    }

    pub(crate) fn production(&self) -> Option<&'t Production> {
        self.data().production.as_ref()
    }

    /// The EBNF rule whose production built this node, if any.
    pub fn rule(&self) -> Option<Rule> {
        self.production().and_then(|p| p.rule().cloned())
    }

    pub fn parent(&self) -> Option<ParsedNode<'t>> {
        self.data().parent.map(|id| self.tree.handle(id))
    }

    pub fn num_children(&self) -> usize {
        self.data().children.len()
    }

    pub fn child(&self, index: usize) -> Option<ParsedNode<'t>> {
        self.data()
            .children
            .get(index)
            .map(|&id| self.tree.handle(id))
    }

    pub fn child_by_name(&self, name: &str) -> Option<ParsedNode<'t>> {
        self.data()
            .children
            .iter()
            .map(|&id| self.tree.handle(id))
            .find(|child| child.name() == name)
    }

    pub fn children(&self) -> Vec<ParsedNode<'t>> {
        self.data()
            .children
            .iter()
            .map(|&id| self.tree.handle(id))
            .collect()
    }

    fn descend(&self, names: &[&str]) -> Option<ParsedNode<'t>> {
        let mut node = *self;
        for name in names {
            node = node.child_by_name(name)?;
        }
        Some(node)
    }

    /// The text this node consumed.
    pub fn parsed_text(&self) -> &'t str {
        &self.data().matcher.parsed
    }

    /// The parsed string of the descendant reached by following `names` child by
    /// child, or `""` when the path does not exist.
    pub fn parsed_string(&self, names: &[&str]) -> String {
        match self.descend(names) {
            Some(node) => node.parsed_text().to_string(),
            None => String::new(),
        }
    }

    /// Evaluates the descendant reached by following `names`; an empty path evaluates
    /// this node itself, a missing path evaluates to [Value::None].
    pub fn evaluate(&self, names: &[&str]) -> Result<Value, EvaluationError> {
        match self.descend(names) {
            Some(node) => node.evaluate_self(),
            None => Ok(Value::None),
        }
    }

    pub fn evaluate_child_by_index(&self, index: usize) -> Result<Value, EvaluationError> {
        match self.child(index) {
            Some(child) => child.evaluate_self(),
            None => Ok(Value::None),
        }
    }

    /// Evaluates this node: the rule's evaluator if set, else the kind default, else
    /// the parsed string.
    pub fn evaluate_self(&self) -> Result<Value, EvaluationError> {
        if let Some(rule) = self.rule() {
            if let Some(evaluator) = rule.evaluator() {
                return evaluator.evaluate(*self);
            }
            return match rule.kind() {
                RuleKind::Or | RuleKind::Optional => Evaluator::first_child().evaluate(*self),
                _ => Evaluator::all_children().evaluate(*self),
            };
        }
        Ok(Value::Str(self.parsed_text().to_string()))
    }

    pub(crate) fn parent_has_same_rule(&self) -> bool {
        let rule = match self.rule() {
            Some(rule) => rule,
            None => return false,
        };
        let parent_rule = match self.parent().and_then(|p| p.rule()) {
            Some(rule) => rule,
            None => return false,
        };
        rule == parent_rule
    }

    /// Whether this node would contribute completions; evaluated with
    /// `just_check == true`, without computing completion strings where possible.
    pub fn does_autocomplete(&self) -> Result<bool, AutocompleterError> {
        Ok(self.get_autocompletion(true)?.is_some())
    }

    /// The completions this node offers: the rule's autocompleter when present (and
    /// not shadowed by a parent of the same rule). Without one, a literal terminal
    /// completes to itself, and any other terminal completes to a `${name}`
    /// parameter, or vetoes once text has been entered.
    pub fn get_autocompletion(
        &self,
        just_check: bool,
    ) -> Result<Option<Vec<Autocompletion>>, AutocompleterError> {
        if let Some(rule) = self.rule() {
            if let Some(completer) = rule.autocompleter() {
                if !self.parent_has_same_rule() {
                    return completer.complete(*self, just_check);
                }
            }
        }
        match self.symbol() {
            Symbol::Terminal(t) if t.is_literal() => {
                Ok(Some(vec![Autocompletion::literal(t.symbol())]))
            }
            Symbol::Terminal(t) if !t.is_epsilon() => {
                if !self.parsed_text().is_empty() {
                    Ok(Some(vec![Autocompletion::veto()]))
                } else {
                    Ok(Some(vec![Autocompletion::parameterized(self.name())]))
                }
            }
            _ => Ok(None),
        }
    }

    /// Print the subtree to stdout.
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}

impl Debug for ParsedNode<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_struct = f.debug_struct("ParsedNode");
        debug_struct
            .field("name", &self.name())
            .field("state", &self.matcher().state)
            .field("parsed", &self.matcher().parsed);
        if self.num_children() > 0 {
            debug_struct.field("children", &self.children());
        }
        debug_struct.finish()
    }
}

impl<'t> TreeItem for ParsedNode<'t> {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        let matcher = self.matcher();
        write!(
            f,
            "{} # {:?} {}..{:?}",
            self.name(),
            matcher.state,
            matcher.pos,
            matcher.parsed
        )
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(ParsedNode::children(self))
    }
}
