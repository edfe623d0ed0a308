use crate::autocomplete::{Autocompleter, Autocompletion, CompletionCache};
use crate::ebnf::{Ebnf, NamedRule, Rule};
use crate::evaluate::Evaluator;
use crate::lexer::Lexer;
use crate::rd_parser::RdParser;
use crate::symbol::{built_in_class, literal, Named, NonTerminal, Symbol};
use crate::tree::{ParseTree, ParsedNode};
use crate::{Cardinality, DefinitionError, ParseError, ParsingState};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// How a defined type takes part in autocompletion.
pub enum AutocompletePolicy {
    /// Compose a completion for the whole sentence pattern by probing each child.
    EntireSequence,
    /// Complete to a `${name}` parameter until text has been entered.
    Inline,
    /// A caller supplied completer.
    Completer(Autocompleter),
}

/// The natural-language parser: declare types and sentences as patterns, compile,
/// then parse, evaluate and autocomplete scripts.
///
/// Patterns are parsed by a built-in meta grammar (run by the same recursive descent
/// driver as scripts) and converted into [Rule]s of the target grammar. The top-level
/// `program` rule is a list of `sentence`s separated by line breaks.
pub struct Parser {
    grammar: Ebnf,
    target_grammar: Ebnf,
    parse_start_listeners: Rc<RefCell<Vec<Rc<dyn Fn()>>>>,
    symbol_to_autocompletion: CompletionCache,
    expression: Rule,
}

/// Character class shorthand for the meta grammar; the pattern doubles as the symbol
/// name.
fn cc(pattern: &str) -> Symbol {
    built_in_class(pattern, pattern)
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        let grammar = Ebnf::new();
        let target_grammar = Ebnf::new();

        let quantifier = make_quantifier(&grammar);
        let identifier = make_identifier(&grammar, "identifier");
        let variable_name = make_variable_name(&grammar);
        let entry_name = make_identifier(&grammar, "entry-name");
        let list = make_list(&grammar, &identifier);
        let tuple = make_tuple(&grammar, &identifier, &entry_name);
        let character_class = make_character_class(&grammar);
        let typ = make_type(&grammar, &identifier, &list, &tuple, &character_class);
        let variable = make_variable(&grammar, &variable_name, &typ, &quantifier);
        let no_variable = make_no_variable(&grammar);
        let expression = make_expression(&grammar, &no_variable, &variable);

        let linebreak_star =
            target_grammar.star(Some("linebreak-star"), literal("\n").unnamed());
        make_program(&target_grammar, &linebreak_star);

        Self {
            grammar,
            target_grammar,
            parse_start_listeners: Rc::new(RefCell::new(Vec::new())),
            symbol_to_autocompletion: Rc::new(RefCell::new(HashMap::new())),
            expression,
        }
    }

    /// The built-in meta grammar parsing the pattern language.
    pub fn grammar(&self) -> &Ebnf {
        &self.grammar
    }

    /// The grammar the defined sentences and types are built in.
    pub fn target_grammar(&self) -> &Ebnf {
        &self.target_grammar
    }

    pub fn add_parse_start_listener(&mut self, listener: Rc<dyn Fn()>) {
        self.parse_start_listeners.borrow_mut().push(listener);
    }

    pub fn remove_parse_start_listener(&mut self, listener: &Rc<dyn Fn()>) {
        self.parse_start_listeners
            .borrow_mut()
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    /// Define a sentence template; equivalent to `define_type("sentence", ...)`.
    pub fn define_sentence(
        &mut self,
        pattern: &str,
        evaluator: Option<Evaluator>,
        autocompleter: Option<AutocompletePolicy>,
    ) -> Result<NamedRule, DefinitionError> {
        self.define_type("sentence", pattern, evaluator, autocompleter)
    }

    /// Compile `pattern` with the meta grammar into a sequence rule named `typ` in
    /// the target grammar, attaching the evaluator and autocompleter if given.
    pub fn define_type(
        &mut self,
        typ: &str,
        pattern: &str,
        evaluator: Option<Evaluator>,
        autocompleter: Option<AutocompletePolicy>,
    ) -> Result<NamedRule, DefinitionError> {
        let completer = match autocompleter {
            Some(AutocompletePolicy::EntireSequence) => Some(Autocompleter::EntireSequence {
                grammar: self.target_grammar.core().clone(),
                cache: self.symbol_to_autocompletion.clone(),
            }),
            Some(AutocompletePolicy::Inline) => Some(Autocompleter::Inline),
            Some(AutocompletePolicy::Completer(completer)) => Some(completer),
            None => None,
        };

        self.grammar
            .compile(&Symbol::NonTerminal(self.expression.tgt().clone()));
        let tree = {
            let bnf = self.grammar.core().bnf();
            let mut rd_parser = RdParser::new(&bnf, Lexer::new(pattern));
            match rd_parser.parse(None) {
                Ok(tree) => tree,
                Err(err) => {
                    return Err(DefinitionError::pattern_syntax(pattern, err.to_string()))
                }
            }
        };
        if tree.root().matcher().state != ParsingState::Successful {
            return Err(DefinitionError::pattern_syntax(
                pattern,
                "the pattern could not be parsed to its end",
            ));
        }
        let expression_node = match tree.root().child(0) {
            Some(node) => node,
            None => return Err(DefinitionError::pattern_syntax(pattern, "empty pattern")),
        };
        let rhs = self.evaluate_expression(pattern, expression_node)?;

        let rule = self.target_grammar.sequence(Some(typ), rhs);
        if let Some(evaluator) = evaluator {
            rule.set_evaluator(evaluator);
        }
        if let Some(completer) = completer {
            rule.set_autocompleter(completer);
        }
        Ok(Named::new(rule, Some(typ.to_string())))
    }

    /// Materialize the BNF of the target grammar; without a symbol the top-level
    /// `program` rule is compiled.
    pub fn compile(&mut self, symbol: Option<&Symbol>) {
        match symbol {
            Some(symbol) => self.target_grammar.compile(symbol),
            None => {
                let program = self
                    .target_grammar
                    .get_symbol("program")
                    .unwrap_or_else(|| panic!("Internal error: program rule is not defined"));
                self.target_grammar.compile(&program)
            }
        }
    }

    /// Parse `text` against the compiled target grammar, filling `completions` (when
    /// given) with every textual continuation derived from the end-of-input
    /// frontiers of the parse.
    pub fn parse(
        &mut self,
        text: &str,
        completions: Option<&mut Vec<Autocompletion>>,
    ) -> Result<ParseTree, ParseError> {
        if !self.target_grammar.core().is_compiled() {
            self.compile(None);
        }
        self.symbol_to_autocompletion.borrow_mut().clear();

        let bnf = self.target_grammar.core().bnf();
        let mut rd_parser = RdParser::new(&bnf, Lexer::new(text));
        let listeners = self.parse_start_listeners.clone();
        rd_parser.add_parse_start_listener(Rc::new(move || {
            for listener in listeners.borrow().iter() {
                (**listener)();
            }
        }));
        rd_parser.parse(completions)
    }

    // --- walkers over the meta parse tree -----------------------------------

    /// The parsed expression is a whitespace-joined list of tokens; delimiters with
    /// actual whitespace re-insert a `whitespace-plus` symbol between the tokens.
    fn evaluate_expression(
        &self,
        pattern: &str,
        node: ParsedNode,
    ) -> Result<Vec<Named<Symbol>>, DefinitionError> {
        let mut rhs: Vec<Named<Symbol>> = Vec::new();
        for i in 0..node.num_children() {
            let child = match node.child(i) {
                Some(child) => child,
                None => break,
            };
            if i % 2 == 1 {
                if child.num_children() > 0 {
                    rhs.push(
                        Symbol::NonTerminal(self.target_grammar.whitespace_plus().tgt().clone())
                            .with_name("ws+"),
                    );
                }
            } else {
                rhs.push(self.evaluate_entry(pattern, child)?);
            }
        }
        Ok(rhs)
    }

    fn evaluate_entry(
        &self,
        pattern: &str,
        or_node: ParsedNode,
    ) -> Result<Named<Symbol>, DefinitionError> {
        let entry = match or_node.child(0) {
            Some(entry) => entry,
            None => {
                return Err(DefinitionError::pattern_syntax(pattern, "empty token"));
            }
        };
        match entry.name() {
            "no-variable" => {
                let text = entry.parsed_text();
                Ok(literal(text).with_name(text))
            }
            "variable" => self.evaluate_variable(pattern, entry),
            other => Err(DefinitionError::pattern_syntax(
                pattern,
                format!("unexpected token '{}'", other),
            )),
        }
    }

    /// `{name[:type][:quantifier]}`: resolve the type (a literal of the name itself
    /// when absent), then wrap with Star/Plus/Optional/Repeat for a quantifier.
    fn evaluate_variable(
        &self,
        pattern: &str,
        node: ParsedNode,
    ) -> Result<Named<Symbol>, DefinitionError> {
        let variable_name = node.parsed_string(&["variable-name"]);

        let type_node = node
            .child_by_name("opt-type")
            .and_then(|opt| opt.child_by_name("seq-type"))
            .and_then(|seq| seq.child_by_name("type"));
        let symbol = match type_node {
            Some(type_node) => self.evaluate_type(pattern, type_node)?,
            None => literal(&variable_name),
        };
        let mut named = symbol.with_name(variable_name.clone());

        let quantifier_node = node
            .child_by_name("opt-quantifier")
            .and_then(|opt| opt.child_by_name("seq-quantifier"))
            .and_then(|seq| seq.child_by_name("quantifier"));
        if let Some(quantifier_node) = quantifier_node {
            let cardinality = self.evaluate_quantifier(pattern, quantifier_node)?;
            let target = &self.target_grammar;
            let wrapped = if cardinality == Cardinality::STAR {
                target.star(None, named).tgt().clone()
            } else if cardinality == Cardinality::PLUS {
                target.plus(None, named).tgt().clone()
            } else if cardinality == Cardinality::OPTIONAL {
                target.optional(None, named).tgt().clone()
            } else {
                let to = cardinality.upper.unwrap_or(cardinality.lower);
                target
                    .repeat(None, named, cardinality.lower, to)
                    .tgt()
                    .clone()
            };
            named = Symbol::NonTerminal(wrapped).with_name(variable_name);
        }
        Ok(named)
    }

    fn evaluate_type(
        &self,
        pattern: &str,
        node: ParsedNode,
    ) -> Result<Symbol, DefinitionError> {
        let alternative = match node.child(0) {
            Some(alternative) => alternative,
            None => return Err(DefinitionError::pattern_syntax(pattern, "empty type")),
        };
        match alternative.name() {
            "type" => {
                let type_name = alternative.parsed_text();
                self.target_grammar
                    .get_symbol(type_name)
                    .ok_or_else(|| DefinitionError::unknown_type(type_name))
            }
            "list" => {
                let type_name = alternative.parsed_string(&["type"]);
                let entry = self
                    .target_grammar
                    .get_symbol(&type_name)
                    .ok_or_else(|| DefinitionError::unknown_type(&type_name))?;
                let rule = self
                    .target_grammar
                    .list(None, entry.with_name(type_name));
                Ok(Symbol::NonTerminal(rule.tgt().clone()))
            }
            "tuple" => {
                let type_name = alternative.parsed_string(&["type"]);
                let entry = self
                    .target_grammar
                    .get_symbol(&type_name)
                    .ok_or_else(|| DefinitionError::unknown_type(&type_name))?;
                let mut entry_names: Vec<String> = Vec::new();
                if let Some(plus_node) = alternative.child_by_name("plus-names") {
                    for child in plus_node.children() {
                        entry_names.push(child.parsed_string(&["entry-name"]));
                    }
                }
                if entry_names.is_empty() {
                    return Err(DefinitionError::pattern_syntax(
                        pattern,
                        "a tuple needs at least one entry name",
                    ));
                }
                let names: Vec<&str> = entry_names.iter().map(|n| n.as_str()).collect();
                let rule = self.target_grammar.tuple(None, entry.unnamed(), &names);
                Ok(Symbol::NonTerminal(rule.tgt().clone()))
            }
            "character-class" => {
                let class = alternative.parsed_text();
                crate::symbol::character_class(class).map_err(|err| {
                    DefinitionError::pattern_syntax(pattern, format!("{}", err))
                })
            }
            other => Err(DefinitionError::pattern_syntax(
                pattern,
                format!("unexpected type alternative '{}'", other),
            )),
        }
    }

    fn evaluate_quantifier(
        &self,
        pattern: &str,
        node: ParsedNode,
    ) -> Result<Cardinality, DefinitionError> {
        let parse_bound = |text: &str| {
            text.parse::<usize>().map_err(|err| {
                DefinitionError::pattern_syntax(
                    pattern,
                    format!("invalid repetition bound '{}': {}", text, err),
                )
            })
        };
        let alternative = match node.child(0) {
            Some(alternative) => alternative,
            None => return Err(DefinitionError::pattern_syntax(pattern, "empty quantifier")),
        };
        match alternative.name() {
            "optional" => Ok(Cardinality::OPTIONAL),
            "plus" => Ok(Cardinality::PLUS),
            "star" => Ok(Cardinality::STAR),
            "range" => {
                let from = parse_bound(&alternative.parsed_string(&["range", "from"]))?;
                let to = parse_bound(&alternative.parsed_string(&["range", "to"]))?;
                Ok(Cardinality::new(from, to))
            }
            "fixed" => Ok(Cardinality::fixed(parse_bound(alternative.parsed_text())?)),
            other => Err(DefinitionError::pattern_syntax(
                pattern,
                format!("unexpected quantifier '{}'", other),
            )),
        }
    }

}

// --- the meta grammar -------------------------------------------------------

fn make_quantifier(g: &Ebnf) -> Rule {
    g.or_rule(
        Some("quantifier"),
        vec![
            g.sequence(None, vec![literal("?").unnamed()]).with_name("optional"),
            g.sequence(None, vec![literal("+").unnamed()]).with_name("plus"),
            g.sequence(None, vec![literal("*").unnamed()]).with_name("star"),
            g.sequence(None, vec![g.integer_range().with_name("range")])
                .with_name("range"),
            g.sequence(None, vec![g.integer().with_name("int")])
                .with_name("fixed"),
        ],
    )
}

fn make_identifier(g: &Ebnf, name: &str) -> Rule {
    g.sequence(
        Some(name),
        vec![
            cc("[A-Za-z_]").unnamed(),
            g.optional(
                None,
                g.sequence(
                    None,
                    vec![
                        g.star(None, cc("[A-Za-z0-9_-]").unnamed()).with_name("star"),
                        cc("[A-Za-z0-9_]").unnamed(),
                    ],
                )
                .with_name("seq"),
            )
            .with_name("opt"),
        ],
    )
}

fn make_variable_name(g: &Ebnf) -> Rule {
    g.plus(Some("var-name"), cc("[^:{}]").unnamed())
}

fn make_list(g: &Ebnf, identifier: &Rule) -> Rule {
    g.sequence(
        Some("list"),
        vec![
            literal("list").unnamed(),
            g.whitespace_star().with_name("ws*"),
            literal("<").unnamed(),
            g.whitespace_star().with_name("ws*"),
            identifier.with_name("type"),
            g.whitespace_star().with_name("ws*"),
            literal(">").unnamed(),
        ],
    )
}

fn make_tuple(g: &Ebnf, identifier: &Rule, entry_name: &Rule) -> Rule {
    g.sequence(
        Some("tuple"),
        vec![
            literal("tuple").unnamed(),
            g.whitespace_star().with_name("ws*"),
            literal("<").unnamed(),
            g.whitespace_star().with_name("ws*"),
            identifier.with_name("type"),
            g.plus(
                None,
                g.sequence(
                    None,
                    vec![
                        g.whitespace_star().with_name("ws*"),
                        literal(",").unnamed(),
                        g.whitespace_star().with_name("ws*"),
                        entry_name.with_name("entry-name"),
                        g.whitespace_star().with_name("ws*"),
                    ],
                )
                .with_name("sequence-names"),
            )
            .with_name("plus-names"),
            literal(">").unnamed(),
        ],
    )
}

fn make_character_class(g: &Ebnf) -> Rule {
    g.sequence(
        Some("character-class"),
        vec![
            literal("[").unnamed(),
            g.plus(None, cc(r"[^\]]").unnamed()).with_name("plus"),
            literal("]").unnamed(),
        ],
    )
}

fn make_type(g: &Ebnf, identifier: &Rule, list: &Rule, tuple: &Rule, character_class: &Rule) -> Rule {
    let type_name = g.sequence(None, vec![identifier.with_name("identifier")]);
    g.or_rule(
        Some("type"),
        vec![
            type_name.with_name("type"),
            list.with_name("list"),
            tuple.with_name("tuple"),
            character_class.with_name("character-class"),
        ],
    )
}

fn make_variable(g: &Ebnf, variable_name: &Rule, typ: &Rule, quantifier: &Rule) -> Rule {
    g.sequence(
        Some("variable"),
        vec![
            literal("{").unnamed(),
            variable_name.with_name("variable-name"),
            g.optional(
                None,
                g.sequence(
                    None,
                    vec![literal(":").unnamed(), typ.with_name("type")],
                )
                .with_name("seq-type"),
            )
            .with_name("opt-type"),
            g.optional(
                None,
                g.sequence(
                    None,
                    vec![literal(":").unnamed(), quantifier.with_name("quantifier")],
                )
                .with_name("seq-quantifier"),
            )
            .with_name("opt-quantifier"),
            literal("}").unnamed(),
        ],
    )
}

fn make_no_variable(g: &Ebnf) -> Rule {
    g.sequence(
        Some("no-variable"),
        vec![
            cc("[^ \t\n{]").unnamed(),
            g.optional(
                None,
                g.sequence(
                    None,
                    vec![
                        g.star(None, cc("[^{\n]").unnamed()).with_name("middle"),
                        cc("[^ \t\n{]").unnamed(),
                    ],
                )
                .with_name("seq"),
            )
            .with_name("tail"),
        ],
    )
}

fn make_expression(g: &Ebnf, no_variable: &Rule, variable: &Rule) -> Rule {
    g.join(
        Some("expression"),
        g.or_rule(
            None,
            vec![
                no_variable.with_name("no-variable"),
                variable.with_name("variable"),
            ],
        )
        .with_name("or"),
        None,
        None,
        Some(Symbol::NonTerminal(g.whitespace_star().tgt().clone())),
        Cardinality::PLUS,
        false,
    )
}

fn make_program(target: &Ebnf, linebreak_star: &Rule) -> Rule {
    let linebreaks = Symbol::NonTerminal(linebreak_star.tgt().clone());
    target.join(
        Some("program"),
        Symbol::NonTerminal(NonTerminal::new("sentence")).with_name("sentence"),
        Some(linebreaks.clone()),
        Some(linebreaks.clone()),
        Some(linebreaks),
        Cardinality::STAR,
        true,
    )
}
