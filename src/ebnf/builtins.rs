use super::{Ebnf, EbnfCore, Rule};
use crate::autocomplete::{Autocompleter, Autocompletion, CompletionCache};
use crate::complete_path::FilesystemPathCompleter;
use crate::evaluate::{Evaluator, Value};
use crate::symbol::{built_in_class, digit, letter, literal, whitespace, Named, NonTerminal, Symbol};
use crate::{Cardinality, EvaluationError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn fresh_cache() -> CompletionCache {
    Rc::new(RefCell::new(HashMap::new()))
}

fn int_child(pn: crate::ParsedNode, index: usize) -> Result<i64, EvaluationError> {
    pn.evaluate_child_by_index(index)?
        .as_i64()
        .ok_or_else(|| EvaluationError::new("expected an integer"))
}

fn rgb_to_int(r: i64, g: i64, b: i64) -> i64 {
    0xff << 24 | (r & 0xff) << 16 | (g & 0xff) << 8 | (b & 0xff)
}

impl Default for Ebnf {
    fn default() -> Self {
        Self::new()
    }
}

impl Ebnf {
    pub fn new() -> Self {
        let core = EbnfCore::new();
        let digit = make_digit(&core);
        let letter = make_letter(&core);
        let sign = make_sign(&core);
        let integer = make_integer(&core, &sign);
        let float = make_float(&core, &sign);
        let month = make_month(&core);
        let weekday = make_weekday(&core);
        let whitespace_star = make_whitespace_star(&core);
        let whitespace_plus = make_whitespace_plus(&core);
        let integer_range = make_integer_range(&core, &integer, &whitespace_star);
        let path_completer = Rc::new(FilesystemPathCompleter::new());
        let path = make_path(&core, path_completer.clone());
        let time = make_time(&core);
        let date = make_date(&core, &month);
        let date_time = make_date_time(&core, &date, &time);
        let color = make_color(&core, &integer);
        Self {
            core,
            digit,
            letter,
            sign,
            integer,
            float,
            month,
            weekday,
            whitespace_star,
            whitespace_plus,
            integer_range,
            path,
            time,
            date,
            date_time,
            color,
            path_completer,
        }
    }

    pub fn core(&self) -> &EbnfCore {
        &self.core
    }

    pub fn clear_filesystem_cache(&self) {
        self.path_completer.clear_cache();
    }

    pub fn digit(&self) -> &Rule {
        &self.digit
    }

    pub fn letter(&self) -> &Rule {
        &self.letter
    }

    pub fn sign(&self) -> &Rule {
        &self.sign
    }

    pub fn integer(&self) -> &Rule {
        &self.integer
    }

    pub fn float(&self) -> &Rule {
        &self.float
    }

    pub fn month(&self) -> &Rule {
        &self.month
    }

    pub fn weekday(&self) -> &Rule {
        &self.weekday
    }

    pub fn whitespace_star(&self) -> &Rule {
        &self.whitespace_star
    }

    pub fn whitespace_plus(&self) -> &Rule {
        &self.whitespace_plus
    }

    pub fn integer_range(&self) -> &Rule {
        &self.integer_range
    }

    pub fn path(&self) -> &Rule {
        &self.path
    }

    pub fn time(&self) -> &Rule {
        &self.time
    }

    pub fn date(&self) -> &Rule {
        &self.date
    }

    pub fn date_time(&self) -> &Rule {
        &self.date_time
    }

    pub fn color(&self) -> &Rule {
        &self.color
    }

    // constructors delegated to the rule container

    pub fn sequence(&self, typ: Option<&str>, children: Vec<Named<Symbol>>) -> Rule {
        self.core.sequence(typ, children)
    }

    pub fn or_rule(&self, typ: Option<&str>, options: Vec<Named<Symbol>>) -> Rule {
        self.core.or_rule(typ, options)
    }

    pub fn optional(&self, typ: Option<&str>, child: Named<Symbol>) -> Rule {
        self.core.optional(typ, child)
    }

    pub fn star(&self, typ: Option<&str>, child: Named<Symbol>) -> Rule {
        self.core.star(typ, child)
    }

    pub fn plus(&self, typ: Option<&str>, child: Named<Symbol>) -> Rule {
        self.core.plus(typ, child)
    }

    pub fn repeat(&self, typ: Option<&str>, child: Named<Symbol>, from: usize, to: usize) -> Rule {
        self.core.repeat(typ, child, from, to)
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
        self.core
            .join(typ, child, open, close, delimiter, cardinality, only_keep_entries)
    }

    pub fn list(&self, typ: Option<&str>, child: Named<Symbol>) -> Rule {
        self.core.list(typ, child)
    }

    pub fn tuple(&self, typ: Option<&str>, child: Named<Symbol>, names: &[&str]) -> Rule {
        self.core.tuple(typ, child, names)
    }

    pub fn compile(&self, top_level: &Symbol) {
        self.core.compile(top_level)
    }

    pub fn get_symbol(&self, name: &str) -> Option<Symbol> {
        self.core.get_symbol(name)
    }

    pub fn get_rules(&self, target: &NonTerminal) -> Vec<Rule> {
        self.core.get_rules(target)
    }
}

fn make_digit(core: &EbnfCore) -> Rule {
    let rule = core.sequence(Some("digit"), vec![digit().unnamed()]);
    rule.set_evaluator(Evaluator::new(|pn| match pn.parsed_text().chars().next() {
        Some(c) => Ok(Value::Char(c)),
        None => Err(EvaluationError::new("empty digit")),
    }));
    rule.set_autocompleter(Autocompleter::Inline);
    rule
}

fn make_letter(core: &EbnfCore) -> Rule {
    let rule = core.sequence(Some("letter"), vec![letter().unnamed()]);
    rule.set_evaluator(Evaluator::new(|pn| match pn.parsed_text().chars().next() {
        Some(c) => Ok(Value::Char(c)),
        None => Err(EvaluationError::new("empty letter")),
    }));
    rule.set_autocompleter(Autocompleter::Inline);
    rule
}

fn make_sign(core: &EbnfCore) -> Rule {
    core.or_rule(
        Some("sign"),
        vec![literal("-").unnamed(), literal("+").unnamed()],
    )
}

fn make_integer(core: &EbnfCore, sign: &Rule) -> Rule {
    // int -> (-|+)?digit+
    let rule = core.sequence(
        Some("int"),
        vec![
            core.optional(None, sign.with_name("sign")).with_name("optional"),
            core.plus(None, digit().with_name("digit")).with_name("plus"),
        ],
    );
    rule.set_evaluator(Evaluator::new(|pn| {
        pn.parsed_text()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|err| {
                EvaluationError::new(format!("invalid integer '{}': {}", pn.parsed_text(), err))
            })
    }));
    rule.set_autocompleter(Autocompleter::Inline);
    rule
}

fn make_float(core: &EbnfCore, sign: &Rule) -> Rule {
    // float -> (-|+)?digit+(.digit*)?
    let rule = core.sequence(
        Some("float"),
        vec![
            core.optional(None, sign.unnamed()).unnamed(),
            core.plus(None, digit().unnamed()).unnamed(),
            core.optional(
                None,
                core.sequence(
                    None,
                    vec![
                        literal(".").unnamed(),
                        core.star(None, digit().unnamed()).with_name("star"),
                    ],
                )
                .with_name("sequence"),
            )
            .unnamed(),
        ],
    );
    rule.set_evaluator(Evaluator::new(|pn| {
        pn.parsed_text()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|err| {
                EvaluationError::new(format!("invalid float '{}': {}", pn.parsed_text(), err))
            })
    }));
    rule.set_autocompleter(Autocompleter::Inline);
    rule
}

fn make_whitespace_star(core: &EbnfCore) -> Rule {
    let rule = core.star(Some("whitespace-star"), whitespace().unnamed());
    rule.set_autocompleter(Autocompleter::IfNothingYetEntered(" ".to_string()));
    rule
}

fn make_whitespace_plus(core: &EbnfCore) -> Rule {
    let rule = core.plus(Some("whitespace-plus"), whitespace().unnamed());
    rule.set_autocompleter(Autocompleter::IfNothingYetEntered(" ".to_string()));
    rule
}

fn make_integer_range(core: &EbnfCore, integer: &Rule, whitespace_star: &Rule) -> Rule {
    let delimiter = core.sequence(
        None,
        vec![
            whitespace_star.with_name("ws*"),
            literal("-").unnamed(),
            whitespace_star.with_name("ws*"),
        ],
    );
    let rule = core.join_with_names(
        Some("integer-range"),
        integer.unnamed(),
        None,
        None,
        Some(Symbol::NonTerminal(delimiter.tgt().clone())),
        &["from", "to"],
        true,
    );
    rule.set_evaluator(Evaluator::new(|pn| {
        Ok(Value::Range(int_child(pn, 0)?, int_child(pn, 1)?))
    }));
    rule
}

fn make_path(core: &EbnfCore, completer: Rc<FilesystemPathCompleter>) -> Rule {
    let inner_path = core.plus(
        None,
        built_in_class(r"[^'<>|?*\n]", r"[^'<>|?*\n]").with_name("inner-path"),
    );
    inner_path.set_evaluator(Evaluator::parsed_string());
    inner_path.set_autocompleter(Autocompleter::Path(completer));

    let path = core.sequence(
        Some("path"),
        vec![
            literal("'").unnamed(),
            inner_path.with_name("path"),
            literal("'").unnamed(),
        ],
    );
    path.set_evaluator(Evaluator::new(|pn| pn.evaluate(&["path"])));
    path.set_autocompleter(Autocompleter::EntireSequence {
        grammar: core.clone(),
        cache: fresh_cache(),
    });
    path
}

fn make_time(core: &EbnfCore) -> Rule {
    // HH:MM, the leading hour digit may be omitted
    let rule = core.sequence(
        Some("time"),
        vec![
            core.optional(None, digit().unnamed()).unnamed(),
            digit().unnamed(),
            literal(":").unnamed(),
            digit().unnamed(),
            digit().unnamed(),
        ],
    );
    rule.set_evaluator(Evaluator::new(|pn| {
        NaiveTime::parse_from_str(pn.parsed_text(), "%H:%M")
            .map(Value::Time)
            .map_err(|err| {
                EvaluationError::new(format!("invalid time '{}': {}", pn.parsed_text(), err))
            })
    }));
    rule.set_autocompleter(Autocompleter::IfNothingYetEntered("${HH}:${MM}".to_string()));
    rule
}

fn make_month(core: &EbnfCore) -> Rule {
    let month = |name: &str, index: i64| {
        core.sequence(None, vec![literal(name).unnamed()])
            .set_evaluator(Evaluator::new(move |_| Ok(Value::Int(index))))
            .with_name(name.to_lowercase())
    };
    core.or_rule(
        Some("month"),
        vec![
            month("January", 0),
            month("February", 1),
            month("March", 2),
            month("April", 3),
            month("May", 4),
            month("June", 5),
            month("July", 6),
            month("August", 7),
            month("September", 8),
            month("October", 9),
            month("November", 10),
            month("December", 11),
        ],
    )
}

fn make_weekday(core: &EbnfCore) -> Rule {
    let weekday = |name: &str, index: i64| {
        core.sequence(None, vec![literal(name).unnamed()])
            .set_evaluator(Evaluator::new(move |_| Ok(Value::Int(index))))
            .with_name(name.to_lowercase())
    };
    core.or_rule(
        Some("weekday"),
        vec![
            weekday("Monday", 0),
            weekday("Tuesday", 1),
            weekday("Wednesday", 2),
            weekday("Thursday", 3),
            weekday("Friday", 4),
            weekday("Saturday", 5),
            weekday("Sunday", 6),
        ],
    )
}

fn make_date(core: &EbnfCore, month: &Rule) -> Rule {
    let day = core.sequence(None, vec![digit().unnamed(), digit().unnamed()]);
    day.set_autocompleter(Autocompleter::custom(|pn, _just_check| {
        if !pn.parsed_text().is_empty() {
            return Ok(Some(vec![Autocompletion::veto()]));
        }
        Ok(Some(vec![Autocompletion::parameterized("day")]))
    }));

    let year = core.sequence(
        None,
        vec![
            digit().unnamed(),
            digit().unnamed(),
            digit().unnamed(),
            digit().unnamed(),
        ],
    );

    let rule = core.sequence(
        Some("date"),
        vec![
            day.with_name("day"),
            literal(" ").unnamed(),
            month.with_name("month"),
            literal(" ").unnamed(),
            year.with_name("year"),
        ],
    );
    rule.set_evaluator(Evaluator::new(|pn| {
        NaiveDate::parse_from_str(pn.parsed_text(), "%d %B %Y")
            .map(Value::Date)
            .map_err(|err| {
                EvaluationError::new(format!("invalid date '{}': {}", pn.parsed_text(), err))
            })
    }));
    rule.set_autocompleter(Autocompleter::EntireSequence {
        grammar: core.clone(),
        cache: fresh_cache(),
    });
    rule
}

fn make_date_time(core: &EbnfCore, date: &Rule, time: &Rule) -> Rule {
    let rule = core.sequence(
        Some("date-time"),
        vec![
            date.with_name("date"),
            literal(" ").unnamed(),
            time.with_name("time"),
        ],
    );
    rule.set_evaluator(Evaluator::new(|pn| {
        let date = match pn.evaluate(&["date"])? {
            Value::Date(date) => date,
            other => {
                return Err(EvaluationError::new(format!(
                    "expected a date, got {:?}",
                    other
                )))
            }
        };
        let time = match pn.evaluate(&["time"])? {
            Value::Time(time) => time,
            other => {
                return Err(EvaluationError::new(format!(
                    "expected a time, got {:?}",
                    other
                )))
            }
        };
        Ok(Value::DateTime(NaiveDateTime::new(date, time)))
    }));
    rule.set_autocompleter(Autocompleter::IfNothingYetEntered(
        "${Day} ${Month} ${Year} ${HH}:${MM}".to_string(),
    ));
    rule
}

fn make_color(core: &EbnfCore, integer: &Rule) -> Rule {
    let named = |name: &str, r: i64, g: i64, b: i64| {
        core.sequence(None, vec![literal(name).unnamed()])
            .set_evaluator(Evaluator::new(move |_| Ok(Value::Int(rgb_to_int(r, g, b)))))
            .unnamed()
    };

    let custom = core.tuple(None, integer.unnamed(), &["red", "green", "blue"]);
    custom.set_evaluator(Evaluator::new(|pn| {
        Ok(Value::Int(rgb_to_int(
            int_child(pn, 0)?,
            int_child(pn, 1)?,
            int_child(pn, 2)?,
        )))
    }));

    core.or_rule(
        Some("color"),
        vec![
            custom.unnamed(),
            named("black", 0, 0, 0),
            named("white", 255, 255, 255),
            named("red", 255, 0, 0),
            named("orange", 255, 128, 0),
            named("yellow", 255, 255, 0),
            named("lawn green", 128, 255, 0),
            named("green", 0, 255, 0),
            named("spring green", 0, 255, 180),
            named("cyan", 0, 255, 255),
            named("azure", 0, 128, 255),
            named("blue", 0, 0, 255),
            named("violet", 128, 0, 255),
            named("magenta", 255, 0, 255),
            named("pink", 255, 0, 128),
            named("gray", 128, 128, 128),
        ],
    )
}
