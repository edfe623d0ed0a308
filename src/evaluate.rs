use crate::{EvaluationError, ParsedNode};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// The result of evaluating a parsed node.
///
/// Evaluation is heterogeneous (integers, colors, timestamps, lists of child
/// results, ...), so the possible results form one closed variant instead of a
/// dynamically typed object.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Str(String),
    Char(char),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    /// An inclusive integer range, e.g. from the `integer-range` type.
    Range(i64, i64),
    Time(NaiveTime),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A function-like capability attached to a rule, mapping a parsed node to a [Value].
///
/// When no evaluator is set, a per-kind default applies: Sequence, Repeat, Star, Plus
/// and Join collect all child evaluations, Or and Optional evaluate their first child,
/// and plain nodes evaluate to their parsed string.
#[derive(Clone)]
pub struct Evaluator {
    f: Rc<dyn Fn(ParsedNode) -> Result<Value, EvaluationError>>,
}

impl Evaluator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(ParsedNode) -> Result<Value, EvaluationError> + 'static,
    {
        Self { f: Rc::new(f) }
    }

    pub fn evaluate(&self, pn: ParsedNode) -> Result<Value, EvaluationError> {
        (*self.f)(pn)
    }

    /// Evaluates to the parsed string of the node.
    pub fn parsed_string() -> Self {
        Evaluator::new(|pn| Ok(Value::Str(pn.parsed_text().to_string())))
    }

    /// Evaluates the first child, or [Value::None] when there is none.
    pub fn first_child() -> Self {
        Evaluator::new(|pn| match pn.child(0) {
            Some(child) => child.evaluate_self(),
            None => Ok(Value::None),
        })
    }

    /// Evaluates all children into a [Value::List].
    pub fn all_children() -> Self {
        Evaluator::new(|pn| {
            let mut values = Vec::with_capacity(pn.num_children());
            for i in 0..pn.num_children() {
                values.push(pn.evaluate_child_by_index(i)?);
            }
            Ok(Value::List(values))
        })
    }
}

impl Debug for Evaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Evaluator")
    }
}
