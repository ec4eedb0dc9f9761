use crate::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compiled boolean expression handed to whatever translates it into a
/// storage query.
///
/// Built through [`Predicate::and`]/[`Predicate::or`], which keep the tree
/// flat: chaining `a and b and c` yields one `And` with three children and
/// [`Predicate::Empty`] disappears from any conjunction or disjunction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches everything.
    #[default]
    Empty,
    Leaf(Lookup),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

/// A single comparison between an attribute path and a value or another
/// attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    pub path: String,
    pub comparison: Comparison,
    pub operand: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Exact,
    IExact,
    Contains,
    IContains,
    Gt,
    Gte,
    Lt,
    Lte,
    IsNull,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Exact => "exact",
            Comparison::IExact => "iexact",
            Comparison::Contains => "contains",
            Comparison::IContains => "icontains",
            Comparison::Gt => "gt",
            Comparison::Gte => "gte",
            Comparison::Lt => "lt",
            Comparison::Lte => "lte",
            Comparison::IsNull => "isnull",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a [`Lookup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Value(Value),
    /// Attribute path of another filter, as in `start_date<end_date`.
    Field(String),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(value) => fmt::Display::fmt(value, f),
            Operand::Field(path) => write!(f, "F({path})"),
        }
    }
}

impl Predicate {
    pub fn leaf(path: impl Into<String>, comparison: Comparison, operand: impl Into<Operand>) -> Self {
        Predicate::Leaf(Lookup {
            path: path.into(),
            comparison,
            operand: operand.into(),
        })
    }

    /// `path IS NULL`.
    pub fn is_null(path: impl Into<String>) -> Self {
        Predicate::leaf(path, Comparison::IsNull, Value::Bool(true))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Predicate::Empty)
    }

    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Empty, other) => other,
            (this, Predicate::Empty) => this,
            (this, other) => {
                let mut parts = Vec::new();
                push_flat(&mut parts, this, Kind::And);
                push_flat(&mut parts, other, Kind::And);
                Predicate::And(parts)
            }
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Empty, other) => other,
            (this, Predicate::Empty) => this,
            (this, other) => {
                let mut parts = Vec::new();
                push_flat(&mut parts, this, Kind::Or);
                push_flat(&mut parts, other, Kind::Or);
                Predicate::Or(parts)
            }
        }
    }

    /// Negation; negating [`Predicate::Empty`] leaves it unconstrained.
    pub fn negate(self) -> Predicate {
        match self {
            Predicate::Empty => Predicate::Empty,
            other => Predicate::Not(Box::new(other)),
        }
    }

    /// Conjunction of every item, `Empty` when there are none.
    pub fn all(items: impl IntoIterator<Item = Predicate>) -> Predicate {
        items.into_iter().fold(Predicate::Empty, Predicate::and)
    }

    /// Disjunction of every item, `Empty` when there are none.
    pub fn any(items: impl IntoIterator<Item = Predicate>) -> Predicate {
        items.into_iter().fold(Predicate::Empty, Predicate::or)
    }

    /// Rebuilds the tree bottom-up so nested same-kind groups are merged,
    /// `Empty` children are dropped and single-child groups collapse.
    ///
    /// Two trees that only differ in how their `and`/`or` groups were nested
    /// compare equal once normalized.
    pub fn normalized(self) -> Predicate {
        match self {
            Predicate::And(parts) => Predicate::all(parts.into_iter().map(Predicate::normalized)),
            Predicate::Or(parts) => Predicate::any(parts.into_iter().map(Predicate::normalized)),
            Predicate::Not(inner) => inner.normalized().negate(),
            other => other,
        }
    }
}

#[derive(Clone, Copy)]
enum Kind {
    And,
    Or,
}

fn push_flat(parts: &mut Vec<Predicate>, predicate: Predicate, kind: Kind) {
    match (predicate, kind) {
        (Predicate::And(children), Kind::And) | (Predicate::Or(children), Kind::Or) => {
            parts.extend(children)
        }
        (other, _) => parts.push(other),
    }
}

/// Renders in the style of a Django `Q` object, e.g.
/// `(AND: foo__iexact="asd", (NOT bar__exact=7))`.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Empty => f.write_str("(AND: )"),
            Predicate::Leaf(lookup) => {
                write!(f, "{}__{}={}", lookup.path, lookup.comparison, lookup.operand)
            }
            Predicate::And(parts) => write_group(f, "AND", parts),
            Predicate::Or(parts) => write_group(f, "OR", parts),
            Predicate::Not(inner) => write!(f, "(NOT {inner})"),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, label: &str, parts: &[Predicate]) -> fmt::Result {
    write!(f, "({label}: ")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        fmt::Display::fmt(part, f)?;
    }
    f.write_str(")")
}
