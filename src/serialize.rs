use crate::{
    Comparison, Filter, Operand, Predicate, QueryError, Registry, Value,
    compile::freetext_predicate,
};
use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sift_syntax::Operator;
use tracing::warn;

/// The value currently selected for one filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundValue {
    Single(Value),
    /// Any of several values.
    List(Vec<Value>),
    /// A reference to another record. Written by display name when there is
    /// one, by primary key otherwise.
    Record { pk: i64, name: Option<String> },
}

impl BoundValue {
    fn is_blank(&self) -> bool {
        match self {
            BoundValue::Single(value) => value.is_blank(),
            BoundValue::List(values) => values.is_empty(),
            BoundValue::Record { .. } => false,
        }
    }
}

impl From<Value> for BoundValue {
    fn from(value: Value) -> Self {
        BoundValue::Single(value)
    }
}

impl From<Vec<Value>> for BoundValue {
    fn from(values: Vec<Value>) -> Self {
        BoundValue::List(values)
    }
}

impl From<&str> for BoundValue {
    fn from(text: &str) -> Self {
        BoundValue::Single(text.into())
    }
}

impl From<String> for BoundValue {
    fn from(text: String) -> Self {
        BoundValue::Single(text.into())
    }
}

impl From<i64> for BoundValue {
    fn from(number: i64) -> Self {
        BoundValue::Single(number.into())
    }
}

impl From<f64> for BoundValue {
    fn from(number: f64) -> Self {
        BoundValue::Single(number.into())
    }
}

impl From<bool> for BoundValue {
    fn from(flag: bool) -> Self {
        BoundValue::Single(flag.into())
    }
}

/// Selected values keyed by filter name, plus the shared freetext search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundValues {
    values: HashMap<String, BoundValue>,
    freetext: Option<String>,
}

impl BoundValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl Into<String>, value: impl Into<BoundValue>) -> Self {
        self.set(filter, value);
        self
    }

    pub fn with_freetext(mut self, text: impl Into<String>) -> Self {
        self.freetext = Some(text.into());
        self
    }

    pub fn set(&mut self, filter: impl Into<String>, value: impl Into<BoundValue>) {
        self.values.insert(filter.into(), value.into());
    }

    pub fn get(&self, filter: &str) -> Option<&BoundValue> {
        self.values.get(filter)
    }

    pub fn freetext(&self) -> Option<&str> {
        self.freetext.as_deref().filter(|text| !text.is_empty())
    }

    /// Builds the predicate these values stand for straight from each
    /// filter, without going through query text.
    ///
    /// Compiling [`serialize`]'s output yields the same predicate once both
    /// sides are [`Predicate::normalized`].
    pub fn to_predicate(&self, registry: &Registry) -> Result<Predicate, QueryError> {
        let mut parts = Vec::new();
        for (filter, value) in self.bound(registry) {
            parts.push(bound_predicate(filter, value)?);
        }
        if let Some(text) = self.freetext() {
            parts.push(freetext_predicate(registry, text)?);
        }
        Ok(Predicate::all(parts))
    }

    // Non-blank values of registered filters, in registration order.
    fn bound<'a>(&'a self, registry: &'a Registry) -> impl Iterator<Item = (&'a Filter, &'a BoundValue)> {
        registry.iter().filter_map(|filter| {
            self.values
                .get(filter.name())
                .filter(|value| !value.is_blank())
                .map(|value| (filter, value))
        })
    }
}

/// Writes the canonical query for `values`: one clause per bound filter in
/// registration order, then the freetext search, joined with `and`.
///
/// ```
/// use sift::{BoundValue, BoundValues, Filter, Registry, Value, serialize};
///
/// let registry = Registry::builder()
///     .register(Filter::text("title").with_freetext(true))?
///     .register(Filter::integer("year"))?
///     .build();
/// let values = BoundValues::new()
///     .with("year", BoundValue::List(vec![Value::Int(1983), Value::Int(1984)]))
///     .with("title", "Holy \"Diver\"");
/// assert_eq!(
///     serialize(&registry, &values),
///     r#"title="Holy \"Diver\"" and (year=1983 OR year=1984)"#
/// );
/// # Ok::<(), sift::RegistryError>(())
/// ```
pub fn serialize(registry: &Registry, values: &BoundValues) -> String {
    for name in values
        .values
        .keys()
        .filter(|name| registry.filter(name).is_none())
        .sorted()
    {
        warn!(filter = %name, "bound value for unknown filter skipped");
    }

    let mut clauses: Vec<String> = values
        .bound(registry)
        .map(|(filter, value)| clause(filter, value))
        .collect();

    if let Some(text) = values.freetext() {
        let literal = Value::Str(text.to_string()).to_query_literal();
        let alternatives = registry
            .freetext_filters()
            .map(|filter| format!("{}{}{literal}", filter.query_name(), Operator::Contains))
            .join(" or ");
        if !alternatives.is_empty() {
            clauses.push(format!("({alternatives})"));
        }
    }

    clauses.join(" and ")
}

fn clause(filter: &Filter, value: &BoundValue) -> String {
    let op = filter.form_operator();
    match value {
        BoundValue::Single(value) => {
            format!("{}{op}{}", filter.query_name(), value.to_query_literal())
        }
        BoundValue::List(values) => {
            let alternatives = values
                .iter()
                .map(|value| format!("{}{op}{}", filter.query_name(), value.to_query_literal()))
                .join(" OR ");
            format!("({alternatives})")
        }
        BoundValue::Record { name: Some(name), .. } => {
            format!("{}{op}{}", filter.query_name(), sift_syntax::quote(name))
        }
        BoundValue::Record { pk, name: None } => format!("{}.pk={pk}", filter.query_name()),
    }
}

fn bound_predicate(filter: &Filter, value: &BoundValue) -> Result<Predicate, QueryError> {
    let op = filter.form_operator();
    let single = |value: &Value| -> Result<Predicate, QueryError> {
        filter
            .to_predicate(op, Operand::Value(value.clone()))?
            .ok_or_else(|| QueryError::UnknownValue {
                filter: filter.name().to_string(),
                value: match value {
                    Value::Str(text) => text.clone(),
                    other => other.to_string(),
                },
            })
    };
    match value {
        BoundValue::Single(value) => single(value),
        BoundValue::List(values) => {
            let alternatives = values.iter().map(single).collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::any(alternatives))
        }
        BoundValue::Record { name: Some(name), .. } => single(&Value::Str(name.clone())),
        BoundValue::Record { pk, name: None } => Ok(match filter.attr() {
            Some(attr) => Predicate::leaf(format!("{attr}.pk"), Comparison::Exact, Value::Int(*pk)),
            None => Predicate::Empty,
        }),
    }
}
