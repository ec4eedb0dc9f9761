use crate::{Comparison, Operand, Predicate, QueryError, Value, ValueError, parse};
use hashbrown::HashMap;
use sift_syntax::Operator;
use std::{fmt, sync::Arc};

/// Turns the raw text of a query value into a typed [`Value`].
pub type ParseFn = Arc<dyn Fn(&str) -> Result<Value, ValueError> + Send + Sync>;

/// Builds the predicate for `filter <op> operand`.
///
/// `Ok(None)` means the value matched nothing (for example a display name
/// with no corresponding record) and is reported as
/// [`QueryError::UnknownValue`].
pub type PredicateFn =
    Arc<dyn Fn(&Filter, Operator, Operand) -> Result<Option<Predicate>, QueryError> + Send + Sync>;

/// What an operator means for one particular filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOperator {
    pub comparison: Comparison,
    pub negated: bool,
}

/// Maps the operators a user may type to comparisons for one filter.
/// Operators missing from the table are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Operators {
    table: HashMap<Operator, ResolvedOperator>,
}

impl Operators {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `=` and `:` ignore case. The default for text.
    pub fn case_insensitive() -> Self {
        Self::ordering()
            .with(Operator::Eq, Comparison::IExact)
            .with(Operator::Contains, Comparison::IContains)
            .with_negated(Operator::NotEq, Comparison::IExact)
            .with_negated(Operator::NotContains, Comparison::IContains)
    }

    pub fn case_sensitive() -> Self {
        Self::ordering()
            .with(Operator::Eq, Comparison::Exact)
            .with(Operator::Contains, Comparison::Contains)
            .with_negated(Operator::NotEq, Comparison::Exact)
            .with_negated(Operator::NotContains, Comparison::Contains)
    }

    /// Equality and ordering without substring matching, for numbers,
    /// dates and times.
    pub fn ordered() -> Self {
        Self::ordering().extend_with(Self::equality())
    }

    /// `=` and `!=` only.
    pub fn equality() -> Self {
        Self::empty()
            .with(Operator::Eq, Comparison::Exact)
            .with_negated(Operator::NotEq, Comparison::Exact)
    }

    fn ordering() -> Self {
        Self::empty()
            .with(Operator::Gt, Comparison::Gt)
            .with(Operator::Gte, Comparison::Gte)
            .with(Operator::Lt, Comparison::Lt)
            .with(Operator::Lte, Comparison::Lte)
    }

    pub fn with(mut self, op: Operator, comparison: Comparison) -> Self {
        self.table.insert(
            op,
            ResolvedOperator {
                comparison,
                negated: false,
            },
        );
        self
    }

    pub fn with_negated(mut self, op: Operator, comparison: Comparison) -> Self {
        self.table.insert(
            op,
            ResolvedOperator {
                comparison,
                negated: true,
            },
        );
        self
    }

    pub fn without(mut self, op: Operator) -> Self {
        self.table.remove(&op);
        self
    }

    fn extend_with(mut self, other: Operators) -> Self {
        self.table.extend(other.table);
        self
    }

    pub fn resolve(&self, op: Operator) -> Option<ResolvedOperator> {
        self.table.get(&op).copied()
    }

    pub fn allows(&self, op: Operator) -> bool {
        self.table.contains_key(&op)
    }
}

/// A named, typed attribute that can appear in a query.
///
/// Filters are plain records: the shortcut constructors ([`Filter::text`],
/// [`Filter::integer`], ...) fill in the parse function, operator table and
/// flags, and the builder methods override individual fields.
///
/// ```
/// use sift::{Filter, Operators};
///
/// let filter = Filter::text("Artist")
///     .with_attr("album__artist__name")
///     .with_freetext(true);
/// assert_eq!(filter.query_name(), "artist");
/// assert_eq!(filter.attr(), Some("album__artist__name"));
/// assert_eq!(filter.operators(), &Operators::case_insensitive());
/// ```
#[derive(Clone)]
pub struct Filter {
    name: String,
    query_name: String,
    attr: Option<String>,
    unary: bool,
    freetext: bool,
    operators: Operators,
    form_operator: Operator,
    parse: ParseFn,
    value_to_predicate: PredicateFn,
}

impl Filter {
    /// A filter named `name` over the attribute of the same name, comparing
    /// text without regard to case.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            query_name: name.to_lowercase(),
            attr: Some(name.clone()),
            name,
            unary: false,
            freetext: false,
            operators: Operators::case_insensitive(),
            form_operator: Operator::Eq,
            parse: Arc::new(parse::parse_text),
            value_to_predicate: Arc::new(default_value_to_predicate),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    pub fn case_sensitive(name: impl Into<String>) -> Self {
        Self::new(name).with_operators(Operators::case_sensitive())
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_operators(Operators::ordered())
            .with_parse(parse::parse_int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_operators(Operators::ordered())
            .with_parse(parse::parse_float)
    }

    /// Unary, so both `live` and `!live` work alongside `live=yes`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_operators(Operators::equality())
            .with_parse(parse::parse_bool)
            .with_unary(true)
    }

    /// A boolean that may also be unknown: `live=""` matches rows where the
    /// attribute is null, alongside `live=yes` and `live=no`.
    pub fn boolean_tristate(name: impl Into<String>) -> Self {
        Self::boolean(name)
            .with_parse(parse::parse_tristate)
            .with_value_to_predicate(tristate_value_to_predicate)
    }

    /// Exact decimal numbers, compared without going through floating point.
    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_operators(Operators::ordered())
            .with_parse(parse::parse_decimal)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name).with_parse(parse::parse_email)
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name).with_parse(parse::parse_url)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_operators(Operators::ordered())
            .with_parse(parse::parse_date)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_operators(Operators::ordered())
            .with_parse(parse::parse_datetime)
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_operators(Operators::ordered())
            .with_parse(parse::parse_time)
    }

    /// Accepts only the listed values, compared exactly.
    pub fn choice<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        Self::new(name)
            .with_operators(Operators::equality())
            .with_parse(move |text: &str| {
                if choices.iter().any(|choice| choice == text) {
                    Ok(Value::Str(text.to_string()))
                } else {
                    Err(ValueError::new(format!("{text} not in available choices")))
                }
            })
    }

    /// A reference to another record, typed by display name and matched on
    /// primary key.
    ///
    /// `lookup` returns the primary keys of every record whose display name
    /// equals the text. No match is an unknown value, more than one is
    /// ambiguous, and exactly one becomes `<attr>.pk = <pk>`.
    pub fn choice_lookup<F>(name: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Vec<i64> + Send + Sync + 'static,
    {
        Self::new(name)
            .with_operators(Operators::equality())
            .with_value_to_predicate(move |filter: &Filter, op: Operator, operand: Operand| {
                let Some(attr) = filter.attr() else {
                    return Ok(Some(Predicate::Empty));
                };
                let resolved = filter.resolve_operator(op)?;
                let predicate = match operand {
                    Operand::Value(Value::Str(display_name)) => {
                        match lookup(&display_name).as_slice() {
                            [] => return Ok(None),
                            [pk] => Predicate::leaf(
                                format!("{attr}.pk"),
                                resolved.comparison,
                                Value::Int(*pk),
                            ),
                            _ => {
                                return Err(QueryError::AmbiguousValue {
                                    filter: filter.name().to_string(),
                                    value: display_name,
                                });
                            }
                        }
                    }
                    other => Predicate::leaf(attr, resolved.comparison, other),
                };
                Ok(Some(if resolved.negated {
                    predicate.negate()
                } else {
                    predicate
                }))
            })
    }

    /// Attribute path the filter compares against. Defaults to the name.
    pub fn with_attr(mut self, path: impl Into<String>) -> Self {
        self.attr = Some(path.into());
        self
    }

    /// The filter accepts values but never constrains anything unless
    /// [`Filter::with_value_to_predicate`] supplies a predicate some other way.
    pub fn without_attr(mut self) -> Self {
        self.attr = None;
        self
    }

    /// Name typed in queries. Defaults to the lowercased filter name.
    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = query_name.into().to_lowercase();
        self
    }

    pub fn with_freetext(mut self, freetext: bool) -> Self {
        self.freetext = freetext;
        self
    }

    pub fn with_unary(mut self, unary: bool) -> Self {
        self.unary = unary;
        self
    }

    pub fn with_operators(mut self, operators: Operators) -> Self {
        self.operators = operators;
        self
    }

    /// Operator written by the serializer for a bound value.
    pub fn with_form_operator(mut self, op: Operator) -> Self {
        self.form_operator = op;
        self
    }

    pub fn with_parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(&str) -> Result<Value, ValueError> + Send + Sync + 'static,
    {
        self.parse = Arc::new(parse);
        self
    }

    pub fn with_value_to_predicate<F>(mut self, value_to_predicate: F) -> Self
    where
        F: Fn(&Filter, Operator, Operand) -> Result<Option<Predicate>, QueryError>
            + Send
            + Sync
            + 'static,
    {
        self.value_to_predicate = Arc::new(value_to_predicate);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    pub fn attr(&self) -> Option<&str> {
        self.attr.as_deref()
    }

    pub fn is_unary(&self) -> bool {
        self.unary
    }

    pub fn is_freetext(&self) -> bool {
        self.freetext
    }

    pub fn operators(&self) -> &Operators {
        &self.operators
    }

    pub fn form_operator(&self) -> Operator {
        self.form_operator
    }

    pub fn parse(&self, text: &str) -> Result<Value, ValueError> {
        (self.parse)(text)
    }

    pub fn to_predicate(
        &self,
        op: Operator,
        operand: Operand,
    ) -> Result<Option<Predicate>, QueryError> {
        (self.value_to_predicate)(self, op, operand)
    }

    /// Looks `op` up in the operator table.
    pub fn resolve_operator(&self, op: Operator) -> Result<ResolvedOperator, QueryError> {
        self.operators
            .resolve(op)
            .ok_or_else(|| QueryError::InvalidOperator {
                filter: self.name.clone(),
                op,
            })
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name)
            .field("query_name", &self.query_name)
            .field("attr", &self.attr)
            .field("unary", &self.unary)
            .field("freetext", &self.freetext)
            .field("operators", &self.operators)
            .field("form_operator", &self.form_operator)
            .finish_non_exhaustive()
    }
}

/// Compares the filter's attribute using its operator table; negated
/// operators wrap the positive comparison in [`Predicate::Not`].
pub fn default_value_to_predicate(
    filter: &Filter,
    op: Operator,
    operand: Operand,
) -> Result<Option<Predicate>, QueryError> {
    let Some(attr) = filter.attr() else {
        return Ok(Some(Predicate::Empty));
    };
    let resolved = filter.resolve_operator(op)?;
    let leaf = Predicate::leaf(attr, resolved.comparison, operand);
    Ok(Some(if resolved.negated { leaf.negate() } else { leaf }))
}

fn tristate_value_to_predicate(
    filter: &Filter,
    op: Operator,
    operand: Operand,
) -> Result<Option<Predicate>, QueryError> {
    match operand {
        Operand::Value(Value::Str(text)) if text.is_empty() => {
            let resolved = filter.resolve_operator(op)?;
            let Some(attr) = filter.attr() else {
                return Ok(Some(Predicate::Empty));
            };
            let predicate = Predicate::is_null(attr);
            Ok(Some(if resolved.negated {
                predicate.negate()
            } else {
                predicate
            }))
        }
        operand => default_value_to_predicate(filter, op, operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(filter: &Filter, op: Operator, text: &str) -> Predicate {
        let value = filter.parse(text).unwrap();
        filter.to_predicate(op, Operand::Value(value)).unwrap().unwrap()
    }

    #[test]
    fn tristate_empty_text_means_null() {
        let filter = Filter::boolean_tristate("live").with_attr("is_live");
        assert!(filter.is_unary());
        assert_eq!(predicate(&filter, Operator::Eq, ""), Predicate::is_null("is_live"));
        assert_eq!(
            predicate(&filter, Operator::NotEq, ""),
            Predicate::is_null("is_live").negate()
        );
        assert_eq!(
            predicate(&filter, Operator::Eq, "no"),
            Predicate::leaf("is_live", Comparison::Exact, Value::Bool(false))
        );
    }

    #[test]
    fn decimal_filters_order_exactly() {
        let filter = Filter::decimal("price");
        assert_eq!(
            predicate(&filter, Operator::Gte, "9.90"),
            Predicate::leaf("price", Comparison::Gte, Value::Decimal("9.90".into()))
        );
        assert!(!filter.operators().allows(Operator::Contains));
    }

    #[test]
    fn email_and_url_filters_validate_but_compare_as_text() {
        let email = Filter::email("contact");
        assert_eq!(
            predicate(&email, Operator::Contains, "dio@example.com"),
            Predicate::leaf("contact", Comparison::IContains, Value::from("dio@example.com"))
        );
        assert!(email.parse("dio").is_err());
        let url = Filter::url("homepage");
        assert!(url.parse("https://ronniejamesdio.com").is_ok());
        assert!(url.parse("ronniejamesdio").is_err());
    }
}
