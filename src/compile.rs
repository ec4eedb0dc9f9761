use crate::{
    Comparison, Filter, Operand, Predicate, QueryError, Registry, Value,
    precedence::{self, Item},
};
use serde::{Deserialize, Serialize};
use sift_syntax::{Literal, Node, Operator, ParseOptions, Statement, parse_query_with};
use tracing::{debug, instrument, trace};

/// Knobs for [`Compiler`]. Deserializable so hosts can embed it in their own
/// configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub parse: ParseOptions,
}

/// Turns query text into a [`Predicate`] using the filters of one registry.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r Registry,
    options: CompileOptions,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Blank input compiles to [`Predicate::Empty`] without touching the
    /// grammar.
    #[instrument(level = "debug", skip(self), err)]
    pub fn compile(&self, text: &str) -> Result<Predicate, QueryError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Predicate::Empty);
        }
        let query = parse_query_with(text, &self.options.parse)?;
        let predicate = self.compile_nodes(&query.nodes)?;
        debug!(%predicate, "compiled query");
        Ok(predicate)
    }

    fn compile_nodes(&self, nodes: &[Node]) -> Result<Predicate, QueryError> {
        let mut items = Vec::with_capacity(nodes.len());
        for node in nodes {
            let item = match node {
                Node::Connective(connective) => Item::Connective(*connective),
                Node::Group(children) => Item::Predicate(self.compile_nodes(children)?),
                Node::Statement(statement) => {
                    let predicate = self.compile_statement(statement)?;
                    trace!(%statement, %predicate, "compiled statement");
                    Item::Predicate(predicate)
                }
            };
            items.push(item);
        }
        Ok(precedence::resolve(items))
    }

    fn compile_statement(&self, statement: &Statement) -> Result<Predicate, QueryError> {
        match statement {
            Statement::Binary { name, op, rhs } => self.compile_binary(name, *op, rhs),
            Statement::Unary { name, negated } => self.compile_unary(name, *negated),
            Statement::Freetext(text) => freetext_predicate(self.registry, text),
        }
    }

    fn compile_binary(&self, name: &str, op: Operator, rhs: &Literal) -> Result<Predicate, QueryError> {
        if let Some(base) = strip_pk_suffix(name) {
            let filter = self.registry.resolve(base)?;
            return pk_predicate(filter, op, rhs);
        }
        let filter = self.registry.resolve(name)?;

        if let Some(field) = self.field_reference(rhs) {
            filter.resolve_operator(op)?;
            return apply(filter, op, Operand::Field(field.to_string()), rhs);
        }

        if let Literal::Null = rhs {
            return null_predicate(filter, op);
        }

        let value = filter
            .parse(rhs.text())
            .map_err(|source| QueryError::FilterParse {
                filter: filter.name().to_string(),
                source,
            })?;
        filter.resolve_operator(op)?;
        apply(filter, op, Operand::Value(value), rhs)
    }

    fn compile_unary(&self, name: &str, negated: bool) -> Result<Predicate, QueryError> {
        let filter = self.registry.resolve(name)?;
        if !filter.is_unary() {
            return Err(QueryError::NotUnary {
                name: name.to_string(),
            });
        }
        let value = Value::Bool(!negated);
        filter
            .to_predicate(Operator::Eq, Operand::Value(value))?
            .ok_or_else(|| QueryError::UnknownValue {
                filter: filter.name().to_string(),
                value: (!negated).to_string(),
            })
    }

    // Only an unquoted value naming another filter with an attribute counts;
    // quoting always forces the literal.
    fn field_reference(&self, rhs: &Literal) -> Option<&'r str> {
        match rhs {
            Literal::Str(text) => self.registry.get(text)?.attr(),
            _ => None,
        }
    }
}

fn apply(filter: &Filter, op: Operator, operand: Operand, rhs: &Literal) -> Result<Predicate, QueryError> {
    filter
        .to_predicate(op, operand)?
        .ok_or_else(|| QueryError::UnknownValue {
            filter: filter.name().to_string(),
            value: rhs.text().to_string(),
        })
}

fn strip_pk_suffix(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(".pk".len())?;
    if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(".pk") {
        Some(&name[..split])
    } else {
        None
    }
}

// `name.pk=7` skips the filter's own parsing and compares primary keys.
fn pk_predicate(filter: &Filter, op: Operator, rhs: &Literal) -> Result<Predicate, QueryError> {
    if op != Operator::Eq {
        return Err(QueryError::PkOperator);
    }
    let text = rhs.text();
    let pk: i64 = text.trim().parse().map_err(|_| QueryError::InvalidPk {
        value: text.to_string(),
    })?;
    Ok(match filter.attr() {
        Some(attr) => Predicate::leaf(format!("{attr}.pk"), Comparison::Exact, Value::Int(pk)),
        None => Predicate::Empty,
    })
}

fn null_predicate(filter: &Filter, op: Operator) -> Result<Predicate, QueryError> {
    let negated = match op {
        Operator::Eq => false,
        Operator::NotEq => true,
        op => {
            return Err(QueryError::InvalidOperator {
                filter: filter.name().to_string(),
                op,
            });
        }
    };
    let Some(attr) = filter.attr() else {
        return Ok(Predicate::Empty);
    };
    let predicate = Predicate::is_null(attr);
    Ok(if negated { predicate.negate() } else { predicate })
}

/// `"text"` on its own: any freetext filter containing the text.
pub(crate) fn freetext_predicate(registry: &Registry, text: &str) -> Result<Predicate, QueryError> {
    let mut filters = registry.freetext_filters().peekable();
    if filters.peek().is_none() {
        return Err(QueryError::NoFreetextFilters);
    }
    let mut alternatives = Vec::new();
    for filter in filters {
        let Some(attr) = filter.attr() else {
            continue;
        };
        let resolved = filter.resolve_operator(Operator::Contains)?;
        let leaf = Predicate::leaf(attr, resolved.comparison, Value::Str(text.to_string()));
        alternatives.push(if resolved.negated { leaf.negate() } else { leaf });
    }
    Ok(Predicate::any(alternatives))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operators;

    fn registry() -> Registry {
        Registry::builder()
            .register(Filter::text("foo").with_freetext(true))
            .unwrap()
            .register(Filter::case_sensitive("bar").with_freetext(true))
            .unwrap()
            .register(Filter::integer("n"))
            .unwrap()
            .register(Filter::boolean("live"))
            .unwrap()
            .register(Filter::text("ghost").without_attr())
            .unwrap()
            .build()
    }

    fn compile(text: &str) -> Result<Predicate, QueryError> {
        Compiler::new(&registry()).compile(text)
    }

    #[test]
    fn blank_input_is_empty() {
        assert_eq!(compile("").unwrap(), Predicate::Empty);
        assert_eq!(compile(" \n\t ").unwrap(), Predicate::Empty);
    }

    #[test]
    fn unknown_filters_are_reported_as_typed() {
        for (query, typed) in [("NOPE=1", "NOPE"), ("Nope.PK=1", "Nope"), ("NoPe", "NoPe")] {
            match compile(query).unwrap_err() {
                QueryError::UnknownFilter { name, .. } => assert_eq!(name, typed, "{query}"),
                other => panic!("{query}: expected an unknown filter, got {other:?}"),
            }
        }
    }

    #[test]
    fn case_modes_pick_comparisons() {
        assert_eq!(
            compile("foo=x").unwrap(),
            Predicate::leaf("foo", Comparison::IExact, Value::from("x"))
        );
        assert_eq!(
            compile("bar:x").unwrap(),
            Predicate::leaf("bar", Comparison::Contains, Value::from("x"))
        );
    }

    #[test]
    fn freetext_ors_each_freetext_filter() {
        assert_eq!(
            compile("\"x\"").unwrap(),
            Predicate::Or(vec![
                Predicate::leaf("foo", Comparison::IContains, Value::from("x")),
                Predicate::leaf("bar", Comparison::Contains, Value::from("x")),
            ])
        );
    }

    #[test]
    fn freetext_needs_a_freetext_filter() {
        let registry = Registry::builder().register(Filter::text("a")).unwrap().build();
        let err = Compiler::new(&registry).compile("\"x\"").unwrap_err();
        assert_eq!(err, QueryError::NoFreetextFilters);
    }

    #[test]
    fn operator_outside_the_table_is_rejected() {
        assert_eq!(
            compile("n:4").unwrap_err(),
            QueryError::InvalidOperator {
                filter: "n".into(),
                op: Operator::Contains
            }
        );
        assert_eq!(
            compile("live>1").unwrap_err().to_string(),
            "Invalid operator \">\" for filter \"live\""
        );
    }

    #[test]
    fn parse_failures_name_the_filter() {
        let err = compile("live=9").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for filter \"live\": 9 is not a valid boolean value"
        );
    }

    #[test]
    fn null_only_supports_equality() {
        assert_eq!(compile("foo=null").unwrap(), Predicate::is_null("foo"));
        assert_eq!(compile("foo!=NULL").unwrap(), Predicate::is_null("foo").negate());
        assert!(matches!(
            compile("foo>null").unwrap_err(),
            QueryError::InvalidOperator { .. }
        ));
    }

    #[test]
    fn filters_without_attr_match_everything() {
        assert_eq!(compile("ghost=1").unwrap(), Predicate::Empty);
        assert_eq!(compile("ghost=1 and n=2").unwrap(), Predicate::leaf("n", Comparison::Exact, Value::Int(2)));
        assert_eq!(compile("ghost.pk=3").unwrap(), Predicate::Empty);
    }

    #[test]
    fn unquoted_filter_names_become_field_references() {
        assert_eq!(
            compile("foo=bar").unwrap(),
            Predicate::leaf("foo", Comparison::IExact, Operand::Field("bar".into()))
        );
        assert_eq!(
            compile("foo=\"bar\"").unwrap(),
            Predicate::leaf("foo", Comparison::IExact, Value::from("bar"))
        );
        // Naming a filter without an attribute keeps the literal.
        assert_eq!(
            compile("foo=ghost").unwrap(),
            Predicate::leaf("foo", Comparison::IExact, Value::from("ghost"))
        );
    }

    #[test]
    fn custom_operator_tables_apply() {
        let registry = Registry::builder()
            .register(
                Filter::text("title")
                    .with_operators(Operators::case_insensitive().without(Operator::Gt)),
            )
            .unwrap()
            .build();
        let compiler = Compiler::new(&registry);
        assert!(compiler.compile("title>=a").is_ok());
        assert!(matches!(
            compiler.compile("title>a").unwrap_err(),
            QueryError::InvalidOperator { .. }
        ));
    }

    #[test]
    fn options_tighten_the_grammar_limits() {
        let registry = registry();
        let options = CompileOptions {
            parse: ParseOptions {
                max_depth: 1,
                ..ParseOptions::default()
            },
        };
        let compiler = Compiler::new(&registry).with_options(options);
        assert!(compiler.compile("(n=1)").is_ok());
        assert!(matches!(
            compiler.compile("((n=1))").unwrap_err(),
            QueryError::Syntax(_)
        ));
    }
}
