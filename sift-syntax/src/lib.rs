//! # Sift's filter query syntax
//!
//! `sift-syntax` turns a human-typed filter query such as
//! `artist="Dio" and (year>=1983 or "holy")` into a flat, token-level tree so
//! the `sift` compiler can resolve filter names and operator semantics without
//! re-implementing the grammar. The crate knows nothing about which filters
//! exist: every identifier is kept verbatim and values stay textual.
//!
//! ## Example
//! ```
//! use sift_syntax::{parse_query, Connective, Literal, Node, Operator, Statement};
//!
//! let query = parse_query("year>=1983 or \"holy\"").unwrap();
//! assert_eq!(query.nodes.len(), 3);
//! assert!(matches!(
//!     &query.nodes[0],
//!     Node::Statement(Statement::Binary { name, op: Operator::Gte, rhs: Literal::Str(v) })
//!         if name == "year" && v == "1983"
//! ));
//! assert_eq!(query.nodes[1], Node::Connective(Connective::Or));
//! assert!(matches!(&query.nodes[2], Node::Statement(Statement::Freetext(t)) if t == "holy"));
//! ```

mod parser;

use serde::{Deserialize, Serialize};
use std::fmt;

use parser::Parser;

/// Parses a filter query with the default [`ParseOptions`].
pub fn parse_query(input: &str) -> Result<Query, ParseError> {
    parse_query_with(input, &ParseOptions::default())
}

/// Parses a filter query, enforcing the length and nesting limits in `options`.
pub fn parse_query_with(input: &str, options: &ParseOptions) -> Result<Query, ParseError> {
    Parser::new(input, options).parse()
}

/// Whether `text` can be typed as a filter name: an ASCII letter or `_`
/// followed by ASCII alphanumerics or `_ $ - .`, and not `and`/`or`.
pub fn is_identifier(text: &str) -> bool {
    parser::is_identifier(text)
}

/// Wraps `text` in double quotes so it reads back as a single quoted literal.
///
/// Quotes and backslashes are escaped; [`parse_query`] resolves both escapes.
///
/// ```
/// assert_eq!(sift_syntax::quote(r#"say "hi""#), r#""say \"hi\"""#);
/// ```
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Limits that keep adversarial input from growing the parser stack unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Deepest parenthesis nesting accepted.
    pub max_depth: usize,
    /// Longest query accepted, in bytes.
    pub max_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_length: 64 * 1024,
        }
    }
}

/// A parsed query: conditions alternating with connectives.
///
/// The list is never empty unless the input was blank, and it always has an odd
/// length with a [`Node::Connective`] at every odd index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub nodes: Vec<Node>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One element of a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Statement(Statement),
    Connective(Connective),
    /// A parenthesized sub-expression, same shape as [`Query::nodes`].
    Group(Vec<Node>),
}

/// A leaf condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// `name <op> value`, e.g. `year>=1983`.
    Binary {
        name: String,
        op: Operator,
        rhs: Literal,
    },
    /// A bare filter name, optionally prefixed with `!`.
    ///
    /// ```
    /// use sift_syntax::{parse_query, Node, Statement};
    /// let query = parse_query("!is_live").unwrap();
    /// assert!(matches!(
    ///     &query.nodes[0],
    ///     Node::Statement(Statement::Unary { name, negated: true }) if name == "is_live"
    /// ));
    /// ```
    Unary { name: String, negated: bool },
    /// A quoted string with no filter name in front of it.
    Freetext(String),
}

/// Right-hand side of a binary statement. Numbers, dates and booleans are not
/// distinguished here; the matching filter decides how to read the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    /// Unquoted run such as `1983`, `2014-03-07` or `end_date`.
    Str(String),
    /// Double-quoted text with escapes resolved.
    Quoted(String),
    /// Bare `null` in any letter case.
    Null,
}

impl Literal {
    /// Source text of the literal (`"null"` for [`Literal::Null`]).
    pub fn text(&self) -> &str {
        match self {
            Literal::Str(text) | Literal::Quoted(text) => text,
            Literal::Null => "null",
        }
    }
}

/// Comparison operators as typed. `=>`/`=<` are accepted spellings of `>=`/`<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ":")]
    Contains,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "!:")]
    NotContains,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Contains,
        Operator::NotEq,
        Operator::NotContains,
    ];

    /// Canonical spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Contains => ":",
            Operator::NotEq => "!=",
            Operator::NotContains => "!:",
        }
    }

    /// Recognizes every accepted spelling, including `=>` and `=<`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        parser::OPERATOR_LEXEMES
            .iter()
            .find(|(lexeme, _)| *lexeme == symbol)
            .map(|(_, op)| *op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// Binding strength; `and` binds tighter than `or`.
    pub fn precedence(self) -> u8 {
        match self {
            Connective::And => 3,
            Connective::Or => 2,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connective::And => f.write_str("and"),
            Connective::Or => f.write_str("or"),
        }
    }
}

/// Renders the query back into canonical syntax.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Statement(statement) => fmt::Display::fmt(statement, f),
            Node::Connective(connective) => fmt::Display::fmt(connective, f),
            Node::Group(nodes) => {
                f.write_str("(")?;
                write_nodes(f, nodes)?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Binary { name, op, rhs } => write!(f, "{name}{op}{rhs}"),
            Statement::Unary { name, negated } => {
                if *negated {
                    f.write_str("!")?;
                }
                f.write_str(name)
            }
            Statement::Freetext(text) => f.write_str(&quote(text)),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(text) => f.write_str(text),
            Literal::Quoted(text) => f.write_str(&quote(text)),
            Literal::Null => f.write_str("null"),
        }
    }
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        fmt::Display::fmt(node, f)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at byte {position})")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}
