use crate::{Connective, Literal, Node, Operator, ParseError, ParseOptions, Query, Statement};

/// Every operator spelling, two-character lexemes first so `>=` never lexes as
/// `>` followed by a value starting with `=`.
pub(crate) const OPERATOR_LEXEMES: [(&str, Operator); 10] = [
    ("=>", Operator::Gte),
    ("=<", Operator::Lte),
    (">=", Operator::Gte),
    ("<=", Operator::Lte),
    ("!=", Operator::NotEq),
    ("!:", Operator::NotContains),
    ("=", Operator::Eq),
    ("<", Operator::Lt),
    (">", Operator::Gt),
    (":", Operator::Contains),
];

const KEYWORDS: [&str; 2] = ["and", "or"];

pub(crate) struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            options,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Query, ParseError> {
        if self.input.len() > self.options.max_length {
            return Err(ParseError::new(
                format!(
                    "query exceeds the maximum length of {} bytes",
                    self.options.max_length
                ),
                self.options.max_length,
            ));
        }
        self.skip_ws();
        if self.eof() {
            return Ok(Query { nodes: Vec::new() });
        }
        let nodes = self.parse_expression()?;
        // parse_expression only stops early on a closing paren.
        if !self.eof() {
            return Err(self.error("unbalanced ')'"));
        }
        Ok(Query { nodes })
    }

    // condition (connective condition)*, stopping at end of input or `)`.
    fn parse_expression(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = vec![self.parse_condition()?];
        loop {
            self.skip_ws();
            if self.eof() || self.peek_char() == Some(')') {
                break;
            }
            let connective = if self.consume_keyword("and") {
                Connective::And
            } else if self.consume_keyword("or") {
                Connective::Or
            } else {
                return Err(self.error("expected 'and' or 'or'"));
            };
            nodes.push(Node::Connective(connective));
            nodes.push(self.parse_condition()?);
        }
        Ok(nodes)
    }

    fn parse_condition(&mut self) -> Result<Node, ParseError> {
        self.skip_ws();
        let Some(ch) = self.peek_char() else {
            return Err(self.error("expected a statement"));
        };
        match ch {
            '(' => self.parse_group(),
            '"' => Ok(Node::Statement(Statement::Freetext(self.parse_quoted()?))),
            '!' => {
                self.advance_char();
                self.skip_ws();
                let name = self.parse_identifier()?;
                Ok(Node::Statement(Statement::Unary {
                    name,
                    negated: true,
                }))
            }
            ch if is_identifier_start(ch) => self.parse_statement(),
            ch => Err(self.error(format!("unexpected character '{ch}'"))),
        }
    }

    fn parse_group(&mut self) -> Result<Node, ParseError> {
        let open = self.pos;
        if self.depth >= self.options.max_depth {
            return Err(self.error(format!(
                "query nests deeper than {} levels",
                self.options.max_depth
            )));
        }
        self.advance_char();
        self.depth += 1;
        self.skip_ws();
        if self.peek_char() == Some(')') {
            return Err(self.error("empty parentheses"));
        }
        let nodes = self.parse_expression()?;
        self.depth -= 1;
        if self.peek_char() == Some(')') {
            self.advance_char();
            Ok(Node::Group(nodes))
        } else {
            Err(ParseError::new("missing closing ')'", open))
        }
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        let name = self.parse_identifier()?;
        self.skip_ws();
        let statement = match self.consume_operator() {
            Some(op) => {
                let rhs = self.parse_value()?;
                Statement::Binary { name, op, rhs }
            }
            None => Statement::Unary {
                name,
                negated: false,
            },
        };
        Ok(Node::Statement(statement))
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek_char() {
            Some(ch) if is_identifier_start(ch) => self.advance_char(),
            _ => return Err(self.error("expected a filter name")),
        }
        while let Some(ch) = self.peek_char() {
            if !is_identifier_char(ch) {
                break;
            }
            self.advance_char();
        }
        let name = &self.input[start..self.pos];
        if let Some(keyword) = KEYWORDS.iter().find(|k| name.eq_ignore_ascii_case(k)) {
            return Err(ParseError::new(
                format!("'{keyword}' is a reserved word and cannot name a filter"),
                start,
            ));
        }
        Ok(name.to_string())
    }

    fn consume_operator(&mut self) -> Option<Operator> {
        let rest = self.remaining();
        let (lexeme, op) = OPERATOR_LEXEMES
            .iter()
            .find(|(lexeme, _)| rest.starts_with(lexeme))?;
        self.pos += lexeme.len();
        Some(*op)
    }

    fn parse_value(&mut self) -> Result<Literal, ParseError> {
        self.skip_ws();
        if self.peek_char() == Some('"') {
            return Ok(Literal::Quoted(self.parse_quoted()?));
        }
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !is_raw_value_char(ch) {
                break;
            }
            self.advance_char();
        }
        if start == self.pos {
            return Err(self.error("expected a value after the operator"));
        }
        let raw = &self.input[start..self.pos];
        if raw.eq_ignore_ascii_case("null") {
            Ok(Literal::Null)
        } else {
            Ok(Literal::Str(raw.to_string()))
        }
    }

    // `\"` and `\\` are the only escapes; any other backslash is kept as is.
    fn parse_quoted(&mut self) -> Result<String, ParseError> {
        let quote_pos = self.pos;
        self.advance_char();
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            self.advance_char();
            match ch {
                '"' => return Ok(text),
                '\\' => match self.peek_char() {
                    Some(next @ ('"' | '\\')) => {
                        self.advance_char();
                        text.push(next);
                    }
                    _ => text.push('\\'),
                },
                _ => text.push(ch),
            }
        }
        Err(ParseError::new("missing closing quote", quote_pos))
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.remaining();
        if rest.len() < keyword.len() || !rest.is_char_boundary(keyword.len()) {
            return false;
        }
        if !rest[..keyword.len()].eq_ignore_ascii_case(keyword) {
            return false;
        }
        if let Some(next) = rest[keyword.len()..].chars().next() {
            if is_identifier_char(next) {
                return false;
            }
        }
        self.pos += keyword.len();
        true
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.pos)
    }
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => {}
        _ => return false,
    }
    chars.all(is_identifier_char) && !KEYWORDS.iter().any(|k| text.eq_ignore_ascii_case(k))
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '-' | '.')
}

fn is_raw_value_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '$' | '-' | '.' | '+')
}
