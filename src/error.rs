use sift_syntax::{Operator, ParseError};
use thiserror::Error;

/// Everything that can go wrong turning query text into a [`crate::Predicate`].
///
/// All variants describe bad user input; the caller decides whether to show
/// the message verbatim or fall back to an unfiltered result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Syntax(#[from] ParseError),
    #[error("Unknown filter \"{name}\", available filters: {}", .available.join(", "))]
    UnknownFilter {
        name: String,
        /// Sorted query names of every registered filter.
        available: Vec<String>,
    },
    #[error("\"{name}\" is not a unary filter, you must use it like \"{name}=something\"")]
    NotUnary { name: String },
    #[error("There are no freetext filters available")]
    NoFreetextFilters,
    #[error("Unknown value \"{value}\" for filter \"{filter}\"")]
    UnknownValue { filter: String, value: String },
    #[error("Found more than one object for name \"{value}\" in filter \"{filter}\"")]
    AmbiguousValue { filter: String, value: String },
    #[error("Could not interpret {value} as an integer")]
    InvalidPk { value: String },
    #[error("Only = is supported for primary key lookup")]
    PkOperator,
    #[error("Invalid operator \"{op}\" for filter \"{filter}\"")]
    InvalidOperator { filter: String, op: Operator },
    #[error("Invalid value for filter \"{filter}\": {source}")]
    FilterParse {
        filter: String,
        #[source]
        source: ValueError,
    },
}

/// Rejection from a filter's parse function, carrying a message meant for
/// the person who typed the query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValueError {
    message: String,
}

impl ValueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Mistakes made while assembling a [`crate::Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A filter named \"{0}\" is already registered")]
    DuplicateName(String),
    #[error("Query name \"{0}\" is already used by another filter")]
    DuplicateQueryName(String),
    #[error("\"{0}\" cannot be typed in a query, so it cannot name a filter")]
    InvalidName(String),
    #[error("Filter \"{0}\" is searched by freetext but has no ':' operator")]
    FreetextWithoutContains(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filter_lists_alternatives() {
        let err = QueryError::UnknownFilter {
            name: "nope".into(),
            available: vec!["bar_name".into(), "foo_name".into()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown filter \"nope\", available filters: bar_name, foo_name"
        );
    }

    #[test]
    fn syntax_errors_display_the_parse_error() {
        let err = QueryError::from(ParseError::new("missing closing quote", 4));
        assert_eq!(err.to_string(), "missing closing quote (at byte 4)");
    }

    #[test]
    fn filter_parse_error_keeps_its_source() {
        use std::error::Error as _;

        let err = QueryError::FilterParse {
            filter: "live".into(),
            source: ValueError::new("9 is not a valid boolean value"),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for filter \"live\": 9 is not a valid boolean value"
        );
        assert_eq!(
            err.source().map(|source| source.to_string()),
            Some("9 is not a valid boolean value".to_string())
        );
    }
}
