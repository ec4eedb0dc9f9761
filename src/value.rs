use crate::parse::format_clock;
use jiff::civil::{Date, DateTime, Time};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed value produced by a filter's parse function, or bound by the
/// surrounding application for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    /// Exact decimal number, kept as validated text so no precision is lost.
    Decimal(String),
    Bool(bool),
    Date(Date),
    DateTime(DateTime),
    Time(Time),
}

impl Value {
    /// Spelling used when writing this value into query text.
    ///
    /// Numbers are bare, booleans are `1`/`0` and everything else is quoted,
    /// so reading it back never mistakes a value for a filter name or `null`.
    pub fn to_query_literal(&self) -> String {
        match self {
            Value::Str(text) => sift_syntax::quote(text),
            Value::Int(number) => number.to_string(),
            Value::Float(number) => number.to_string(),
            Value::Decimal(number) => number.clone(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::Date(date) => sift_syntax::quote(&date.strftime("%Y-%m-%d").to_string()),
            Value::DateTime(datetime) => sift_syntax::quote(&format!(
                "{} {}",
                datetime.date().strftime("%Y-%m-%d"),
                format_clock(datetime.time())
            )),
            Value::Time(time) => sift_syntax::quote(&format_clock(*time)),
        }
    }

    /// An empty string means "no value" to the serializer.
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Str(text) if text.is_empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(text) => write!(f, "{text:?}"),
            Value::Int(number) => write!(f, "{number}"),
            Value::Float(number) => write!(f, "{number}"),
            Value::Decimal(number) => f.write_str(number),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Date(date) => write!(f, "{date}"),
            Value::DateTime(datetime) => write!(f, "{datetime}"),
            Value::Time(time) => write!(f, "{time}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Str(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Str(text)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Int(number)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Float(number)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<Date> for Value {
    fn from(date: Date) -> Self {
        Value::Date(date)
    }
}

impl From<DateTime> for Value {
    fn from(datetime: DateTime) -> Self {
        Value::DateTime(datetime)
    }
}

impl From<Time> for Value {
    fn from(time: Time) -> Self {
        Value::Time(time)
    }
}
