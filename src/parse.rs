//! Parse functions backing the built-in filter shortcuts.
//!
//! Every function takes the raw text exactly as it appeared in the query and
//! returns a [`ValueError`] with a message aimed at the person who typed it.
//! Date-aware parsers come in two flavours: one reading the system clock and
//! an `_at` variant taking the reference point explicitly.

use crate::{Value, ValueError};
use jiff::{
    Span, Timestamp,
    civil::{Date, DateTime, Time},
    tz::TimeZone,
};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &str = r#""%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H""#;
const TIME_FORMATS: &str = r#""%H:%M:%S", "%H:%M", "%H""#;

const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

static DECIMAL_REGEX: OnceLock<Regex> = OnceLock::new();
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

const WEEKDAY_UNITS: [&str; 6] = ["wd", "weekday", "weekdays", "bd", "bankday", "bankdays"];
const DAY_UNITS: [&str; 3] = ["d", "day", "days"];
const WEEK_UNITS: [&str; 4] = ["w", "wk", "week", "weeks"];
const MONTH_UNITS: [&str; 5] = ["m", "mo", "mon", "month", "months"];
const QUARTER_UNITS: [&str; 3] = ["q", "quarter", "quarters"];
const YEAR_UNITS: [&str; 4] = ["y", "yr", "year", "years"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Weekday,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

// Suffixes are tried in this order and the first match wins, so `bd` is a
// bank day rather than `b` followed by the day unit.
const UNITS: [(&[&str], Unit); 6] = [
    (&WEEKDAY_UNITS, Unit::Weekday),
    (&DAY_UNITS, Unit::Day),
    (&WEEK_UNITS, Unit::Week),
    (&MONTH_UNITS, Unit::Month),
    (&QUARTER_UNITS, Unit::Quarter),
    (&YEAR_UNITS, Unit::Year),
];

pub fn parse_text(text: &str) -> Result<Value, ValueError> {
    Ok(Value::Str(text.to_string()))
}

pub fn parse_int(text: &str) -> Result<Value, ValueError> {
    text.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| ValueError::new(format!("\"{text}\" is not a valid integer")))
}

pub fn parse_float(text: &str) -> Result<Value, ValueError> {
    text.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ValueError::new(format!("could not convert string to float: {text}")))
}

fn decimal_regex() -> &'static Regex {
    DECIMAL_REGEX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$")
            .expect("decimal pattern is valid")
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(concat!(
            r"^[-!#$%&'*+/=?^_`{}|~0-9A-Za-z]+(?:\.[-!#$%&'*+/=?^_`{}|~0-9A-Za-z]+)*",
            r"@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
        ))
        .expect("email pattern is valid")
    })
}

/// Exact decimal such as `12.50`, `-.5` or `1e3`, kept verbatim.
pub fn parse_decimal(text: &str) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    if decimal_regex().is_match(trimmed) {
        Ok(Value::Decimal(trimmed.to_string()))
    } else {
        Err(ValueError::new(format!("Invalid literal for Decimal: '{text}'")))
    }
}

pub fn parse_email(text: &str) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    if trimmed.len() <= 320 && email_regex().is_match(trimmed) {
        Ok(Value::Str(trimmed.to_string()))
    } else {
        Err(ValueError::new("Enter a valid email address."))
    }
}

/// An absolute `http`, `https`, `ftp` or `ftps` URL with a host.
pub fn parse_url(text: &str) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    match Url::parse(trimmed) {
        Ok(url) if URL_SCHEMES.contains(&url.scheme()) && url.host_str().is_some() => {
            Ok(Value::Str(trimmed.to_string()))
        }
        _ => Err(ValueError::new("Enter a valid URL.")),
    }
}

/// Like [`parse_bool`], but empty text stands for "unknown" and comes back
/// as an empty string.
pub fn parse_tristate(text: &str) -> Result<Value, ValueError> {
    if text.trim().is_empty() {
        return Ok(Value::Str(String::new()));
    }
    parse_bool(text)
}

/// Accepts `1 true t yes y on` and `0 false f no n off` in any case.
pub fn parse_bool(text: &str) -> Result<Value, ValueError> {
    match text.to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(Value::Bool(true)),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(Value::Bool(false)),
        _ => Err(ValueError::new(format!("{text} is not a valid boolean value"))),
    }
}

pub fn parse_date(text: &str) -> Result<Value, ValueError> {
    parse_date_at(text, now().date())
}

/// `YYYY-MM-DD`, or a relative date resolved against `today`.
pub fn parse_date_at(text: &str, today: Date) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    if let Ok(date) = Date::strptime(DATE_FORMAT, trimmed) {
        return Ok(Value::Date(date));
    }
    if looks_like_iso_date(trimmed) {
        return Err(ValueError::new(format!("Date {trimmed} is out of range")));
    }
    match parse_relative_date(trimmed, today)? {
        Some(date) => Ok(Value::Date(date)),
        None => Err(ValueError::new(format!(
            "Time data \"{text}\" does not match any of the formats \"now\", \"{DATE_FORMAT}\", \
             and is not a relative date like \"2d\" or \"2 weeks ago\""
        ))),
    }
}

pub fn parse_datetime(text: &str) -> Result<Value, ValueError> {
    parse_datetime_at(text, now())
}

/// `YYYY-MM-DD HH[:MM[:SS]]` (a `T` separator works too), a bare date meaning
/// midnight, or a relative date combined with the time of day in `now`.
pub fn parse_datetime_at(text: &str, now: DateTime) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    if let Some(datetime) = parse_absolute_datetime(trimmed) {
        return Ok(Value::DateTime(datetime));
    }
    if looks_like_iso_date(trimmed) {
        return Err(ValueError::new(format!("Date {trimmed} is out of range")));
    }
    match parse_relative_date(trimmed, now.date())? {
        Some(date) => Ok(Value::DateTime(date.to_datetime(now.time()))),
        None => Err(ValueError::new(format!(
            "Time data \"{text}\" does not match any of the formats \"now\", {DATETIME_FORMATS}, \
             and is not a relative date like \"2d\" or \"2 weeks ago\""
        ))),
    }
}

pub fn parse_time(text: &str) -> Result<Value, ValueError> {
    parse_time_at(text, now().time())
}

/// `HH[:MM[:SS]]`, or `now`.
pub fn parse_time_at(text: &str, now: Time) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("now") {
        return Ok(Value::Time(now));
    }
    parse_clock(trimmed).map(Value::Time).ok_or_else(|| {
        ValueError::new(format!(
            "Time data \"{text}\" does not match any of the formats \"now\" or {TIME_FORMATS}"
        ))
    })
}

/// Resolves expressions such as `today`, `3d`, `2 weeks ago` or `1q` against
/// `today`.
///
/// Returns `Ok(None)` when the text does not end in a known unit, so callers
/// can fall back to their own error message. Month, quarter and year steps
/// clamp to the last day of the target month; weekday steps skip Saturdays
/// and Sundays.
pub fn parse_relative_date(text: &str, today: Date) -> Result<Option<Date>, ValueError> {
    let mut period = text.trim().to_lowercase();
    match period.as_str() {
        "today" | "now" => period = "0d".to_string(),
        "yesterday" => period = "-1d".to_string(),
        "tomorrow" => period = "1d".to_string(),
        _ => {}
    }

    let mut negate = false;
    if let Some(rest) = period.strip_suffix("ago") {
        let rest = rest.trim();
        period = rest.strip_suffix('_').unwrap_or(rest).to_string();
        negate = true;
    }

    let Some((count_text, unit)) = split_unit(&period) else {
        return Ok(None);
    };
    let typed: i64 = count_text.trim().parse().map_err(|_| {
        ValueError::new(format!(
            "\"{text}\" is not a valid relative date. \"{count_text}\" is not an integer."
        ))
    })?;
    // Widened so `i64::MIN ago` cannot overflow.
    let wide = if negate {
        -i128::from(typed)
    } else {
        i128::from(typed)
    };

    let too_big = |max: i64| {
        ValueError::new(format!(
            "\"{text}\" is not a valid relative date. {wide} is too big (max is {max})."
        ))
    };
    let out_of_range =
        || ValueError::new(format!("\"{text}\" is not a valid relative date. It is out of range."));

    let limit: i64 = match unit {
        Unit::Day | Unit::Weekday => 9999,
        Unit::Week => 1999,
        Unit::Month => 499,
        Unit::Quarter => 166,
        Unit::Year => 399,
    };
    if wide.unsigned_abs() > u128::from(limit.unsigned_abs()) {
        return Err(too_big(limit));
    }
    let count = i64::try_from(wide).map_err(|_| too_big(limit))?;

    let date = match unit {
        Unit::Day => shift_days(today, count),
        Unit::Week => shift_days(today, count * 7),
        Unit::Month => shift_months(today, count),
        Unit::Quarter => shift_months(today, count * 3),
        Unit::Year => shift_months(today, count * 12),
        Unit::Weekday => shift_weekdays(today, count),
    };
    date.map(Some).ok_or_else(out_of_range)
}

fn split_unit(period: &str) -> Option<(&str, Unit)> {
    UNITS.iter().find_map(|(suffixes, unit)| {
        suffixes
            .iter()
            .find_map(|suffix| period.strip_suffix(suffix))
            .map(|rest| (rest, *unit))
    })
}

fn shift_days(date: Date, delta: i64) -> Option<Date> {
    if delta == 0 {
        return Some(date);
    }
    let span = Span::new().try_days(delta).ok()?;
    date.checked_add(span).ok()
}

fn shift_months(date: Date, delta: i64) -> Option<Date> {
    let index = i64::from(date.year()) * 12 + i64::from(date.month() - 1) + delta;
    let year = i16::try_from(index.div_euclid(12)).ok()?;
    let month = i8::try_from(index.rem_euclid(12) + 1).ok()?;
    let first = Date::new(year, month, 1).ok()?;
    let day = date.day().min(first.days_in_month());
    Date::new(year, month, day).ok()
}

// Whole weeks first, then leftover days; landing on a weekend or wrapping
// past Friday costs two extra days.
fn shift_weekdays(date: Date, count: i64) -> Option<Date> {
    let weeks = count.div_euclid(5);
    let days = count.rem_euclid(5);
    let mut current = date;
    let mut weekday = current.weekday().to_monday_zero_offset();
    if weekday >= 5 {
        current = shift_days(current, -i64::from(weekday - 4))?;
        weekday = 4;
    }
    current = shift_days(current, weeks * 7 + days)?;
    let landed = current.weekday().to_monday_zero_offset();
    if landed >= 5 || landed < weekday {
        current = shift_days(current, 2)?;
    }
    Some(current)
}

fn parse_absolute_datetime(text: &str) -> Option<DateTime> {
    let (date_part, time_part) = match text.split_once([' ', 'T']) {
        Some((date_part, time_part)) => (date_part, Some(time_part.trim_start())),
        None => (text, None),
    };
    let date = Date::strptime(DATE_FORMAT, date_part).ok()?;
    let time = match time_part {
        Some(clock) => parse_clock(clock)?,
        None => Time::midnight(),
    };
    Some(date.to_datetime(time))
}

// `HH`, `HH:MM` or `HH:MM:SS[.fff]`, one or two digits per field and up to
// nine fractional digits.
fn parse_clock(text: &str) -> Option<Time> {
    let (clock, nanos) = match text.split_once('.') {
        Some((clock, fraction)) => (clock, parse_fraction(fraction)?),
        None => (text, 0),
    };
    let mut fields = [0i8; 3];
    let mut count = 0;
    for part in clock.split(':') {
        if count == fields.len() || part.is_empty() || part.len() > 2 {
            return None;
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        fields[count] = part.parse().ok()?;
        count += 1;
    }
    // A fraction only makes sense after the seconds.
    if nanos != 0 && count != 3 {
        return None;
    }
    Time::new(fields[0], fields[1], fields[2], nanos).ok()
}

fn parse_fraction(fraction: &str) -> Option<i32> {
    if fraction.is_empty() || fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: i32 = fraction.parse().ok()?;
    Some(digits * 10i32.pow(9 - fraction.len() as u32))
}

/// Clock text for query literals: `HH:MM:SS`, plus the fraction of a second
/// when there is one, without trailing zeros.
pub(crate) fn format_clock(time: Time) -> String {
    let clock = time.strftime("%H:%M:%S").to_string();
    match time.subsec_nanosecond() {
        0 => clock,
        nanos => {
            let fraction = format!("{nanos:09}");
            format!("{clock}.{}", fraction.trim_end_matches('0'))
        }
    }
}

fn looks_like_iso_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

fn now() -> DateTime {
    Timestamp::now().to_zoned(TimeZone::system()).datetime()
}
