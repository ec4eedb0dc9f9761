mod common;
use common::*;
use sift::*;

#[test]
fn unknown_filter_lists_every_name() {
    let err = compile_err(&text_registry(), "nope=1");
    assert_eq!(
        err.to_string(),
        "Unknown filter \"nope\", available filters: bar_name, baz_name, foo_name"
    );
}

#[test]
fn unknown_filter_in_pk_shortcut() {
    let err = compile_err(&text_registry(), "nope.pk=1");
    assert!(matches!(err, QueryError::UnknownFilter { name, .. } if name == "nope"));
}

#[test]
fn unary_use_of_a_binary_filter() {
    let err = compile_err(&text_registry(), "foo_name");
    assert_eq!(
        err.to_string(),
        "\"foo_name\" is not a unary filter, you must use it like \"foo_name=something\""
    );
    assert!(matches!(
        compile_err(&text_registry(), "!foo_name"),
        QueryError::NotUnary { .. }
    ));
}

#[test]
fn freetext_without_freetext_filters() {
    let registry = Registry::builder()
        .register(Filter::integer("year"))
        .unwrap()
        .build();
    let err = compile_err(&registry, "\"1983\"");
    assert_eq!(err.to_string(), "There are no freetext filters available");
}

#[test]
fn pk_shortcut_errors() {
    let registry = text_registry();
    assert_eq!(compile_err(&registry, "foo_name.pk:7"), QueryError::PkOperator);
    assert_eq!(
        compile_err(&registry, "foo_name.pk:7").to_string(),
        "Only = is supported for primary key lookup"
    );
    assert_eq!(
        compile_err(&registry, "foo_name.pk=foo"),
        QueryError::InvalidPk {
            value: "foo".into()
        }
    );
    assert_eq!(
        compile_err(&registry, "foo_name.pk=foo").to_string(),
        "Could not interpret foo as an integer"
    );
}

#[test]
fn unknown_and_ambiguous_record_names() {
    let registry = album_registry();
    assert_eq!(
        compile_err(&registry, "artist=Nobody").to_string(),
        "Unknown value \"Nobody\" for filter \"artist\""
    );
    assert_eq!(
        compile_err(&registry, "artist=Rainbow"),
        QueryError::AmbiguousValue {
            filter: "artist".into(),
            value: "Rainbow".into()
        }
    );
}

#[test]
fn filter_parse_errors_carry_the_message() {
    let registry = album_registry();
    let cases = [
        ("live=9", "9 is not a valid boolean value"),
        ("year=abc", "\"abc\" is not a valid integer"),
        ("released=2014-03-37", "Date 2014-03-37 is out of range"),
        (
            "released>700q",
            "\"700q\" is not a valid relative date. 700 is too big (max is 166).",
        ),
        ("format=vinyl", "vinyl not in available choices"),
    ];
    for (query, message) in cases {
        match compile_err(&registry, query) {
            QueryError::FilterParse { source, .. } => assert_eq!(source.message(), message, "{query}"),
            other => panic!("{query}: expected a parse error, got {other:?}"),
        }
    }
}

#[test]
fn operators_outside_the_filter_table() {
    let registry = album_registry();
    for query in ["year:1", "live>1", "format<lp", "artist>Dio", "released!:today"] {
        assert!(
            matches!(compile_err(&registry, query), QueryError::InvalidOperator { .. }),
            "{query}"
        );
    }
}

#[test]
fn syntax_errors_surface_the_parse_error() {
    let registry = text_registry();
    for (query, message) in [
        ("foo_name=\"abc", "missing closing quote"),
        ("foo_name=", "expected a value after the operator"),
        ("(foo_name=1", "missing closing ')'"),
        ("foo_name=1)", "unbalanced ')'"),
        ("foo_name=1 bar_name=2", "expected 'and' or 'or'"),
        ("??asdadad213124av@$#$#", "unexpected character '?'"),
    ] {
        match compile_err(&registry, query) {
            QueryError::Syntax(err) => assert_eq!(err.message, message, "{query}"),
            other => panic!("{query}: expected a syntax error, got {other:?}"),
        }
    }
}

#[test]
fn nesting_beyond_the_limit_is_a_syntax_error() {
    let registry = text_registry();
    let query = format!("{}foo_name=1{}", "(".repeat(65), ")".repeat(65));
    assert!(matches!(compile_err(&registry, &query), QueryError::Syntax(_)));
    let query = format!("{}foo_name=1{}", "(".repeat(64), ")".repeat(64));
    assert_eq!(
        compile_ok(&registry, &query),
        leaf("foo", Comparison::IExact, text("1"))
    );
}

#[test]
fn errors_are_reported_in_source_order() {
    let registry = text_registry();
    let err = compile_err(&registry, "nope=1 or foo_name.pk=x");
    assert!(matches!(err, QueryError::UnknownFilter { .. }));
}

#[test]
fn oversized_relative_counts_are_value_errors() {
    let registry = album_registry();
    for query in [
        r#"released="-9223372036854775808 days ago""#,
        r#"released>"9223372036854775807 weekdays ago""#,
        "released<-9223372036854775808y",
    ] {
        assert!(
            matches!(compile_err(&registry, query), QueryError::FilterParse { .. }),
            "{query}"
        );
    }
}

#[test]
fn unknown_filter_keeps_the_typed_spelling() {
    let err = compile_err(&text_registry(), "NOPE=1");
    assert_eq!(
        err.to_string(),
        "Unknown filter \"NOPE\", available filters: bar_name, baz_name, foo_name"
    );
}

#[test]
fn freetext_on_a_filter_without_contains_is_a_setup_error() {
    let err = Registry::builder()
        .register(Filter::date("released").with_freetext(true))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Filter \"released\" is searched by freetext but has no ':' operator"
    );
}
