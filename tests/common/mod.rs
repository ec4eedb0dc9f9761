#![allow(dead_code)]
//! Shared fixtures for `sift` integration tests.

use sift::*;

/// Sends `RUST_LOG`-filtered events to the test output. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Three text filters: two freetext (one case-sensitive) and one plain.
pub fn text_registry() -> Registry {
    Registry::builder()
        .register(Filter::text("foo_name").with_attr("foo").with_freetext(true))
        .unwrap()
        .register(
            Filter::case_sensitive("bar_name")
                .with_attr("bar")
                .with_freetext(true),
        )
        .unwrap()
        .register(Filter::text("baz_name").with_attr("baz"))
        .unwrap()
        .build()
}

/// Artists by display name, for record lookups.
pub fn artist_pks(name: &str) -> Vec<i64> {
    match name {
        "Dio" => vec![1],
        "Black Sabbath" => vec![2],
        "Rainbow" => vec![3, 4],
        _ => Vec::new(),
    }
}

/// One filter of every shortcut kind.
pub fn album_registry() -> Registry {
    Registry::builder()
        .register(Filter::text("title").with_freetext(true))
        .unwrap()
        .register(Filter::integer("year"))
        .unwrap()
        .register(Filter::float("rating"))
        .unwrap()
        .register(Filter::boolean("live").with_attr("is_live"))
        .unwrap()
        .register(Filter::date("released"))
        .unwrap()
        .register(Filter::date("recorded"))
        .unwrap()
        .register(Filter::time("length"))
        .unwrap()
        .register(Filter::datetime("added"))
        .unwrap()
        .register(Filter::choice("format", ["lp", "cd", "tape"]))
        .unwrap()
        .register(Filter::choice_lookup("artist", artist_pks))
        .unwrap()
        .register(Filter::text("notes").without_attr())
        .unwrap()
        .build()
}

pub fn compile_ok(registry: &Registry, text: &str) -> Predicate {
    init_tracing();
    compile(registry, text).unwrap()
}

pub fn compile_err(registry: &Registry, text: &str) -> QueryError {
    init_tracing();
    compile(registry, text).unwrap_err()
}

pub fn leaf(path: &str, comparison: Comparison, operand: impl Into<Operand>) -> Predicate {
    Predicate::leaf(path, comparison, operand)
}

pub fn text(value: &str) -> Value {
    Value::Str(value.to_string())
}
