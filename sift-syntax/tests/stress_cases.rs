mod common;
use common::*;
use sift_syntax::*;

#[test]
fn long_connective_chains_stay_flat() {
    let query: Vec<String> = (0..500).map(|i| format!("f{i}={i}")).collect();
    let nodes = parse_ok(&query.join(" and "));
    assert_eq!(nodes.len(), 999);
    for (i, node) in nodes.iter().enumerate() {
        if i % 2 == 1 {
            connective_is(node, Connective::And);
        }
    }
    binary_is(&nodes[998], "f499", Operator::Eq, &raw("499"));
}

#[test]
fn default_depth_limit_accepts_sixty_four_levels() {
    let q = format!("{}a=1{}", "(".repeat(64), ")".repeat(64));
    let mut nodes = parse_ok(&q);
    for _ in 0..64 {
        assert_eq!(nodes.len(), 1);
        nodes = as_group(&nodes[0]).clone();
    }
    binary_is(&nodes[0], "a", Operator::Eq, &raw("1"));
}

#[test]
fn deep_nesting_is_rejected_without_overflowing() {
    let q = format!("{}a=1{}", "(".repeat(100_000), ")".repeat(100_000));
    let options = ParseOptions {
        max_length: usize::MAX,
        ..ParseOptions::default()
    };
    let err = parse_query_with(&q, &options).unwrap_err();
    assert_eq!(err.message, "query nests deeper than 64 levels");
    assert_eq!(err.position, 64);
}

#[test]
fn oversized_input_is_rejected_before_parsing() {
    let q = "a".repeat(64 * 1024 + 1);
    let err = parse_err(&q);
    assert_eq!(err.position, 64 * 1024);
}

#[test]
fn whitespace_variants_separate_tokens() {
    let nodes = parse_ok("a=1\tand\nb = 2\r\nor  c");
    assert_eq!(nodes.len(), 5);
    connective_is(&nodes[1], Connective::And);
    binary_is(&nodes[2], "b", Operator::Eq, &raw("2"));
    connective_is(&nodes[3], Connective::Or);
    unary_is(&nodes[4], "c", false);
}

#[test]
fn unterminated_quote_after_escape() {
    let err = parse_err(r#"a="abc\""#);
    assert_eq!(err.message, "missing closing quote");
    assert_eq!(err.position, 2);
}

#[test]
fn multibyte_text_reports_byte_positions() {
    let err = parse_err("a=Åsa b");
    assert_eq!(err.position, 7);
}
