#![allow(dead_code)]
//! Shared helpers for `sift-syntax` integration tests.

use sift_syntax::*;

pub fn parse_ok(input: &str) -> Vec<Node> {
    parse_query(input).unwrap().nodes
}

pub fn parse_err(input: &str) -> ParseError {
    parse_query(input).unwrap_err()
}

pub fn as_group(node: &Node) -> &Vec<Node> {
    match node {
        Node::Group(nodes) => nodes,
        other => panic!("expected Group, got: {other:?}"),
    }
}

pub fn as_statement(node: &Node) -> &Statement {
    match node {
        Node::Statement(statement) => statement,
        other => panic!("expected Statement, got: {other:?}"),
    }
}

pub fn connective_is(node: &Node, expected: Connective) {
    match node {
        Node::Connective(c) => assert_eq!(*c, expected),
        other => panic!("expected Connective, got: {other:?}"),
    }
}

pub fn binary_is(node: &Node, name: &str, op: Operator, rhs: &Literal) {
    match as_statement(node) {
        Statement::Binary {
            name: actual_name,
            op: actual_op,
            rhs: actual_rhs,
        } => {
            assert_eq!(actual_name, name);
            assert_eq!(*actual_op, op);
            assert_eq!(actual_rhs, rhs);
        }
        other => panic!("expected Binary, got: {other:?}"),
    }
}

pub fn unary_is(node: &Node, name: &str, negated: bool) {
    match as_statement(node) {
        Statement::Unary {
            name: actual_name,
            negated: actual_negated,
        } => {
            assert_eq!(actual_name, name);
            assert_eq!(*actual_negated, negated);
        }
        other => panic!("expected Unary, got: {other:?}"),
    }
}

pub fn freetext_is(node: &Node, expected: &str) {
    match as_statement(node) {
        Statement::Freetext(text) => assert_eq!(text, expected),
        other => panic!("expected Freetext, got: {other:?}"),
    }
}

pub fn raw(text: &str) -> Literal {
    Literal::Str(text.to_string())
}

pub fn quoted(text: &str) -> Literal {
    Literal::Quoted(text.to_string())
}
