//! Folds a flat `predicate (connective predicate)*` sequence into one tree.
//!
//! A shunting-yard pass turns the sequence into reverse Polish notation and a
//! stack machine combines it. `and` binds tighter than `or`; equal
//! precedence associates to the left.

use crate::Predicate;
use sift_syntax::Connective;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Predicate(Predicate),
    Connective(Connective),
}

pub(crate) fn resolve(mut items: Vec<Item>) -> Predicate {
    if items.len() == 1 {
        if let Some(Item::Predicate(predicate)) = items.pop() {
            return predicate;
        }
        panic!("a lone connective cannot be resolved");
    }
    evaluate(to_rpn(items))
}

fn to_rpn(items: Vec<Item>) -> Vec<Item> {
    let mut output = Vec::with_capacity(items.len());
    let mut pending: Vec<Connective> = Vec::new();
    for item in items {
        match item {
            Item::Predicate(_) => output.push(item),
            Item::Connective(connective) => {
                // Pop before push keeps equal precedence left-associative.
                while let Some(&top) = pending.last() {
                    if top.precedence() < connective.precedence() {
                        break;
                    }
                    pending.pop();
                    output.push(Item::Connective(top));
                }
                pending.push(connective);
            }
        }
    }
    output.extend(pending.into_iter().rev().map(Item::Connective));
    output
}

fn evaluate(rpn: Vec<Item>) -> Predicate {
    let mut stack: Vec<Predicate> = Vec::new();
    for item in rpn {
        match item {
            Item::Predicate(predicate) => stack.push(predicate),
            Item::Connective(connective) => {
                let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                    panic!("`{connective}` is missing an operand");
                };
                stack.push(match connective {
                    Connective::And => lhs.and(rhs),
                    Connective::Or => lhs.or(rhs),
                });
            }
        }
    }
    assert_eq!(stack.len(), 1, "unbalanced predicate sequence");
    stack.pop().unwrap_or_default()
}
