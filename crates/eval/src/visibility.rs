//! Visibility evaluation over compiled DNF rules.
//!
//! Values are compared as canonical text: conversion already rewrote rule
//! values to option spellings, so evaluation is plain case-insensitive
//! equality with no synonym handling.

use crate::answers::Answers;
use formlift_core::{Condition, FormSchema, Operator, VisibilityExpression};
use std::collections::HashSet;

/// `EQ` holds when the answer matches; `NEQ` is its negation. A missing
/// answer fails `EQ` and satisfies `NEQ`.
pub fn condition_holds(condition: &Condition, answers: &Answers) -> bool {
    let matched = answers
        .get(&condition.source_key)
        .is_some_and(|a| a.matches(&condition.value));
    match condition.operator {
        Operator::Eq => matched,
        Operator::Neq => !matched,
    }
}

/// Empty means always visible; otherwise any rule whose conditions all hold.
pub fn expression_visible(expr: &VisibilityExpression, answers: &Answers) -> bool {
    expr.is_unconditional()
        || expr
            .rules()
            .iter()
            .any(|rule| rule.conditions.iter().all(|c| condition_holds(c, answers)))
}

/// Keys of the visible fields, in schema order.
///
/// Answers given to hidden fields do not count, so visibility is iterated
/// until it stops changing. Answers for keys outside the schema are always
/// kept.
pub fn visible_fields(schema: &FormSchema, answers: &Answers) -> Vec<String> {
    let known: HashSet<&str> = schema.fields.iter().map(|f| f.key.as_str()).collect();
    let mut visible: HashSet<&str> = known.clone();

    for round in 0..=schema.fields.len() {
        let effective = answers.retain_keys(|k| !known.contains(k) || visible.contains(k));
        let next: HashSet<&str> = schema
            .fields
            .iter()
            .filter(|f| expression_visible(&f.visibility, &effective))
            .map(|f| f.key.as_str())
            .collect();
        if next == visible {
            tracing::debug!(rounds = round + 1, visible = next.len(), "visibility settled");
            break;
        }
        visible = next;
    }

    schema
        .fields
        .iter()
        .filter(|f| visible.contains(f.key.as_str()))
        .map(|f| f.key.clone())
        .collect()
}
