//! Visibility expression compiler: legacy free text -> DNF rules.
//!
//! Precedence is fixed: OR splits first, AND splits within each OR group,
//! so AND binds tighter. There is no third level. Parenthesized input is
//! rejected with [`ExprError::UnsupportedParentheses`].

use crate::error::ExprError;
use crate::lexer::{
    has_unquoted_parens, normalize_operators, split_outside_quotes, strip_quotes, OperatorTable,
    AND_SEPARATORS, OR_SEPARATORS,
};
use crate::model::{Condition, Operator, Rule, VisibilityExpression};
use serde::{Deserialize, Serialize};

/// Why a piece of expression text did not make it into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Text without an operator that could not be tied to a base condition.
    BareValueUnattached,
    /// An operator with nothing on its left-hand side.
    EmptySourceKey,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::BareValueUnattached => "bare_value_unattached",
            DropReason::EmptySourceKey => "empty_source_key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedFragment {
    pub fragment: String,
    pub reason: DropReason,
}

/// Compiler output together with everything it discarded on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compiled {
    pub expression: VisibilityExpression,
    pub dropped: Vec<DroppedFragment>,
}

/// Compile `raw` into a [`VisibilityExpression`], discarding the audit trail.
pub fn compile_visibility(
    raw: &str,
    operators: &OperatorTable,
) -> Result<VisibilityExpression, ExprError> {
    compile_visibility_audited(raw, operators).map(|c| c.expression)
}

/// Compile `raw`, reporting dropped fragments alongside the expression.
pub fn compile_visibility_audited(
    raw: &str,
    operators: &OperatorTable,
) -> Result<Compiled, ExprError> {
    let mut out = Compiled::default();
    if raw.trim().is_empty() {
        return Ok(out);
    }
    if has_unquoted_parens(raw) {
        return Err(ExprError::UnsupportedParentheses {
            expression: raw.trim().to_owned(),
        });
    }

    let text = normalize_operators(raw, operators).replace(['\r', '\n'], " ");

    let mut rules: Vec<Rule> = Vec::new();
    let mut bare_values: Vec<String> = Vec::new();
    let mut first: Option<(String, Operator)> = None;

    for group in split_outside_quotes(&text, OR_SEPARATORS) {
        let mut conditions = Vec::new();
        for part in split_outside_quotes(&group, AND_SEPARATORS) {
            let Some((left, op, right)) = split_on_operator(&part) else {
                continue;
            };
            let source_key = left.trim();
            if source_key.is_empty() {
                tracing::debug!(fragment = %part, "dropping condition without source key");
                out.dropped.push(DroppedFragment {
                    fragment: part.clone(),
                    reason: DropReason::EmptySourceKey,
                });
                continue;
            }
            if first.is_none() {
                first = Some((source_key.to_owned(), op));
            }
            conditions.push(Condition::new(source_key, op, strip_quotes(right)));
        }

        if !conditions.is_empty() {
            rules.push(Rule::all(conditions));
        } else if !group.trim().is_empty() {
            bare_values.push(strip_quotes(&group).to_owned());
        }
    }

    if !bare_values.is_empty() {
        match &first {
            Some((key, op)) if rules.iter().all(|r| is_single_on(r, key, *op)) => {
                for value in bare_values {
                    rules.push(Rule::all(vec![Condition::new(key.as_str(), *op, value)]));
                }
            }
            _ => {
                for value in bare_values {
                    tracing::debug!(fragment = %value, "dropping unattached bare value");
                    out.dropped.push(DroppedFragment {
                        fragment: value,
                        reason: DropReason::BareValueUnattached,
                    });
                }
            }
        }
    }

    out.expression = VisibilityExpression::from_rules(rules);
    Ok(out)
}

/// Split a part on its comparison operator. `==` is looked for before `!=`.
fn split_on_operator(part: &str) -> Option<(&str, Operator, &str)> {
    for (token, op) in [("==", Operator::Eq), ("!=", Operator::Neq)] {
        if let Some((left, right)) = part.split_once(token) {
            return Some((left, op, right));
        }
    }
    None
}

fn is_single_on(rule: &Rule, key: &str, op: Operator) -> bool {
    rule.single()
        .is_some_and(|c| c.source_key == key && c.operator == op)
}
