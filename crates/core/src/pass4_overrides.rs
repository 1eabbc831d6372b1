//! Pass 4: Visibility overrides from configuration, ANDed onto each field's
//! first rule.

use crate::compile::compile_visibility;
use crate::lexer::OperatorTable;
use crate::pass1_rows::StagedField;
use crate::pass2_index::Index;
use crate::summary::{RunSummary, UnsupportedExpression};
use std::collections::BTreeMap;

pub fn apply_overrides(
    fields: &mut [StagedField],
    overrides: &BTreeMap<String, Vec<String>>,
    index: &Index,
    operators: &OperatorTable,
    summary: &mut RunSummary,
) {
    for (key, exprs) in overrides {
        let Some(pos) = index.position(key) else {
            tracing::debug!(key = %key, "visibility override for unknown field");
            continue;
        };
        let field = &mut fields[pos].field;
        for raw in exprs {
            match compile_visibility(raw, operators) {
                Ok(extra) if !extra.is_unconditional() => field.visibility.merge_into_first(extra),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(key = %key, %err, "visibility override ignored");
                    summary.unsupported_expressions.push(UnsupportedExpression {
                        key: key.clone(),
                        expression: raw.trim().to_owned(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }
}
