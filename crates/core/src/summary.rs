//! Per-run summary of everything that was excluded, dropped, or patched.
//! Nothing recorded here aborts a run.

use crate::compile::DropReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    FilterMismatch,
    ActionPattern,
    InternalFlag,
    SystemFlag,
    LabelPattern,
    MissingIdOrLabel,
}

impl ExclusionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionReason::FilterMismatch => "filter_mismatch",
            ExclusionReason::ActionPattern => "action_pattern",
            ExclusionReason::InternalFlag => "internal_flag",
            ExclusionReason::SystemFlag => "system_flag",
            ExclusionReason::LabelPattern => "label_pattern",
            ExclusionReason::MissingIdOrLabel => "missing_id_or_label",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRow {
    pub row: u32,
    pub id: String,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedExpression {
    pub key: String,
    pub expression: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedExpressionFragment {
    pub key: String,
    pub fragment: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub rows_seen: usize,
    pub included: usize,
    pub excluded: usize,
    pub exclusion_reasons: BTreeMap<ExclusionReason, usize>,
    pub excluded_rows: Vec<ExcludedRow>,
    pub unresolved_lookups: Vec<String>,
    pub unsupported_expressions: Vec<UnsupportedExpression>,
    pub dropped_fragments: Vec<DroppedExpressionFragment>,
    pub fields_with_visibility: usize,
    pub synthesized_groups: Vec<String>,
    pub promoted_groups: Vec<String>,
}

impl RunSummary {
    pub fn exclude(&mut self, row: u32, id: &str, reason: ExclusionReason) {
        tracing::debug!(row, id, reason = reason.as_str(), "row excluded");
        self.excluded += 1;
        *self.exclusion_reasons.entry(reason).or_insert(0) += 1;
        self.excluded_rows.push(ExcludedRow {
            row,
            id: id.to_owned(),
            reason,
        });
    }

    pub fn count_for(&self, reason: ExclusionReason) -> usize {
        self.exclusion_reasons.get(&reason).copied().unwrap_or(0)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
