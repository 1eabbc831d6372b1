//! C2 — Condition values against controller options.
//!
//! For `lookup`/`enum` controllers, a condition value must name one of the
//! controller's options by value or label. Yes/no spellings are normalized
//! first so `Y`, `true` and `yes` all match a `Yes` option.
//!
//! Independently, a purely numeric value on a non-numeric controller is
//! flagged: it usually means a sheet compared against an option index
//! instead of the option text.

use formlift_core::{Field, FieldType, FormSchema};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// A condition value that is not among the controller's options.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OptionMismatch {
    pub field: String,
    pub source_key: String,
    pub value: String,
    /// Canonical option values of the controller, for display.
    pub expected: Vec<String>,
}

/// A numeric condition value on a non-numeric controller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SuspiciousNumeric {
    pub field: String,
    pub source_key: String,
    pub value: String,
}

/// Aggregated C2 result.
#[derive(Debug, Clone, Serialize)]
pub struct C2Result {
    pub option_mismatches: Vec<OptionMismatch>,
    pub suspicious_numeric: Vec<SuspiciousNumeric>,
}

/// `y`/`true` -> `yes`, `n`/`false` -> `no`, anything else lowercased.
pub fn normalize_boolean_text(value: &str) -> String {
    let v = value.trim().to_lowercase();
    match v.as_str() {
        "y" | "yes" | "true" => "yes".to_string(),
        "n" | "no" | "false" => "no".to_string(),
        _ => v,
    }
}

/// Digits with an optional fractional part.
pub fn is_plain_number(value: &str) -> bool {
    let v = value.trim();
    let (int, frac) = match v.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (v, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.map_or(true, digits)
}

fn option_spellings(field: &Field) -> BTreeSet<String> {
    field
        .options
        .iter()
        .flat_map(|o| [o.value.as_str(), o.label.as_str()])
        .filter(|s| !s.trim().is_empty())
        .map(normalize_boolean_text)
        .collect()
}

fn is_numeric_type(field: &Field) -> bool {
    matches!(
        field.field_type,
        Some(FieldType::Integer) | Some(FieldType::Decimal)
    )
}

pub fn analyze_options(schema: &FormSchema) -> C2Result {
    let by_key: HashMap<&str, &Field> = schema.fields.iter().map(|f| (f.key.as_str(), f)).collect();
    let mut spellings: HashMap<&str, BTreeSet<String>> = HashMap::new();
    let mut result = C2Result {
        option_mismatches: Vec::new(),
        suspicious_numeric: Vec::new(),
    };

    for field in &schema.fields {
        for cond in field.visibility.conditions() {
            // Unresolved controllers are C1's concern.
            let Some(controller) = by_key.get(cond.source_key.as_str()) else {
                continue;
            };

            if controller.has_options() && !controller.options.is_empty() {
                let known = spellings
                    .entry(controller.key.as_str())
                    .or_insert_with(|| option_spellings(controller));
                if !known.contains(&normalize_boolean_text(&cond.value)) {
                    result.option_mismatches.push(OptionMismatch {
                        field: field.key.clone(),
                        source_key: cond.source_key.clone(),
                        value: cond.value.clone(),
                        expected: controller
                            .options
                            .iter()
                            .map(|o| o.canonical().to_string())
                            .collect(),
                    });
                }
            }

            if !is_numeric_type(controller) && is_plain_number(&cond.value) {
                result.suspicious_numeric.push(SuspiciousNumeric {
                    field: field.key.clone(),
                    source_key: cond.source_key.clone(),
                    value: cond.value.clone(),
                });
            }
        }
    }

    result
}
