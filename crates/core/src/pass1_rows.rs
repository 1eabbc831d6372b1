//! Pass 1: Row intake -- exclusion policy, style detection, identifier
//! synthesis, type decision, lookup resolution, visibility compilation,
//! section and order assignment, complex-group collection.
//!
//! Exclusion never fails the run; it only removes a row and counts why.

use crate::compile::compile_visibility_audited;
use crate::config::{contains_any, MappingConfig};
use crate::lexer::OperatorTable;
use crate::model::{ComplexGroup, Field, FieldStyle, FieldType, LookupOption, LookupTable, Validation};
use crate::rows::RowRecord;
use crate::summary::{DroppedExpressionFragment, ExclusionReason, RunSummary, UnsupportedExpression};
use crate::text::{norm_key, slugify, truncate_chars};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const DIVIDER_HINTS: &[&str] = &["title", "divider", "section title", "heading"];
const STATEMENT_HINTS: &[&str] = &["statement", "note", "information", "info"];
const SLUG_MAX: usize = 48;
const DATE_FORMAT: &str = "DD/MM/YYYY";

/// A field together with the source row it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedField {
    pub field: Field,
    pub row: u32,
}

/// Everything Pass 1 collected. Groups are in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intake {
    pub fields: Vec<StagedField>,
    pub groups: Vec<ComplexGroup>,
}

pub fn intake_rows(
    rows: &[RowRecord],
    lookups: &LookupTable,
    config: &MappingConfig,
    summary: &mut RunSummary,
) -> Intake {
    let operators = config.operator_table();
    let mut intake = Intake::default();
    let mut group_pos: HashMap<String, usize> = HashMap::new();

    for row in rows {
        summary.rows_seen += 1;

        let mut label = row.label.clone();
        if let Some(over) = config.label_overrides.get(&row.id) {
            label = over.clone();
        }

        if let Some(reason) = exclusion_for(row, &label, config) {
            summary.exclude(row.row, &row.id, reason);
            continue;
        }

        let style = detect_style(row);
        let key = if row.id.is_empty() && style != FieldStyle::Field {
            synthesize_key(style, &label, &row.reference, row.row)
        } else {
            row.id.clone()
        };

        if style == FieldStyle::Field && (key.is_empty() || label.is_empty()) {
            summary.exclude(row.row, &key, ExclusionReason::MissingIdOrLabel);
            continue;
        }

        let mut field = Field::new(key.as_str(), label.as_str(), style);

        if style == FieldStyle::Field {
            let (field_type, lookup_name) = decide_type(row, lookups, config);
            field.field_type = Some(field_type);
            if field_type.has_options() {
                match resolve_options(&lookup_name, lookups, config) {
                    Some(options) => field.options = options,
                    None => {
                        tracing::warn!(
                            key = %key,
                            lookup = %lookup_name,
                            "lookup not found, emitting empty options"
                        );
                        summary.unresolved_lookups.push(key.clone());
                    }
                }
            }
            field.validation = validation_for(row, field_type, config);
        }

        if !row.help.is_empty() {
            field.description = Some(row.help.clone());
        }
        if !row.stage.is_empty() {
            field.stage = Some(row.stage.clone());
        }
        if contains_any(&label, &config.internal_label_contains) {
            field.internal = true;
        }

        compile_row_visibility(&mut field, &row.visibility, &operators, summary);

        let (order, order_code) = parse_order(&row.order);
        field.order = config.order_overrides.get(&key).copied().or(order);
        field.section = assign_section(row, &key, &label, order_code.as_deref(), config);

        let reference = if row.reference.is_empty() {
            row.row.to_string()
        } else {
            row.reference.clone()
        };
        field.script_id = Some(format!("ROW:{}|KEY:{}", reference, key));

        if !row.complex.is_empty() {
            let pos = *group_pos.entry(row.complex.clone()).or_insert_with(|| {
                intake.groups.push(ComplexGroup {
                    key: row.complex.clone(),
                    children: Vec::new(),
                    title_field: (!row.complex_identifier.is_empty())
                        .then(|| row.complex_identifier.clone()),
                });
                intake.groups.len() - 1
            });
            intake.groups[pos].children.push(key.clone());
        }

        summary.included += 1;
        intake.fields.push(StagedField { field, row: row.row });
    }

    intake
}

fn exclusion_for(row: &RowRecord, label: &str, config: &MappingConfig) -> Option<ExclusionReason> {
    let filter_miss = config.filters.iter().any(|(header, want)| {
        row.filter_cells
            .get(header)
            .map(|v| v.trim() != want.trim())
            .unwrap_or(true)
    });
    if filter_miss {
        return Some(ExclusionReason::FilterMismatch);
    }
    if config.exclude.action_matches(&row.action) {
        return Some(ExclusionReason::ActionPattern);
    }
    if config.normalization.is_yes(&row.internal) {
        return Some(ExclusionReason::InternalFlag);
    }
    if config.normalization.is_yes(&row.system) {
        return Some(ExclusionReason::SystemFlag);
    }
    if config.exclude.label_matches(label) {
        return Some(ExclusionReason::LabelPattern);
    }
    None
}

fn detect_style(row: &RowRecord) -> FieldStyle {
    let ft = row.field_type.to_lowercase();
    let dt = row.data_type.to_lowercase();
    let hinted = |hints: &[&str]| hints.contains(&ft.as_str()) || hints.contains(&dt.as_str());
    if hinted(DIVIDER_HINTS) {
        FieldStyle::Divider
    } else if hinted(STATEMENT_HINTS) {
        FieldStyle::Statement
    } else {
        FieldStyle::Field
    }
}

/// Deterministic key for a divider or statement row without an id.
fn synthesize_key(style: FieldStyle, label: &str, reference: &str, row: u32) -> String {
    let prefix = style.key_prefix();
    if !label.is_empty() {
        format!("{}_{}", prefix, truncate_chars(&slugify(label), SLUG_MAX))
    } else if !reference.is_empty() {
        format!("{}_row_{}", prefix, slugify(reference))
    } else {
        format!("{}_row_{}", prefix, row)
    }
}

/// The field type and the lookup name its options come from.
fn decide_type(row: &RowRecord, lookups: &LookupTable, config: &MappingConfig) -> (FieldType, String) {
    let raw_dt = row.data_type.trim();
    if row.lookup_type.is_empty()
        && !raw_dt.is_empty()
        && (lookups.contains_key(raw_dt) || config.fallback_lookups.contains_key(raw_dt))
    {
        return (FieldType::Lookup, raw_dt.to_owned());
    }

    let dt = config.normalization.canonical_data_type(raw_dt);
    let field_type = match dt.as_str() {
        "complex" => FieldType::Complex,
        "lookup" => FieldType::Lookup,
        "enum" => FieldType::Enum,
        "freetext" | "free text" => FieldType::FreeText,
        "date" => FieldType::Date,
        "number" | "integer" | "decimal" => {
            if dt == "decimal" || config.normalization.has_decimal_hint(&row.field_length) {
                FieldType::Decimal
            } else {
                FieldType::Integer
            }
        }
        "" | "string" | "text" if !row.lookup_type.is_empty() => FieldType::Lookup,
        _ => FieldType::String,
    };
    (field_type, row.lookup_type.clone())
}

/// Exact name, configured fallback, normalized name, then yes/no shorthand.
/// Options for a lookup name, unique by value; the first spelling wins.
fn resolve_options(name: &str, lookups: &LookupTable, config: &MappingConfig) -> Option<Vec<LookupOption>> {
    let mut options = find_options(name, lookups, config)?;
    let mut seen = HashSet::new();
    options.retain(|o| seen.insert(o.value.clone()));
    Some(options)
}

fn find_options(name: &str, lookups: &LookupTable, config: &MappingConfig) -> Option<Vec<LookupOption>> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    if let Some(options) = lookups.get(name) {
        return Some(options.clone());
    }
    if let Some(options) = config.fallback_options(name) {
        return Some(options);
    }
    let wanted = norm_key(name);
    if let Some((_, options)) = lookups.iter().find(|(k, _)| norm_key(k) == wanted) {
        return Some(options.clone());
    }
    let yn = name.to_lowercase().replace(' ', "").replace(['-', '\\'], "/");
    if yn == "yes/no" || yn == "yesno" {
        return Some(vec![LookupOption::same("Yes"), LookupOption::same("No")]);
    }
    None
}

fn validation_for(row: &RowRecord, field_type: FieldType, config: &MappingConfig) -> Validation {
    let pattern = match row.regex.trim() {
        "" => None,
        p => match Regex::new(p) {
            Ok(_) => Some(p.to_owned()),
            Err(err) => {
                tracing::debug!(row = row.row, pattern = p, %err, "ignoring invalid pattern");
                None
            }
        },
    };
    Validation {
        required: config.normalization.is_yes(&row.mandatory),
        pattern,
        date_format: (field_type == FieldType::Date).then(|| DATE_FORMAT.to_owned()),
    }
}

fn compile_row_visibility(
    field: &mut Field,
    raw: &str,
    operators: &OperatorTable,
    summary: &mut RunSummary,
) {
    match compile_visibility_audited(raw, operators) {
        Ok(compiled) => {
            field.visibility = compiled.expression;
            for dropped in compiled.dropped {
                summary.dropped_fragments.push(DroppedExpressionFragment {
                    key: field.key.clone(),
                    fragment: dropped.fragment,
                    reason: dropped.reason,
                });
            }
        }
        Err(err) => {
            tracing::warn!(key = %field.key, %err, "visibility left unconditional");
            summary.unsupported_expressions.push(UnsupportedExpression {
                key: field.key.clone(),
                expression: raw.trim().to_owned(),
                reason: err.to_string(),
            });
        }
    }
}

fn order_pattern() -> Option<&'static Regex> {
    static ORDER: OnceLock<Option<Regex>> = OnceLock::new();
    ORDER
        .get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*-\s*(.+?)(?:\s*\(.*\))?$").ok())
        .as_ref()
}

/// Parse an order cell: `"12"`, `"12.5 - B4"`, `"12 - B4 (moved)"`.
/// Zero means unordered.
pub fn parse_order(text: &str) -> (Option<f64>, Option<String>) {
    let text = text.trim();
    if text.is_empty() {
        return (None, None);
    }
    let (number, code) = match order_pattern().and_then(|re| re.captures(text)) {
        Some(caps) => (
            caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()),
            caps.get(2).map(|m| m.as_str().trim().to_owned()),
        ),
        None => (text.parse::<f64>().ok().filter(|n| n.is_finite()), None),
    };
    match number {
        Some(n) if n == 0.0 => (None, code),
        other => (other, code),
    }
}

fn assign_section(
    row: &RowRecord,
    key: &str,
    label: &str,
    order_code: Option<&str>,
    config: &MappingConfig,
) -> String {
    let sections = &config.sections;
    if let Some(code) = sections.by_field.get(key) {
        return sections.expand(code);
    }
    if !row.section.is_empty() {
        return sections
            .override_for(&row.section)
            .unwrap_or(&row.section)
            .to_owned();
    }
    if let Some(code) = order_code.filter(|c| !c.is_empty()) {
        return sections.expand(code);
    }
    if let Some(section) = sections.for_label(label) {
        return section.to_owned();
    }
    config.defaults.section.clone()
}
