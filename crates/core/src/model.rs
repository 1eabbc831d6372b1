//! Schema data model: conditions, rules, fields, sections, and the emitted
//! form document.
//!
//! Everything here derives `Serialize`/`Deserialize` with camelCase keys so
//! the same types are written by `formlift convert` and read back by the
//! analyzer and evaluator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lookup-type name -> ordered options.
pub type LookupTable = BTreeMap<String, Vec<LookupOption>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Neq,
}

impl Operator {
    /// The canonical infix token for this operator.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Neq => "!=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One comparison: `source_key <op> value`. `value` never carries quote
/// delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub source_key: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    pub fn new(source_key: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Condition {
            source_key: source_key.into(),
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.source_key, self.operator, self.value)
    }
}

/// A conjunction of conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub all_conditions_must_match: bool,
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn all(conditions: Vec<Condition>) -> Self {
        Rule {
            all_conditions_must_match: true,
            conditions,
        }
    }

    /// The lone condition of a single-condition rule.
    pub fn single(&self) -> Option<&Condition> {
        match self.conditions.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// A disjunction of rules (DNF). Empty means always visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityExpression {
    rules: Vec<Rule>,
}

impl VisibilityExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        VisibilityExpression { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_unconditional(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Every condition across every rule, in rule order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.rules.iter().flat_map(|r| r.conditions.iter())
    }

    pub fn conditions_mut(&mut self) -> impl Iterator<Item = &mut Condition> {
        self.rules.iter_mut().flat_map(|r| r.conditions.iter_mut())
    }

    /// AND extra conditions onto the first rule; adopt `extra` wholesale
    /// when this expression has no rules yet.
    pub fn merge_into_first(&mut self, extra: VisibilityExpression) {
        let mut extra_rules = extra.rules.into_iter();
        match self.rules.first_mut() {
            Some(first) => {
                if let Some(head) = extra_rules.next() {
                    first.conditions.extend(head.conditions);
                }
            }
            None => self.rules.extend(extra_rules),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStyle {
    #[default]
    Field,
    Divider,
    Statement,
}

impl FieldStyle {
    /// Key prefix for synthesized identifiers of non-input rows.
    pub fn key_prefix(self) -> &'static str {
        match self {
            FieldStyle::Field => "field",
            FieldStyle::Divider => "title",
            FieldStyle::Statement => "statement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Integer,
    Decimal,
    Date,
    Lookup,
    Enum,
    FreeText,
    Complex,
}

impl FieldType {
    /// Types whose values are drawn from an option set.
    pub fn has_options(self) -> bool {
        matches!(self, FieldType::Lookup | FieldType::Enum)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl LookupOption {
    pub fn same(text: impl Into<String>) -> Self {
        let text = text.into();
        LookupOption {
            value: text.clone(),
            label: text,
        }
    }

    /// The value, or the label when the value is blank.
    pub fn canonical(&self) -> &str {
        if self.value.is_empty() {
            &self.label
        } else {
            &self.value
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

impl Validation {
    pub fn is_empty(&self) -> bool {
        !self.required && self.pattern.is_none() && self.date_format.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub style: FieldStyle,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<LookupOption>,
    #[serde(default)]
    pub visibility: VisibilityExpression,
    #[serde(default)]
    pub section: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Validation::is_empty")]
    pub validation: Validation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub internal: bool,
}

impl Field {
    /// A bare field with no type, options, or conditions.
    pub fn new(key: impl Into<String>, label: impl Into<String>, style: FieldStyle) -> Self {
        Field {
            key: key.into(),
            label: label.into(),
            style,
            field_type: None,
            options: Vec::new(),
            visibility: VisibilityExpression::new(),
            section: String::new(),
            children: Vec::new(),
            title_field: None,
            order: None,
            description: None,
            validation: Validation::default(),
            script_id: None,
            stage: None,
            internal: false,
        }
    }

    pub fn is_conditional(&self) -> bool {
        !self.visibility.is_unconditional()
    }

    pub fn has_options(&self) -> bool {
        self.field_type.is_some_and(FieldType::has_options)
    }
}

/// Build-time aggregate of rows sharing a complex grouping marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexGroup {
    pub key: String,
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,
}

/// An accordion section, possibly holding nested subsections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<Section>,
}

impl Section {
    /// Field keys in traversal order: own fields, then each subsection's.
    pub fn all_field_keys(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        for sub in &self.subsections {
            out.extend(sub.all_field_keys());
        }
        out
    }
}

/// The emitted form document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub key: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub entity: String,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub accordions: Vec<Section>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ComplexGroup>,
}

impl FormSchema {
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}
