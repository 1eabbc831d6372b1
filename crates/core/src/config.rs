//! Mapping configuration: which spreadsheet columns mean what, and every
//! policy table the assembly passes consult.
//!
//! Every section is `#[serde(default)]`, so an empty document is a valid
//! configuration and a partial one only overrides what it names.

use crate::lexer::OperatorTable;
use crate::model::LookupOption;
use crate::text::norm_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub schema: SchemaMeta,
    pub columns: Columns,
    /// Header -> required cell value. Rows that differ are excluded.
    pub filters: BTreeMap<String, String>,
    pub exclude: ExcludeRules,
    pub normalization: Normalization,
    pub defaults: Defaults,
    pub label_overrides: BTreeMap<String, String>,
    /// Field key -> extra expressions ANDed onto the first rule.
    pub visibility_overrides: BTreeMap<String, Vec<String>>,
    /// Canonical value -> synonyms.
    pub value_aliases: BTreeMap<String, Vec<String>>,
    /// Lookup name -> values, used when the lookup table lacks the name.
    pub fallback_lookups: BTreeMap<String, Vec<String>>,
    pub order_overrides: BTreeMap<String, f64>,
    pub internal_label_contains: Vec<String>,
    pub sections: SectionRules,
    pub lookups: LookupColumns,
}

impl MappingConfig {
    pub fn operator_table(&self) -> OperatorTable {
        OperatorTable::with_synonyms(&self.normalization.operators)
    }

    /// Lower-cased synonym -> lower-cased canonical. Each canonical value
    /// maps to itself.
    pub fn alias_table(&self) -> BTreeMap<String, String> {
        let mut table = BTreeMap::new();
        for (canon, synonyms) in &self.value_aliases {
            let canon = canon.trim().to_lowercase();
            table.insert(canon.clone(), canon.clone());
            for syn in synonyms {
                table.insert(syn.trim().to_lowercase(), canon.clone());
            }
        }
        table
    }

    /// `fallback_lookups` as option lists.
    pub fn fallback_options(&self, name: &str) -> Option<Vec<LookupOption>> {
        self.fallback_lookups
            .get(name)
            .map(|values| values.iter().map(LookupOption::same).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaMeta {
    pub key: String,
    pub name: String,
    pub version: String,
    pub entity: Option<String>,
}

impl Default for SchemaMeta {
    fn default() -> Self {
        SchemaMeta {
            key: "form".to_owned(),
            name: "Form".to_owned(),
            version: "0.1.0".to_owned(),
            entity: None,
        }
    }
}

/// Header name per column role. An empty name means the column is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub id: String,
    pub label: String,
    pub data_type: String,
    pub field_type: String,
    pub lookup_type: String,
    pub visibility: String,
    pub section: String,
    pub mandatory: String,
    pub help: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub action: String,
    pub internal: String,
    pub system: String,
    pub complex: String,
    pub complex_identifier: String,
    pub order: String,
    pub stage: String,
    pub regex: String,
    pub field_length: String,
}

impl Default for Columns {
    fn default() -> Self {
        Columns {
            id: "KEYNAME".into(),
            label: "LABEL".into(),
            data_type: "DATA TYPE".into(),
            field_type: "FIELD TYPE".into(),
            lookup_type: "LOOKUP".into(),
            visibility: "VISIBILITY CONDITION".into(),
            section: "SECTION".into(),
            mandatory: "MANDATORY".into(),
            help: "HELP TEXT".into(),
            reference: "REF".into(),
            action: "ACTION".into(),
            internal: "INTERNAL".into(),
            system: "SYSTEM".into(),
            complex: "COMPLEX".into(),
            complex_identifier: "COMPLEX IDENTIFIER".into(),
            order: "QUESTION ORDER".into(),
            stage: "STAGE".into(),
            regex: "REGEX".into(),
            field_length: "FIELD LENGTH".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    pub action_contains: Vec<String>,
    pub label_contains: Vec<String>,
}

impl ExcludeRules {
    pub fn action_matches(&self, action: &str) -> bool {
        contains_any(action, &self.action_contains)
    }

    pub fn label_matches(&self, label: &str) -> bool {
        contains_any(label, &self.label_contains)
    }
}

/// Case-insensitive substring test against a pattern list. Blank patterns
/// never match.
pub(crate) fn contains_any(haystack: &str, patterns: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .any(|p| !p.is_empty() && haystack.contains(&p))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalization {
    pub yes_values: Vec<String>,
    pub operators: BTreeMap<String, String>,
    /// Raw data-type cell -> canonical type name.
    pub data_type: BTreeMap<String, String>,
    pub decimal_hint_patterns: Vec<String>,
}

impl Default for Normalization {
    fn default() -> Self {
        let mut operators = BTreeMap::new();
        operators.insert("<>".to_owned(), "!=".to_owned());
        let mut data_type = BTreeMap::new();
        for (raw, canon) in [
            ("Free Text", "freetext"),
            ("Text Area", "freetext"),
            ("Dropdown", "lookup"),
            ("Numeric", "number"),
            ("Enumeration", "enum"),
        ] {
            data_type.insert(raw.to_owned(), canon.to_owned());
        }
        Normalization {
            yes_values: ["Y", "Yes", "TRUE", "1", "X"].iter().map(|s| s.to_string()).collect(),
            operators,
            data_type,
            decimal_hint_patterns: vec!["decimal".into(), "dp".into(), ",".into()],
        }
    }
}

impl Normalization {
    pub fn is_yes(&self, cell: &str) -> bool {
        let cell = cell.trim();
        !cell.is_empty() && self.yes_values.iter().any(|y| y.trim().eq_ignore_ascii_case(cell))
    }

    /// Map a raw data-type cell through the table and lower-case it.
    pub fn canonical_data_type(&self, raw: &str) -> String {
        let raw = raw.trim();
        self.data_type
            .get(raw)
            .map(String::as_str)
            .unwrap_or(raw)
            .to_lowercase()
    }

    pub fn has_decimal_hint(&self, field_length: &str) -> bool {
        contains_any(field_length, &self.decimal_hint_patterns)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub section: String,
    pub entity: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            section: "General".to_owned(),
            entity: "entity".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCode {
    pub code: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionRules {
    /// Canonical ordering of top-level sections.
    pub order: Vec<SectionCode>,
    /// Label substring -> section name.
    pub by_label: BTreeMap<String, String>,
    /// Field key -> section code.
    pub by_field: BTreeMap<String, String>,
    /// Raw section name -> replacement.
    pub overrides: BTreeMap<String, String>,
}

impl SectionRules {
    pub fn title_for(&self, code: &str) -> Option<&str> {
        self.order
            .iter()
            .find(|s| s.code.eq_ignore_ascii_case(code))
            .map(|s| s.title.as_str())
    }

    /// `"<code> - <title>"` when the code is in the ordering table, else the
    /// bare code.
    pub fn expand(&self, code: &str) -> String {
        match self.title_for(code) {
            Some(title) if !title.is_empty() && title != code => format!("{} - {}", code, title),
            _ => code.to_owned(),
        }
    }

    /// Position of `code` in the ordering table.
    pub fn rank(&self, code: &str) -> Option<usize> {
        self.order
            .iter()
            .position(|s| s.code.eq_ignore_ascii_case(code))
    }

    pub fn override_for(&self, raw: &str) -> Option<&str> {
        self.overrides
            .get(raw)
            .or_else(|| {
                self.overrides
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(raw))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    /// First `by_label` entry whose pattern occurs in the label
    /// (case-insensitive, surrounding `*` ignored).
    pub fn for_label(&self, label: &str) -> Option<&str> {
        let label = label.to_lowercase();
        let label = label.trim_matches('*').trim();
        if let Some((_, section)) = self
            .by_label
            .iter()
            .find(|(pattern, _)| pattern.to_lowercase() == label)
        {
            return Some(section);
        }
        self.by_label
            .iter()
            .find(|(pattern, _)| {
                let p = pattern.trim().to_lowercase();
                !p.is_empty() && label.contains(&p)
            })
            .map(|(_, section)| section.as_str())
    }
}

/// Header names of the lookup-values table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupColumns {
    pub type_column: String,
    pub value_column: String,
    pub label_column: String,
}

impl Default for LookupColumns {
    fn default() -> Self {
        LookupColumns {
            type_column: "type".to_owned(),
            value_column: "value".to_owned(),
            label_column: "label".to_owned(),
        }
    }
}

/// Whether two header names refer to the same column.
pub fn header_matches(header: &str, configured: &str) -> bool {
    let want = norm_key(configured);
    !want.is_empty() && norm_key(header) == want
}
