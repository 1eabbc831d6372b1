//! ConditionsReport — aggregated output from the C1-C3 analyses.
//!
//! The report collects results from each analysis module and extracts
//! findings (warnings, info) for summary display.

use crate::c1_references::C1Result;
use crate::c2_options::C2Result;
use crate::c3_cycles::C3Result;
use serde::Serialize;

/// Severity level for a finding.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum FindingSeverity {
    Info,
    Warning,
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    UnresolvedKey,
    OptionMismatch,
    SuspiciousNumericValue,
    Cycle,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::UnresolvedKey => "unresolved_key",
            FindingKind::OptionMismatch => "option_mismatch",
            FindingKind::SuspiciousNumericValue => "suspicious_numeric_value",
            FindingKind::Cycle => "cycle",
        }
    }
}

/// A notable finding from analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub analysis: String,
    pub kind: FindingKind,
    pub severity: FindingSeverity,
    pub message: String,
    pub field_key: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Totals {
    pub fields: usize,
    pub with_visibility: usize,
    pub findings: usize,
    pub edges: usize,
    pub cycles: usize,
}

/// Aggregated report containing all C1-C3 results and findings.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionsReport {
    pub schema_key: String,
    pub c1_references: Option<C1Result>,
    pub c2_options: Option<C2Result>,
    pub c3_cycles: Option<C3Result>,
    pub analyses_run: Vec<String>,
    pub findings: Vec<Finding>,
    pub totals: Totals,
}

impl ConditionsReport {
    pub fn new(schema_key: impl Into<String>) -> Self {
        ConditionsReport {
            schema_key: schema_key.into(),
            c1_references: None,
            c2_options: None,
            c3_cycles: None,
            analyses_run: Vec::new(),
            findings: Vec::new(),
            totals: Totals::default(),
        }
    }

    /// Extract findings from populated analysis results and refresh the
    /// finding, edge and cycle totals.
    pub fn extract_findings(&mut self) {
        self.findings.clear();

        if let Some(ref c1) = self.c1_references {
            for r in &c1.unresolved {
                self.findings.push(Finding {
                    analysis: "c1".to_string(),
                    kind: FindingKind::UnresolvedKey,
                    severity: FindingSeverity::Warning,
                    message: format!(
                        "Field '{}' depends on unknown key '{}'",
                        r.field, r.source_key
                    ),
                    field_key: Some(r.field.clone()),
                    details: Some(serde_json::json!({ "sourceKey": r.source_key })),
                });
            }
            self.totals.edges = c1.edges.len();
        }

        if let Some(ref c2) = self.c2_options {
            for m in &c2.option_mismatches {
                self.findings.push(Finding {
                    analysis: "c2".to_string(),
                    kind: FindingKind::OptionMismatch,
                    severity: FindingSeverity::Warning,
                    message: format!(
                        "Field '{}' compares '{}' against '{}', which is not one of its options",
                        m.field, m.source_key, m.value
                    ),
                    field_key: Some(m.field.clone()),
                    details: Some(serde_json::json!({
                        "sourceKey": m.source_key,
                        "value": m.value,
                        "expected": m.expected,
                    })),
                });
            }
            for s in &c2.suspicious_numeric {
                self.findings.push(Finding {
                    analysis: "c2".to_string(),
                    kind: FindingKind::SuspiciousNumericValue,
                    severity: FindingSeverity::Info,
                    message: format!(
                        "Field '{}' compares non-numeric '{}' against numeric value '{}'",
                        s.field, s.source_key, s.value
                    ),
                    field_key: Some(s.field.clone()),
                    details: Some(serde_json::json!({
                        "sourceKey": s.source_key,
                        "value": s.value,
                    })),
                });
            }
        }

        if let Some(ref c3) = self.c3_cycles {
            for cycle in &c3.cycles {
                self.findings.push(Finding {
                    analysis: "c3".to_string(),
                    kind: FindingKind::Cycle,
                    severity: FindingSeverity::Warning,
                    message: format!("Visibility cycle: {}", cycle.join(" -> ")),
                    field_key: cycle.first().cloned(),
                    details: Some(serde_json::json!({ "path": cycle })),
                });
            }
            self.totals.cycles = c3.cycles.len();
        }

        self.totals.findings = self.findings.len();
    }

    /// Cycles or unresolved keys make a schema unusable at runtime.
    pub fn has_blocking_findings(&self) -> bool {
        self.findings
            .iter()
            .any(|f| matches!(f.kind, FindingKind::UnresolvedKey | FindingKind::Cycle))
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }
}
