//! Formlift static analyzer -- C1-C3 conditions report with structured output.
//!
//! The analyzer consumes an assembled `FormSchema` (either in memory or as
//! the JSON document `formlift convert` writes), never the legacy rows.
//! Each analysis is a separate module producing a serializable result
//! struct. `analyze()` runs all of them and aggregates the results into a
//! `ConditionsReport`.

pub mod c1_references;
pub mod c2_options;
pub mod c3_cycles;
pub mod report;

pub use c1_references::{C1Result, UnresolvedReference};
pub use c2_options::{C2Result, OptionMismatch, SuspiciousNumeric};
pub use c3_cycles::C3Result;
pub use report::{ConditionsReport, Finding, FindingKind, FindingSeverity, Totals};

use formlift_core::FormSchema;

/// Errors reading an analysis input.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid schema document: {0}")]
    InvalidSchema(#[from] serde_json::Error),
}

/// Run the full C1-C3 analysis suite on an assembled schema.
pub fn analyze(schema: &FormSchema) -> ConditionsReport {
    let c1 = c1_references::analyze_references(schema);
    let c2 = c2_options::analyze_options(schema);
    let c3 = c3_cycles::analyze_cycles(&c1.edges);

    let mut report = ConditionsReport::new(schema.key.clone());
    report.totals.fields = schema.fields.len();
    report.totals.with_visibility = schema.fields.iter().filter(|f| f.is_conditional()).count();
    report.c1_references = Some(c1);
    report.c2_options = Some(c2);
    report.c3_cycles = Some(c3);
    report.analyses_run = vec!["c1".to_string(), "c2".to_string(), "c3".to_string()];

    report.extract_findings();

    tracing::info!(
        schema = %report.schema_key,
        findings = report.totals.findings,
        edges = report.totals.edges,
        cycles = report.totals.cycles,
        "conditions report complete"
    );
    report
}

/// Deserialize a schema document, then run [`analyze`].
pub fn analyze_json(document: &serde_json::Value) -> Result<ConditionsReport, AnalysisError> {
    let schema: FormSchema = serde_json::from_value(document.clone())?;
    Ok(analyze(&schema))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_report_on_small_schema() {
        let schema = tests_support::schema_of(&[
            ("A", "B == 'x'"),
            ("B", "A == 'y'"),
            ("C", "Missing == 'z'"),
            ("D", ""),
        ]);
        let report = analyze(&schema);
        assert_eq!(report.analyses_run, vec!["c1", "c2", "c3"]);
        assert_eq!(report.totals.fields, 4);
        assert_eq!(report.totals.with_visibility, 3);
        assert_eq!(report.totals.edges, 2);
        assert_eq!(report.totals.cycles, 1);
        assert_eq!(report.count(FindingKind::UnresolvedKey), 1);
        assert_eq!(report.count(FindingKind::Cycle), 1);
        assert!(report.has_blocking_findings());
    }

    #[test]
    fn json_documents_are_accepted() {
        let doc = json!({
            "key": "form",
            "name": "Form",
            "version": "1",
            "fields": [
                {"key": "A", "label": "A", "style": "field", "type": "string"},
                {"key": "B", "label": "B", "style": "field", "type": "string",
                 "visibility": [{"allConditionsMustMatch": true,
                                 "conditions": [{"sourceKey": "A", "operator": "eq", "value": "x"}]}]}
            ]
        });
        let report = analyze_json(&doc).unwrap();
        assert_eq!(report.totals.edges, 1);
        assert!(!report.has_blocking_findings());
    }

    #[test]
    fn malformed_documents_are_errors() {
        let err = analyze_json(&json!({"key": "form"})).unwrap_err();
        assert!(err.to_string().starts_with("invalid schema document"));
    }
}
